//! Track admission by geographic proximity, and per-track gradient colors.

use crate::foundation::core::{GeoPoint, Rgb8};
use crate::geo::distance_km;

/// Admit tracks that pass within `radius_km` of `center`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AreaFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl AreaFilter {
    /// True iff at least one point lies within the radius. Empty tracks are never relevant.
    pub fn is_relevant(&self, points: &[GeoPoint]) -> bool {
        points
            .iter()
            .any(|p| distance_km(*p, self.center) <= self.radius_km)
    }
}

const HUE_START_DEG: f64 = 230.0;
const HUE_MID_DEG: f64 = 270.0;
const HUE_END_DEG: f64 = 120.0;
const SATURATION: f64 = 0.65;
const VALUE: f64 = 0.5;

/// Line color for the track at `index` out of `total` in processing order.
///
/// Hue sweeps 230° → 270° over the first half of the order and 270° → 120° over the second
/// half, at fixed saturation and value.
pub fn color_for(index: usize, total: usize) -> Rgb8 {
    let t = index as f64 / total.saturating_sub(1).max(1) as f64;
    let hue_deg = if t < 0.5 {
        let k = t / 0.5;
        HUE_START_DEG + (HUE_MID_DEG - HUE_START_DEG) * k
    } else {
        let k = (t - 0.5) / 0.5;
        HUE_MID_DEG + (HUE_END_DEG - HUE_MID_DEG) * k
    };
    hsv_to_rgb(hue_deg / 360.0, SATURATION, VALUE)
}

/// HSV (all components in `[0, 1]`) to 8-bit RGB, truncating each channel.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb8 {
    let (r, g, b) = if s == 0.0 {
        (v, v, v)
    } else {
        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match (sector as i64).rem_euclid(6) {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        }
    };
    Rgb8::new(channel(r), channel(g), channel(b))
}

fn channel(x: f64) -> u8 {
    (x * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../tests/unit/filter/filter.rs"]
mod tests;
