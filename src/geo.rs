//! Geodesy helpers: haversine distance, Web-Mercator projection and canvas pixel mapping.

use std::borrow::Cow;
use std::f64::consts::PI;

use crate::foundation::core::{GeoPoint, MapView, PixelPos};

/// Equatorial radius used by the haversine distance, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6378.137;
/// Equatorial radius used by the Web-Mercator projection, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Great-circle distance between two points in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Web-Mercator coordinates in meters. Infinite at the poles.
pub fn project(p: GeoPoint) -> (f64, f64) {
    let x = EARTH_RADIUS_M * p.lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + p.lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Ground resolution of one output pixel at the given zoom, in Mercator meters.
pub fn meters_per_pixel(zoom: u8) -> f64 {
    2.0 * PI * EARTH_RADIUS_M / (256.0 * 2f64.powi(i32::from(zoom)))
}

/// Map a position into supersampled canvas pixels, north up, truncated toward zero.
pub fn to_pixel(p: GeoPoint, view: &MapView) -> PixelPos {
    let (xc, yc) = project(view.center);
    let (x, y) = project(p);
    let mpp = meters_per_pixel(view.zoom);
    let ss = f64::from(view.supersample);

    let px = (f64::from(view.width) / 2.0 + (x - xc) / mpp) * ss;
    let py = (f64::from(view.height) / 2.0 - (y - yc) / mpp) * ss;
    PixelPos {
        x: px as i32,
        y: py as i32,
    }
}

/// Keep at most `max_count` evenly spaced points, always including both endpoints.
///
/// Borrowed when the input is already short enough.
pub fn decimate<T: Clone>(points: &[T], max_count: usize) -> Cow<'_, [T]> {
    if points.len() <= max_count {
        return Cow::Borrowed(points);
    }
    match max_count {
        0 => Cow::Owned(Vec::new()),
        1 => Cow::Owned(vec![points[0].clone()]),
        k => {
            let last = points.len() - 1;
            Cow::Owned(
                (0..k)
                    .map(|i| points[i * last / (k - 1)].clone())
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/geo/geo.rs"]
mod tests;
