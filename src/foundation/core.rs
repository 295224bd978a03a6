use crate::foundation::error::{TrailreelError, TrailreelResult};

/// A WGS84 position in degrees.
///
/// Construction goes through [`GeoPoint::new`], which rejects values outside
/// `[-90, 90] x [-180, 180]`. NaN is not rejected here; it propagates through the math.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Return `None` when either coordinate is out of range.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat < -90.0 || lat > 90.0 || lon < -180.0 || lon > 180.0 {
            return None;
        }
        Some(Self { lat, lon })
    }
}

/// Integer pixel position on the supersampled canvas. May lie outside the canvas bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgb(...)` form, used when building SVG overlays.
    pub fn css(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// 8-bit RGBA color with straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Identity of one rendered frame: the track's position in the processing order and the
/// 1-based segment index inside that track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId {
    pub track: usize,
    pub segment: usize,
}

impl FrameId {
    /// `frame_<track%03d>_<segment%03d>.png`
    pub fn file_name(self) -> String {
        format!("frame_{:03}_{:03}.png", self.track, self.segment)
    }

    /// Inverse of [`FrameId::file_name`].
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_prefix("frame_")?.strip_suffix(".png")?;
        let (track, segment) = stem.split_once('_')?;
        Some(Self {
            track: track.parse().ok()?,
            segment: segment.parse().ok()?,
        })
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Geographic window rendered by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapView {
    pub center: GeoPoint,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Slippy-map zoom level.
    pub zoom: u8,
    /// Canvas pixels per output pixel along each axis.
    pub supersample: u32,
}

impl MapView {
    pub fn validate(&self) -> TrailreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TrailreelError::validation(
                "output width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(TrailreelError::validation(
                "output width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.supersample == 0 {
            return Err(TrailreelError::validation("supersample must be >= 1"));
        }
        if self.zoom > 22 {
            return Err(TrailreelError::validation("zoom must be <= 22"));
        }
        Ok(())
    }

    pub fn canvas_width(&self) -> u32 {
        self.width * self.supersample
    }

    pub fn canvas_height(&self) -> u32 {
        self.height * self.supersample
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
