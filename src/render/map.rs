use std::path::PathBuf;

use image::{RgbImage, imageops::FilterType};

use crate::foundation::core::{MapView, Rgb8};
use crate::foundation::error::{TrailreelError, TrailreelResult};
use crate::render::label::LabelRenderer;

/// Produces the background map for a view.
///
/// Implementations may return any size; [`prepare_base_map`] resamples to canvas size.
pub trait BaseMapSource {
    fn base_image(&self, view: &MapView) -> TrailreelResult<RgbImage>;

    fn describe(&self) -> String;
}

/// A pre-rendered map image on disk, e.g. exported tiles for the configured center and zoom.
#[derive(Clone, Debug)]
pub struct ImageFileMap {
    pub path: PathBuf,
}

impl BaseMapSource for ImageFileMap {
    fn base_image(&self, _view: &MapView) -> TrailreelResult<RgbImage> {
        let img = image::open(&self.path).map_err(|e| {
            TrailreelError::render(format!("base map '{}': {e}", self.path.display()))
        })?;
        Ok(img.to_rgb8())
    }

    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }
}

/// Flat background, used when no map image is configured.
#[derive(Clone, Copy, Debug)]
pub struct SolidMap {
    pub color: Rgb8,
}

impl Default for SolidMap {
    fn default() -> Self {
        Self {
            color: Rgb8::new(236, 232, 224),
        }
    }
}

impl BaseMapSource for SolidMap {
    fn base_image(&self, view: &MapView) -> TrailreelResult<RgbImage> {
        let c = self.color;
        Ok(RgbImage::from_pixel(
            view.width,
            view.height,
            image::Rgb([c.r, c.g, c.b]),
        ))
    }

    fn describe(&self) -> String {
        format!("solid {}", self.color.css())
    }
}

/// Canvas-sized base image with the copyright notice burned in.
#[tracing::instrument(skip_all, fields(source = %source.describe()))]
pub fn prepare_base_map(
    source: &dyn BaseMapSource,
    view: &MapView,
    copyright: Option<&str>,
    labels: &LabelRenderer,
) -> TrailreelResult<RgbImage> {
    let base = source.base_image(view)?;
    if base.width() == 0 || base.height() == 0 {
        return Err(TrailreelError::render("base map is empty"));
    }

    let (w, h) = (view.canvas_width(), view.canvas_height());
    let mut base = if base.dimensions() == (w, h) {
        base
    } else {
        tracing::debug!(
            from_w = base.width(),
            from_h = base.height(),
            to_w = w,
            to_h = h,
            "resampling base map"
        );
        image::imageops::resize(&base, w, h, FilterType::Lanczos3)
    };

    if let Some(text) = copyright.filter(|t| !t.is_empty()) {
        labels.draw_copyright(&mut base, text, view.supersample)?;
    }
    Ok(base)
}

#[cfg(test)]
#[path = "../../tests/unit/render/map.rs"]
mod tests;
