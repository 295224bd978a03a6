use image::RgbImage;
use resvg::tiny_skia::{self, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::foundation::core::{MapView, PixelPos, Rgb8, Rgba8};
use crate::foundation::error::{TrailreelError, TrailreelResult};

/// Track line width in canvas pixels.
pub const LINE_WIDTH: f32 = 3.0;

/// Semi-transparent disc with a thin dark ring, drawn at the current position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    /// Disc radius in canvas pixels.
    pub radius: f32,
    pub fill: Rgba8,
    pub outline: Rgba8,
    /// Ring width in canvas pixels.
    pub outline_width: f32,
}

impl MarkerStyle {
    /// Orange disc of radius `7 * supersample` with a one output-pixel black ring.
    pub fn for_supersample(supersample: u32) -> Self {
        let ss = supersample as f32;
        Self {
            radius: 7.0 * ss,
            fill: Rgba8::new(255, 140, 0, 140),
            outline: Rgba8::new(0, 0, 0, 255),
            outline_width: ss,
        }
    }
}

/// The single persistent raster that accumulates every drawn segment of a run.
///
/// Sized `view.width * supersample` by `view.height * supersample` and always opaque, so the
/// premultiplied pixmap bytes equal straight RGBA.
pub struct CumulativeCanvas {
    pixmap: Pixmap,
}

impl CumulativeCanvas {
    /// Seed the canvas with an opaque base image of exactly canvas size.
    pub fn new(base: &RgbImage, view: &MapView) -> TrailreelResult<Self> {
        let (w, h) = (view.canvas_width(), view.canvas_height());
        if base.dimensions() != (w, h) {
            return Err(TrailreelError::validation(format!(
                "base map is {}x{}, canvas needs {w}x{h}",
                base.width(),
                base.height()
            )));
        }

        let mut pixmap = Pixmap::new(w, h)
            .ok_or_else(|| TrailreelError::render("failed to allocate canvas pixmap"))?;
        for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(base.pixels()) {
            dst[..3].copy_from_slice(&src.0);
            dst[3] = 255;
        }
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Permanently draw one segment. Degenerate segments draw nothing.
    pub fn draw_segment(&mut self, from: PixelPos, to: PixelPos, color: Rgb8) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: LINE_WIDTH,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Copy of the canvas with the marker composited at `at`. The canvas itself is untouched.
    pub fn snapshot_with_marker(&self, at: PixelPos, marker: &MarkerStyle) -> Pixmap {
        let mut frame = self.pixmap.clone();
        let (cx, cy) = (at.x as f32, at.y as f32);

        if let Some(disc) = PathBuilder::from_circle(cx, cy, marker.radius) {
            let paint = solid_paint(marker.fill);
            frame.fill_path(&disc, &paint, FillRule::Winding, Transform::identity(), None);
        }

        // The ring sits just outside the disc, its outer edge at radius + 1.
        let ring_radius = marker.radius + 1.0 - marker.outline_width / 2.0;
        if marker.outline_width > 0.0
            && let Some(ring) = PathBuilder::from_circle(cx, cy, ring_radius.max(0.5))
        {
            let paint = solid_paint(marker.outline);
            let stroke = Stroke {
                width: marker.outline_width,
                ..Stroke::default()
            };
            frame.stroke_path(&ring, &paint, &stroke, Transform::identity(), None);
        }
        frame
    }
}

fn solid_paint(c: Rgba8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

/// Drop the alpha channel of an opaque pixmap.
pub fn opaque_pixmap_to_rgb(pixmap: &tiny_skia::Pixmap) -> RgbImage {
    let mut out = RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        dst.0.copy_from_slice(&src[..3]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
