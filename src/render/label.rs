use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use resvg::tiny_skia::{Pixmap, Transform};

use crate::foundation::core::Rgb8;
use crate::foundation::error::{TrailreelError, TrailreelResult};

pub const DISTANCE_FONT_SIZE: f32 = 32.0;
pub const DISTANCE_COLOR: Rgb8 = Rgb8::new(255, 165, 0);
pub const COPYRIGHT_MARGIN: u32 = 10;

/// Horizontal alignment of a label relative to its anchor point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

impl Anchor {
    fn svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::End => "end",
        }
    }
}

/// One run of text placed on an overlay, in overlay pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    /// Baseline position, or bottom edge (descender) when `bottom_aligned` is set.
    pub y: f32,
    pub font_size: f32,
    pub fill: Rgb8,
    pub anchor: Anchor,
    pub bottom_aligned: bool,
}

/// Renders text overlays through usvg, with one font database shared by every frame.
pub struct LabelRenderer {
    options: usvg::Options<'static>,
}

impl LabelRenderer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` files directly inside `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "label font database ready");

        Self {
            options: usvg::Options {
                fontdb: Arc::new(db),
                font_resolver: font_resolver(),
                ..Default::default()
            },
        }
    }

    pub fn face_count(&self) -> usize {
        self.options.fontdb.len()
    }

    /// Transparent premultiplied overlay of `width x height` carrying `items`.
    pub fn overlay(&self, width: u32, height: u32, items: &[TextItem]) -> TrailreelResult<Pixmap> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| TrailreelError::render("label overlay must be non-empty"))?;
        if items.is_empty() {
            return Ok(pixmap);
        }

        let svg = overlay_svg(width, height, items);
        let tree = usvg::Tree::from_str(&svg, &self.options)
            .map_err(|e| TrailreelError::render(format!("label svg: {e}")))?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        Ok(pixmap)
    }

    /// Draw `items` onto an opaque image in place.
    pub fn draw(&self, image: &mut RgbImage, items: &[TextItem]) -> TrailreelResult<()> {
        let overlay = self.overlay(image.width(), image.height(), items)?;
        composite_over_rgb(image, &overlay);
        Ok(())
    }

    /// Bottom-right running distance: dark shadow first, orange text on top.
    pub fn draw_distance(&self, frame: &mut RgbImage, distance_km: f64) -> TrailreelResult<()> {
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let text = distance_text(distance_km);
        let label = |x: f32, y: f32, fill: Rgb8| TextItem {
            text: text.clone(),
            x,
            y,
            font_size: DISTANCE_FONT_SIZE,
            fill,
            anchor: Anchor::End,
            bottom_aligned: true,
        };
        self.draw(
            frame,
            &[
                label(w - 8.0, h - 8.0, Rgb8::BLACK),
                label(w - 10.0, h - 10.0, DISTANCE_COLOR),
            ],
        )
    }

    /// Bottom-left white notice. `scale` is the supersampling factor of `image`.
    pub fn draw_copyright(&self, image: &mut RgbImage, text: &str, scale: u32) -> TrailreelResult<()> {
        let scale = scale.max(1);
        let output_width = image.width() / scale;
        let font_size = (output_width / 40).max(16) * scale;
        let margin = (COPYRIGHT_MARGIN * scale) as f32;
        let h = image.height() as f32;
        self.draw(
            image,
            &[TextItem {
                text: text.to_string(),
                x: margin,
                y: h - margin,
                font_size: font_size as f32,
                fill: Rgb8::WHITE,
                anchor: Anchor::Start,
                bottom_aligned: true,
            }],
        )
    }
}

/// Whole kilometres, halves rounded to even.
pub fn distance_text(distance_km: f64) -> String {
    format!("{} km", distance_km.max(0.0).round_ties_even() as u64)
}

fn overlay_svg(width: u32, height: u32, items: &[TextItem]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    for item in items {
        let baseline = if item.bottom_aligned {
            r#" dominant-baseline="text-after-edge""#
        } else {
            ""
        };
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="DejaVu Sans, Arial, sans-serif" font-size="{}" fill="{}" text-anchor="{}"{baseline}>{}</text>"#,
            item.x,
            item.y,
            item.font_size,
            item.fill.css(),
            item.anchor.svg(),
            escape_xml(&item.text),
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Source-over of a premultiplied overlay onto an opaque RGB image of the same size.
pub fn composite_over_rgb(dst: &mut RgbImage, overlay: &Pixmap) {
    for (d, s) in dst.pixels_mut().zip(overlay.data().chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 0 {
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            d.0[i] = (u16::from(s[i]) + mul_div255(u16::from(d.0[i]), inv)).min(255) as u8;
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to load font");
        }
    }
}

/// Requested families first, then generic families, then any face at all.
fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(s) => Family::Name(s),
                });
            }
            families.push(Family::SansSerif);
            families.push(Family::Serif);

            let query = Query {
                families: &families,
                weight: Weight(font.weight()),
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/label.rs"]
mod tests;
