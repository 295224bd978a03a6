use std::path::PathBuf;

use image::{RgbImage, imageops::FilterType};

use crate::cache::{Frame, FrameCache};
use crate::filter::color_for;
use crate::foundation::core::{FrameId, GeoPoint, MapView, Rgb8};
use crate::foundation::error::TrailreelResult;
use crate::geo::{decimate, distance_km, to_pixel};
use crate::render::canvas::{CumulativeCanvas, MarkerStyle, opaque_pixmap_to_rgb};
use crate::render::label::LabelRenderer;
use crate::report::{RunSummary, SkipReason};
use crate::track::loader::{Admission, Track, TrackLoader};

/// Result of one segment step: the persisted frame (or why it was dropped) and the new
/// running distance.
#[derive(Debug)]
pub struct SegmentOutcome {
    pub frame: Result<Frame, SkipReason>,
    pub distance_km: f64,
}

/// Owns the cumulative canvas for one run.
///
/// Created from a canvas-sized base map (the initialized state), fed tracks in processing
/// order, and dropped when the run is done. Lines drawn for one track stay for every later
/// frame.
pub struct FrameRenderer<'a> {
    view: MapView,
    canvas: CumulativeCanvas,
    labels: &'a LabelRenderer,
    cache: &'a FrameCache,
    marker: MarkerStyle,
    max_points: usize,
}

impl<'a> FrameRenderer<'a> {
    pub fn new(
        view: MapView,
        base: &RgbImage,
        labels: &'a LabelRenderer,
        cache: &'a FrameCache,
        max_points: usize,
    ) -> TrailreelResult<Self> {
        view.validate()?;
        Ok(Self {
            canvas: CumulativeCanvas::new(base, &view)?,
            view,
            labels,
            cache,
            marker: MarkerStyle::for_supersample(view.supersample),
            max_points,
        })
    }

    pub fn canvas(&self) -> &CumulativeCanvas {
        &self.canvas
    }

    /// Draw `from -> to` permanently, then emit and persist the frame for it.
    pub fn render_segment(
        &mut self,
        id: FrameId,
        from: GeoPoint,
        to: GeoPoint,
        color: Rgb8,
        distance_so_far: f64,
    ) -> TrailreelResult<SegmentOutcome> {
        let p0 = to_pixel(from, &self.view);
        let p1 = to_pixel(to, &self.view);
        self.canvas.draw_segment(p0, p1, color);
        let distance = distance_so_far + distance_km(from, to);

        let hi = self.canvas.snapshot_with_marker(p1, &self.marker);
        let mut image = self.downsample(opaque_pixmap_to_rgb(&hi));
        self.labels.draw_distance(&mut image, distance)?;

        let frame = match self.cache.store(id, &image) {
            Ok(path) => Ok(Frame {
                id: Some(id),
                path,
                image,
            }),
            Err(detail) => Err(SkipReason::CorruptFrame { frame: id, detail }),
        };
        Ok(SegmentOutcome {
            frame,
            distance_km: distance,
        })
    }

    /// Render every segment of the decimated track. Returns the kept frames and the new
    /// running distance. Dropped frames are recorded in `summary`.
    #[tracing::instrument(skip_all, fields(track = track.index, source = %track.source.display()))]
    pub fn render_track(
        &mut self,
        track: &Track,
        color: Rgb8,
        distance_so_far: f64,
        summary: &mut RunSummary,
    ) -> TrailreelResult<(Vec<Frame>, f64)> {
        if !track.is_renderable() {
            return Ok((Vec::new(), distance_so_far));
        }

        let points = decimate(&track.points, self.max_points);
        let mut frames = Vec::with_capacity(points.len().saturating_sub(1));
        let mut distance = distance_so_far;
        for (j, pair) in points.windows(2).enumerate() {
            let id = FrameId {
                track: track.index,
                segment: j + 1,
            };
            let outcome = self.render_segment(id, pair[0], pair[1], color, distance)?;
            distance = outcome.distance_km;
            match outcome.frame {
                Ok(frame) => frames.push(frame),
                Err(reason) => summary.skip(self.cache.frame_path(id), reason),
            }
        }

        tracing::debug!(
            segments = points.len().saturating_sub(1),
            kept = frames.len(),
            distance_km = distance,
            "track rendered"
        );
        Ok((frames, distance))
    }

    fn downsample(&self, hi: RgbImage) -> RgbImage {
        if self.view.supersample == 1 {
            return hi;
        }
        image::imageops::resize(&hi, self.view.width, self.view.height, FilterType::Lanczos3)
    }
}

/// Frames generated for a run, in sequence order.
#[derive(Debug, Default)]
pub struct FrameGeneration {
    pub frames: Vec<Frame>,
    pub summary: RunSummary,
}

/// Admit and render `files` in the given order.
///
/// A file's index in `files` names its frames and picks its color, whether or not the file
/// is admitted.
#[tracing::instrument(skip_all, fields(files = files.len()))]
pub fn generate_frames(
    files: &[PathBuf],
    loader: &TrackLoader,
    renderer: &mut FrameRenderer<'_>,
) -> TrailreelResult<FrameGeneration> {
    let total = files.len();
    let mut out = FrameGeneration::default();
    let mut distance = 0.0;

    for (index, path) in files.iter().enumerate() {
        out.summary.tracks_seen += 1;
        let track = match loader.admit(index, path) {
            Admission::Admitted(track) => track,
            Admission::Skipped(reason) => {
                out.summary.skip(path, reason);
                continue;
            }
        };

        tracing::info!(index, total, file = %path.display(), points = track.points.len(), "rendering track");
        let (frames, next) =
            renderer.render_track(&track, color_for(index, total), distance, &mut out.summary)?;
        distance = next;
        out.summary.tracks_rendered += 1;
        out.summary.frames_written += frames.len();
        out.frames.extend(frames);
    }

    out.summary.distance_km = distance;
    tracing::info!(
        frames = out.summary.frames_written,
        skipped = out.summary.skipped.len(),
        distance_km = distance,
        "frame generation finished"
    );
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/frames.rs"]
mod tests;
