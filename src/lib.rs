//! Trailreel turns a folder of recorded GPS activities into an animated map video.
//!
//! Each admitted track is drawn segment by segment onto one persistent, supersampled canvas.
//! Every segment yields a frame (marker plus running distance) that is persisted to a cache
//! folder, so a later run can resume from disk. Frames are then streamed into the system
//! `ffmpeg`, held on the last frame, sped up and mixed with background music.
//!
//! - Configure a [`PipelineConfig`]
//! - Call [`run_pipeline`]
//! - Inspect the returned [`PipelineOutput`] and its [`RunSummary`]
#![forbid(unsafe_code)]

mod foundation;

pub mod cache;
pub mod compose;
pub mod encode;
pub mod filter;
pub mod geo;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod track;

pub use crate::foundation::core::{FrameId, GeoPoint, MapView, PixelPos, Rgb8, Rgba8};
pub use crate::foundation::error::{TrailreelError, TrailreelResult};

pub use crate::cache::{Frame, FrameCache};
pub use crate::compose::{Clip, ClipSettings, FinalEncodePlan};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path, is_ffprobe_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::filter::{AreaFilter, color_for};
pub use crate::pipeline::{PipelineConfig, PipelineOutput, run_pipeline};
pub use crate::render::map::{BaseMapSource, ImageFileMap, SolidMap};
pub use crate::report::{RunSummary, SkipReason, SkippedItem};
pub use crate::track::discover::CanonicalTrackSet;
pub use crate::track::loader::{Admission, ProcessingOrder, Track, TrackLoader};
