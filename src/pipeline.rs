//! End-to-end orchestration: tracks on disk to a finished MP4.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone as _, Utc};

use crate::cache::{Frame, FrameCache};
use crate::compose::{
    Clip, ClipSettings, FinalEncodePlan, build_clip, effective_speed, encode_final,
    prepare_audio, reuse_clip,
};
use crate::filter::AreaFilter;
use crate::foundation::core::{GeoPoint, MapView};
use crate::foundation::error::{TrailreelError, TrailreelResult};
use crate::render::frames::{FrameGeneration, FrameRenderer, generate_frames};
use crate::render::label::LabelRenderer;
use crate::render::map::{BaseMapSource, ImageFileMap, SolidMap, prepare_base_map};
use crate::report::RunSummary;
use crate::track::discover::CanonicalTrackSet;
use crate::track::loader::{ProcessingOrder, TrackLoader};

/// Flat pipeline configuration. Every field has a default, so a JSON file only needs the
/// fields it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Folder holding `*.gpx`, `*.fit` and `*.fit.gz` files.
    pub folder: PathBuf,
    pub frames_folder: PathBuf,
    pub skip_frames: bool,
    /// Keep real-time playback (no speed factor).
    pub skip_effects: bool,
    pub skip_audio: bool,
    /// Stop before the final encode.
    pub skip_write: bool,
    /// Do not scan `folder`; frames then come from the cache.
    pub skip_loading: bool,
    /// Reuse the intermediate video instead of encoding it again.
    pub skip_clip: bool,
    /// Clear `frames_folder` before generating frames.
    #[serde(alias = "errase_frame_folder")]
    pub erase_frame_folder: bool,
    pub speed_factor: f64,
    /// Decimation cap: at most this many points (so one fewer frames) per track.
    pub max_frames_per_course: usize,
    pub music_path: Option<PathBuf>,
    pub output_file: PathBuf,

    pub center: GeoPoint,
    /// Tracks with no point this close to `center` are ignored.
    pub max_distance_km: f64,
    pub width: u32,
    pub height: u32,
    pub zoom: u8,
    pub supersample: u32,
    pub fps: u32,
    /// Seconds the last frame is held at the end of the clip.
    pub hold_secs: f64,
    /// Tracks that started before this instant are ignored.
    pub start_date_limit: DateTime<Utc>,
    pub intermediate_video: PathBuf,
    /// Pre-rendered map image. A flat background is used when unset.
    pub base_map: Option<PathBuf>,
    pub copyright: Option<String>,
    pub processing_order: ProcessingOrder,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` fonts.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("GPS_DATA"),
            frames_folder: PathBuf::from("frames_mercator14"),
            skip_frames: false,
            skip_effects: false,
            skip_audio: false,
            skip_write: false,
            skip_loading: false,
            skip_clip: false,
            erase_frame_folder: false,
            speed_factor: 7.0,
            max_frames_per_course: 120,
            music_path: Some(PathBuf::from("audiomachine.mp3")),
            output_file: PathBuf::from("video_final.mp4"),
            center: GeoPoint {
                lat: 48.8504,
                lon: 2.2181,
            },
            max_distance_km: 100.0,
            width: 800,
            height: 534,
            zoom: 13,
            supersample: 2,
            fps: 24,
            hold_secs: 2.0,
            start_date_limit: Utc
                .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            intermediate_video: PathBuf::from("concat_clip.mp4"),
            base_map: None,
            copyright: Some("©RunnerSuresnois".to_string()),
            processing_order: ProcessingOrder::BaseName,
            font_dirs: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> TrailreelResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        Ok(cfg)
    }

    pub fn view(&self) -> MapView {
        MapView {
            center: self.center,
            width: self.width,
            height: self.height,
            zoom: self.zoom,
            supersample: self.supersample,
        }
    }

    pub fn area(&self) -> AreaFilter {
        AreaFilter {
            center: self.center,
            radius_km: self.max_distance_km,
        }
    }

    pub fn loader(&self) -> TrackLoader {
        TrackLoader::new(self.start_date_limit, self.area())
    }

    pub fn clip_settings(&self) -> ClipSettings {
        ClipSettings {
            fps: self.fps,
            hold_secs: self.hold_secs,
        }
    }

    pub fn validate(&self) -> TrailreelResult<()> {
        self.view().validate()?;
        if GeoPoint::new(self.center.lat, self.center.lon).is_none() {
            return Err(TrailreelError::validation("center is out of range"));
        }
        if self.center.lat.abs() >= 85.06 {
            return Err(TrailreelError::validation(
                "center latitude is outside the Web-Mercator range",
            ));
        }
        if self.fps == 0 {
            return Err(TrailreelError::validation("fps must be non-zero"));
        }
        if !(self.speed_factor.is_finite() && self.speed_factor > 0.0) {
            return Err(TrailreelError::validation(
                "speed_factor must be a positive number",
            ));
        }
        if self.max_frames_per_course < 2 {
            return Err(TrailreelError::validation(
                "max_frames_per_course must be at least 2",
            ));
        }
        if !(self.hold_secs.is_finite() && self.hold_secs >= 0.0) {
            return Err(TrailreelError::validation("hold_secs must be >= 0"));
        }
        if !(self.max_distance_km.is_finite() && self.max_distance_km >= 0.0) {
            return Err(TrailreelError::validation("max_distance_km must be >= 0"));
        }
        Ok(())
    }

    /// Scratch path for the prepared audio, next to the intermediate video.
    fn audio_work_path(&self) -> PathBuf {
        let stem = self
            .intermediate_video
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());
        self.intermediate_video
            .with_file_name(format!("{stem}_audio.wav"))
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The configured output file, whether or not it was written.
    pub path: PathBuf,
    /// True when the final encode ran and succeeded.
    pub written: bool,
    /// Frames that made up the clip, generated or loaded from the cache.
    pub frames: Vec<Frame>,
    /// True when the frames came from the cache rather than this run's renderer.
    pub from_cache: bool,
    pub clip: Option<Clip>,
    pub audio_attached: bool,
    pub summary: RunSummary,
}

/// Run every stage that `config` does not skip.
#[tracing::instrument(skip_all, fields(folder = %config.folder.display()))]
pub fn run_pipeline(config: &PipelineConfig) -> TrailreelResult<PipelineOutput> {
    config.validate()?;
    let cache = FrameCache::new(&config.frames_folder);

    let mut generation = FrameGeneration::default();
    if !config.skip_frames {
        generation = generate_stage(config, &cache)?;
    }

    let from_cache = config.skip_frames || generation.frames.is_empty();
    let frames = if from_cache {
        tracing::info!(dir = %cache.dir().display(), "loading frames from cache");
        cache.load_all()?
    } else {
        generation.frames
    };

    let mut out = PipelineOutput {
        path: config.output_file.clone(),
        written: false,
        frames,
        from_cache,
        clip: None,
        audio_attached: false,
        summary: generation.summary,
    };

    let clip = if config.skip_clip {
        let reused = reuse_clip(&config.intermediate_video);
        if reused.is_none() {
            tracing::warn!(
                path = %config.intermediate_video.display(),
                "clip stage skipped and no intermediate video found; nothing to encode"
            );
        }
        reused
    } else {
        Some(build_clip(
            &out.frames,
            &config.clip_settings(),
            &config.intermediate_video,
        )?)
    };
    let Some(clip) = clip else {
        return Ok(out);
    };

    let speed = effective_speed(config.speed_factor, config.skip_effects);
    let audio = if config.skip_audio {
        None
    } else {
        audio_stage(config, &clip, speed)
    };
    out.audio_attached = audio.is_some();
    out.clip = Some(clip.clone());

    if config.skip_write {
        tracing::info!("final write skipped");
    } else {
        encode_final(&FinalEncodePlan {
            video: clip.source,
            audio: audio.clone(),
            speed_factor: speed,
            fps: config.fps,
            output: config.output_file.clone(),
        })?;
        out.written = true;
    }

    if let Some(path) = audio
        && let Err(e) = std::fs::remove_file(&path)
    {
        tracing::debug!(path = %path.display(), error = %e, "could not remove prepared audio");
    }
    Ok(out)
}

/// Cached frames are only erased once there is something to render in their place.
fn generate_stage(config: &PipelineConfig, cache: &FrameCache) -> TrailreelResult<FrameGeneration> {
    let files = if config.skip_loading {
        tracing::info!("file loading skipped");
        Vec::new()
    } else {
        let set = CanonicalTrackSet::scan(&config.folder)?;
        tracing::info!(count = set.len(), "canonical tracks found");
        TrackLoader::order(set.files(), config.processing_order)
    };
    if files.is_empty() {
        return Ok(FrameGeneration::default());
    }

    if config.erase_frame_folder {
        cache.clear()?;
    }
    cache.ensure_dir()?;

    let view = config.view();
    let labels = LabelRenderer::new(&config.font_dirs);
    let source: Box<dyn BaseMapSource> = match &config.base_map {
        Some(path) => Box::new(ImageFileMap { path: path.clone() }),
        None => Box::new(SolidMap::default()),
    };
    let base = prepare_base_map(source.as_ref(), &view, config.copyright.as_deref(), &labels)?;

    let mut renderer =
        FrameRenderer::new(view, &base, &labels, cache, config.max_frames_per_course)?;
    generate_frames(&files, &config.loader(), &mut renderer)
}

/// Prepared audio path, or `None` when there is no usable music. Failures are logged, never
/// returned.
fn audio_stage(config: &PipelineConfig, clip: &Clip, speed: f64) -> Option<PathBuf> {
    let music = config.music_path.as_ref()?;
    if !music.is_file() {
        tracing::info!(path = %music.display(), "music file not found; no audio");
        return None;
    }

    let prepared = clip
        .duration()
        .map(|d| d / speed)
        .and_then(|secs| prepare_audio(music, secs, &config.audio_work_path()));
    match prepared {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(error = %e, "could not add audio; continuing without");
            None
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline/pipeline.rs"]
mod tests;
