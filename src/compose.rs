//! Video assembly: frame sequence plus held last frame, time-scale, background music, final
//! MP4 encode.

use std::path::{Path, PathBuf};

use image::{RgbImage, imageops::FilterType};

use crate::cache::Frame;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, run_tool};
use crate::encode::probe::{MediaInfo, probe_media};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{TrailreelError, TrailreelResult};

pub const AUDIO_FADE_IN_SECS: f64 = 1.0;
pub const AUDIO_FADE_OUT_SECS: f64 = 2.0;

/// Frame rate and still-hold length of the intermediate clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipSettings {
    pub fps: u32,
    /// How long the last frame stays on screen.
    pub hold_secs: f64,
}

impl ClipSettings {
    pub fn hold_frames(&self) -> u64 {
        (f64::from(self.fps) * self.hold_secs.max(0.0)).round() as u64
    }
}

/// An encoded intermediate video.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    pub source: PathBuf,
    /// Known when the clip was written by this run; probed lazily otherwise.
    pub duration_secs: Option<f64>,
}

impl Clip {
    pub fn duration(&self) -> TrailreelResult<f64> {
        match self.duration_secs {
            Some(d) => Ok(d),
            None => video_duration(&self.source, &probe_media(&self.source)?),
        }
    }
}

/// Duration of a probed clip; a file without a video stream is not a clip.
fn video_duration(path: &Path, info: &MediaInfo) -> TrailreelResult<f64> {
    if !info.has_video {
        return Err(TrailreelError::encode(format!(
            "'{}' has no video stream",
            path.display()
        )));
    }
    Ok(info.duration_secs)
}

/// Push `frames` followed by the last frame repeated for the hold. Frames whose size differs
/// from the first one are resampled to it. Returns the number of frames pushed.
pub fn write_clip(
    frames: &[Frame],
    settings: &ClipSettings,
    sink: &mut dyn FrameSink,
) -> TrailreelResult<u64> {
    let (first, last) = match (frames.first(), frames.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(TrailreelError::validation("clip needs at least one frame")),
    };
    let (width, height) = first.image.dimensions();
    sink.begin(SinkConfig {
        width,
        height,
        fps: settings.fps,
    })?;

    let fit = |img: &RgbImage| -> Option<RgbImage> {
        (img.dimensions() != (width, height))
            .then(|| image::imageops::resize(img, width, height, FilterType::Lanczos3))
    };

    let mut idx = 0u64;
    for frame in frames {
        match fit(&frame.image) {
            Some(resized) => {
                tracing::debug!(path = %frame.path.display(), "resampling mismatched frame");
                sink.push_frame(idx, &resized)?;
            }
            None => sink.push_frame(idx, &frame.image)?,
        }
        idx += 1;
    }

    let held = fit(&last.image);
    let held = held.as_ref().unwrap_or(&last.image);
    for _ in 0..settings.hold_frames() {
        sink.push_frame(idx, held)?;
        idx += 1;
    }

    sink.end()?;
    Ok(idx)
}

/// Encode the intermediate clip to `path` through the system `ffmpeg`.
#[tracing::instrument(skip(frames), fields(frames = frames.len(), path = %path.display()))]
pub fn build_clip(frames: &[Frame], settings: &ClipSettings, path: &Path) -> TrailreelResult<Clip> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(path));
    let pushed = write_clip(frames, settings, &mut sink)?;
    let duration = pushed as f64 / f64::from(settings.fps);
    tracing::info!(pushed, duration_secs = duration, "intermediate clip written");
    Ok(Clip {
        source: path.to_path_buf(),
        duration_secs: Some(duration),
    })
}

/// The intermediate clip from an earlier run, if it is still there.
pub fn reuse_clip(path: &Path) -> Option<Clip> {
    path.is_file().then(|| Clip {
        source: path.to_path_buf(),
        duration_secs: None,
    })
}

/// Speed multiplier actually applied. Skipping effects means real time.
pub fn effective_speed(speed_factor: f64, skip_effects: bool) -> f64 {
    if skip_effects { 1.0 } else { speed_factor }
}

/// `afade` chain for a track trimmed to `trim_secs`.
pub fn audio_filter(trim_secs: f64) -> String {
    let out_start = (trim_secs - AUDIO_FADE_OUT_SECS).max(0.0);
    format!(
        "afade=t=in:st=0:d={AUDIO_FADE_IN_SECS},afade=t=out:st={out_start:.3}:d={AUDIO_FADE_OUT_SECS}"
    )
}

/// Arguments that trim `music` to `trim_secs`, fade it and write PCM WAV to `out`.
pub fn build_audio_args(music: &Path, trim_secs: f64, out: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        music.to_string_lossy().to_string(),
        "-t".to_string(),
        format!("{trim_secs:.3}"),
        "-af".to_string(),
        audio_filter(trim_secs),
        "-vn".to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        out.to_string_lossy().to_string(),
    ]
}

/// Trim and fade `music` to at most `clip_secs`, writing the result to `out`.
pub fn prepare_audio(music: &Path, clip_secs: f64, out: &Path) -> TrailreelResult<PathBuf> {
    let info = probe_media(music)?;
    let trim = audio_trim_secs(music, &info, clip_secs)?;
    tracing::debug!(music_secs = info.duration_secs, clip_secs, trim, "preparing audio");
    run_tool("ffmpeg", &build_audio_args(music, trim, out))?;
    Ok(out.to_path_buf())
}

/// Length the music is cut to: the shorter of the music and the clip.
fn audio_trim_secs(music: &Path, info: &MediaInfo, clip_secs: f64) -> TrailreelResult<f64> {
    if !info.has_audio {
        return Err(TrailreelError::encode(format!(
            "music '{}' has no audio stream",
            music.display()
        )));
    }
    let trim = info.duration_secs.min(clip_secs);
    if trim <= 0.0 {
        return Err(TrailreelError::encode(format!(
            "music '{}' has no usable duration",
            music.display()
        )));
    }
    Ok(trim)
}

/// Everything the final encode needs.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalEncodePlan {
    pub video: PathBuf,
    /// Prepared (trimmed, faded) audio; looped to cover the whole video.
    pub audio: Option<PathBuf>,
    pub speed_factor: f64,
    pub fps: u32,
    pub output: PathBuf,
}

/// Build ffmpeg args from a final encode plan.
pub fn build_final_args(plan: &FinalEncodePlan) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        plan.video.to_string_lossy().to_string(),
    ];
    if let Some(audio) = &plan.audio {
        args.extend(["-stream_loop".to_string(), "-1".to_string()]);
        args.extend(["-i".to_string(), audio.to_string_lossy().to_string()]);
    }

    if plan.speed_factor != 1.0 {
        args.push("-filter:v".to_string());
        args.push(format!("setpts=PTS/{}", plan.speed_factor));
    }

    args.extend(["-map".to_string(), "0:v:0".to_string()]);
    if plan.audio.is_some() {
        args.extend(["-map".to_string(), "1:a:0".to_string()]);
    }

    args.extend(
        [
            "-r",
            &plan.fps.to_string(),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-profile:v",
            "main",
            "-level",
            "4.0",
            "-b:v",
            "5000k",
        ]
        .map(String::from),
    );
    if plan.audio.is_some() {
        args.extend(["-c:a", "aac", "-b:a", "192k", "-shortest"].map(String::from));
    } else {
        args.push("-an".to_string());
    }
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args.push(plan.output.to_string_lossy().to_string());
    args
}

#[tracing::instrument(skip_all, fields(output = %plan.output.display(), speed = plan.speed_factor, audio = plan.audio.is_some()))]
pub fn encode_final(plan: &FinalEncodePlan) -> TrailreelResult<()> {
    if !(plan.speed_factor.is_finite() && plan.speed_factor > 0.0) {
        return Err(TrailreelError::validation(
            "speed factor must be a positive number",
        ));
    }
    ensure_parent_dir(&plan.output)?;
    run_tool("ffmpeg", &build_final_args(plan))?;
    tracing::info!("final video written");
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/compose/compose.rs"]
mod tests;
