use std::path::Path;

use crate::encode::ffmpeg::run_tool;
use crate::foundation::error::{TrailreelError, TrailreelResult};

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

/// What `ffprobe` reports about a media file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

/// Probe a media file through `ffprobe`.
pub fn probe_media(path: &Path) -> TrailreelResult<MediaInfo> {
    let args = [
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_streams",
        "-show_format",
    ]
    .into_iter()
    .map(String::from)
    .chain(std::iter::once(path.display().to_string()))
    .collect::<Vec<_>>();
    let stdout = run_tool("ffprobe", &args)?;
    parse_probe_json(&stdout)
        .map_err(|e| TrailreelError::encode(format!("ffprobe '{}': {e}", path.display())))
}

/// Container duration, falling back to the longest stream duration.
pub(crate) fn parse_probe_json(bytes: &[u8]) -> Result<MediaInfo, String> {
    let parsed: ProbeOut =
        serde_json::from_slice(bytes).map_err(|e| format!("json parse failed: {e}"))?;

    let stream_duration = parsed
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref()?.parse::<f64>().ok())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref()?.parse::<f64>().ok())
        .or(stream_duration)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| "no duration reported".to_string())?;

    let has = |kind: &str| {
        parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };
    Ok(MediaInfo {
        duration_secs,
        has_video: has("video"),
        has_audio: has("audio"),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/probe.rs"]
mod tests;
