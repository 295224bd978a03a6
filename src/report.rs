//! Per-item outcomes collected over a run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::foundation::core::FrameId;

/// Why a file or a frame contributed nothing to the video.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("unreadable: {0}")]
    Unreadable(String),

    #[error("no start time")]
    MissingStartTime,

    #[error("started {0}, before the cutoff")]
    BeforeCutoff(DateTime<Utc>),

    #[error("only {0} point(s)")]
    TooFewPoints(usize),

    #[error("no point inside the map area")]
    OutOfArea,

    #[error("frame {frame} could not be persisted: {detail}")]
    CorruptFrame { frame: FrameId, detail: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedItem {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// What the frame-generation stage did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub tracks_seen: usize,
    pub tracks_rendered: usize,
    pub frames_written: usize,
    /// Running distance after the last rendered segment, in kilometers.
    pub distance_km: f64,
    pub skipped: Vec<SkippedItem>,
}

impl RunSummary {
    pub fn skip(&mut self, path: impl Into<PathBuf>, reason: SkipReason) {
        let path = path.into();
        tracing::warn!(file = %path.display(), %reason, "skipped");
        self.skipped.push(SkippedItem { path, reason });
    }

    /// Count of skipped items matching `pred`.
    pub fn count_skipped(&self, pred: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|s| pred(&s.reason)).count()
    }
}

#[cfg(test)]
#[path = "../tests/unit/report/report.rs"]
mod tests;
