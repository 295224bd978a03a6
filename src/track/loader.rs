use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::filter::AreaFilter;
use crate::foundation::core::GeoPoint;
use crate::report::SkipReason;
use crate::track::decode::{DecodedTrack, decode};
use crate::track::discover::SourceFormat;

/// Order in which the canonical files are rendered. Colors and the running distance follow it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingOrder {
    /// Sorted file path, i.e. activity base name.
    #[default]
    BaseName,
    /// Recording start time; files without one go last.
    StartTime,
}

/// One decoded activity admitted for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Position in the processing order, counting skipped files too.
    pub index: usize,
    pub source: PathBuf,
    pub points: Vec<GeoPoint>,
    pub start_time: Option<DateTime<Utc>>,
}

impl Track {
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    Admitted(Track),
    Skipped(SkipReason),
}

/// Decides, file by file, whether a canonical track contributes frames.
#[derive(Clone, Copy, Debug)]
pub struct TrackLoader {
    /// Tracks starting before this instant are ignored.
    pub cutoff: DateTime<Utc>,
    pub area: AreaFilter,
}

impl TrackLoader {
    pub fn new(cutoff: DateTime<Utc>, area: AreaFilter) -> Self {
        Self { cutoff, area }
    }

    /// Read and decode one file. Any failure is a skip, never an error.
    pub fn read(path: &Path) -> Result<DecodedTrack, SkipReason> {
        let bytes = std::fs::read(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        decode(SourceFormat::of(path), &bytes).map_err(|e| SkipReason::Unreadable(e.to_string()))
    }

    pub fn admit(&self, index: usize, path: &Path) -> Admission {
        match Self::read(path).and_then(|decoded| self.check(decoded)) {
            Ok((points, start_time)) => Admission::Admitted(Track {
                index,
                source: path.to_path_buf(),
                points,
                start_time: Some(start_time),
            }),
            Err(reason) => Admission::Skipped(reason),
        }
    }

    fn check(
        &self,
        decoded: DecodedTrack,
    ) -> Result<(Vec<GeoPoint>, DateTime<Utc>), SkipReason> {
        let start = decoded.start_time.ok_or(SkipReason::MissingStartTime)?;
        if start < self.cutoff {
            return Err(SkipReason::BeforeCutoff(start));
        }
        let points = decoded.positions();
        if points.len() < 2 {
            return Err(SkipReason::TooFewPoints(points.len()));
        }
        if !self.area.is_relevant(&points) {
            return Err(SkipReason::OutOfArea);
        }
        Ok((points, start))
    }

    /// Arrange canonical files in processing order.
    pub fn order(files: Vec<PathBuf>, order: ProcessingOrder) -> Vec<PathBuf> {
        let mut files = files;
        files.sort();
        match order {
            ProcessingOrder::BaseName => files,
            ProcessingOrder::StartTime => {
                let mut keyed: Vec<(Option<DateTime<Utc>>, PathBuf)> = files
                    .into_iter()
                    .map(|p| (Self::read(&p).ok().and_then(|d| d.start_time), p))
                    .collect();
                keyed.sort_by_key(|(t, _)| (t.is_none(), *t));
                keyed.into_iter().map(|(_, p)| p).collect()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/track/loader.rs"]
mod tests;
