//! On-disk frame store: one PNG per segment, reused across runs.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::foundation::core::FrameId;
use crate::foundation::error::{TrailreelError, TrailreelResult};

/// A rendered frame in output resolution.
#[derive(Clone, Debug)]
pub struct Frame {
    pub id: Option<FrameId>,
    pub path: PathBuf,
    pub image: RgbImage,
}

#[derive(Clone, Debug)]
pub struct FrameCache {
    dir: PathBuf,
}

impl FrameCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, id: FrameId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    pub fn ensure_dir(&self) -> TrailreelResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Delete every file in the folder, leaving the folder itself in place.
    pub fn clear(&self) -> TrailreelResult<usize> {
        let Ok(rd) = std::fs::read_dir(&self.dir) else {
            return Ok(0);
        };
        let mut removed = 0;
        for entry in rd {
            let path = entry?.path();
            if path.is_file() {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        tracing::info!(dir = %self.dir.display(), removed, "cleared frame folder");
        Ok(removed)
    }

    /// Persist one frame. Returns the error text when the write fails or the file reads back
    /// as an invalid image; the file is removed in that case.
    pub fn store(&self, id: FrameId, image: &RgbImage) -> Result<PathBuf, String> {
        let path = self.frame_path(id);
        let outcome = image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| e.to_string())
            .and_then(|()| validate_frame(&path));
        match outcome {
            Ok(()) => Ok(path),
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }

    /// Every decodable `*.png` in the folder, sorted by file name, as 3-channel images.
    ///
    /// Unreadable files are skipped with a warning. An empty result is an error.
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load_all(&self) -> TrailreelResult<Vec<Frame>> {
        let mut paths: Vec<PathBuf> = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "png"))
                .collect(),
            Err(_) => Vec::new(),
        };
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match image::open(&path) {
                Ok(img) => {
                    let id = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .and_then(FrameId::parse_file_name);
                    frames.push(Frame {
                        id,
                        image: img.to_rgb8(),
                        path,
                    });
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable frame");
                }
            }
        }

        if frames.is_empty() {
            return Err(TrailreelError::NoFrames(self.dir.clone()));
        }
        tracing::info!(count = frames.len(), "loaded cached frames");
        Ok(frames)
    }
}

/// A frame file is valid when it opens as an image.
pub fn validate_frame(path: &Path) -> Result<(), String> {
    image::open(path).map(|_| ()).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "../tests/unit/cache/cache.rs"]
mod tests;
