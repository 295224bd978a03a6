use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::TrailreelResult;

/// Recognized suffixes, longest first so `.fit.gz` wins over `.fit`.
const RECOGNIZED_SUFFIXES: [&str; 3] = [".fit.gz", ".fit", ".gpx"];

/// File format of a track source, ordered by preference when two files describe the same
/// activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceFormat {
    Fit,
    Gpx,
    Other,
}

impl SourceFormat {
    pub fn of(path: &Path) -> Self {
        let name = file_name(path).to_ascii_lowercase();
        if name.ends_with(".fit") {
            Self::Fit
        } else if name.ends_with(".gpx") {
            Self::Gpx
        } else {
            Self::Other
        }
    }
}

/// Logical activity identity: the file name with the longest recognized suffix removed,
/// falling back to stripping the last extension.
pub fn base_name(path: &Path) -> String {
    let name = file_name(path);
    for suffix in RECOGNIZED_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(name)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decompress `x.fit.gz` into the sibling `x.fit`. No-op when the target already exists.
pub fn decompress_gz(path: &Path) -> TrailreelResult<PathBuf> {
    let name = file_name(path);
    let target_name = name.strip_suffix(".gz").unwrap_or(&name);
    let target = path.with_file_name(target_name);
    if target.exists() {
        return Ok(target);
    }

    // Write to a scratch name first so an interrupted run never leaves a truncated `.fit`.
    let partial = path.with_file_name(format!("{target_name}.partial"));
    let src = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    let mut decoder = flate2::read::GzDecoder::new(src);
    let mut dst =
        File::create(&partial).with_context(|| format!("create '{}'", partial.display()))?;
    if let Err(err) = std::io::copy(&mut decoder, &mut dst) {
        drop(dst);
        let _ = std::fs::remove_file(&partial);
        return Err(anyhow::Error::new(err)
            .context(format!("decompress '{}'", path.display()))
            .into());
    }
    drop(dst);
    std::fs::rename(&partial, &target)
        .with_context(|| format!("move '{}' into place", target.display()))?;

    tracing::debug!(src = %path.display(), dst = %target.display(), "decompressed");
    Ok(target)
}

/// Regular files in `dir` whose name ends with `suffix` (case-sensitive), sorted.
fn list_with_suffix(dir: &Path, suffix: &str) -> TrailreelResult<Vec<PathBuf>> {
    let rd = std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))?;
    let mut out = Vec::new();
    for entry in rd {
        let entry = entry.with_context(|| format!("read dir entry in '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_file() && file_name(&path).ends_with(suffix) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// List candidate track files in `dir`: `*.fit`, then the decompressed `*.fit.gz`, then `*.gpx`.
///
/// An archive that fails to decompress is logged and left out.
pub fn discover(dir: &Path) -> TrailreelResult<Vec<PathBuf>> {
    let fit = list_with_suffix(dir, ".fit")?;
    let gz = list_with_suffix(dir, ".fit.gz")?;
    let gpx = list_with_suffix(dir, ".gpx")?;

    let mut candidates = fit;
    for archive in gz {
        match decompress_gz(&archive) {
            Ok(path) => candidates.push(path),
            Err(err) => {
                tracing::warn!(file = %archive.display(), error = %err, "skipping archive");
            }
        }
    }
    candidates.extend(gpx);
    Ok(candidates)
}

/// One chosen source file per logical activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonicalTrackSet {
    by_base: BTreeMap<String, PathBuf>,
}

impl CanonicalTrackSet {
    /// Single pass over `candidates`: a file replaces the current pick for its base name only
    /// when its format ranks strictly higher, so ties keep the first one seen.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut by_base: BTreeMap<String, PathBuf> = BTreeMap::new();
        for path in candidates {
            let base = base_name(&path);
            match by_base.get(&base) {
                Some(current) if SourceFormat::of(current) <= SourceFormat::of(&path) => {}
                _ => {
                    by_base.insert(base, path);
                }
            }
        }
        Self { by_base }
    }

    /// Discover, decompress and deduplicate the tracks in `dir`. A missing folder holds no
    /// tracks.
    #[tracing::instrument]
    pub fn scan(dir: &Path) -> TrailreelResult<Self> {
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "input folder not found; no tracks");
            return Ok(Self::default());
        }
        let candidates = discover(dir)?;
        let total = candidates.len();
        let set = Self::from_candidates(candidates);
        tracing::info!(candidates = total, kept = set.len(), "track files discovered");
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.by_base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_base.is_empty()
    }

    pub fn get(&self, base: &str) -> Option<&Path> {
        self.by_base.get(base).map(PathBuf::as_path)
    }

    /// Chosen files sorted by path.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.by_base.values().cloned().collect();
        files.sort();
        files
    }
}

#[cfg(test)]
#[path = "../../tests/unit/track/discover.rs"]
mod tests;
