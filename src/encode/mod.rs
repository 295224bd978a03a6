//! Frame sinks and thin wrappers around the system `ffmpeg`/`ffprobe` binaries.

pub mod ffmpeg;
pub mod probe;
pub mod sink;
