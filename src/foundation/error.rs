use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type TrailreelResult<T> = Result<T, TrailreelError>;

/// Errors that cross a stage boundary.
///
/// Per-file and per-frame problems never show up here: they are reported as
/// [`SkipReason`](crate::SkipReason) values and collected into the run summary.
#[derive(thiserror::Error, Debug)]
pub enum TrailreelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("no frames available in '{}'", .0.display())]
    NoFrames(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrailreelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
