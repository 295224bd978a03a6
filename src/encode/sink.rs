use image::RgbImage;

use crate::foundation::error::{TrailreelError, TrailreelResult};

/// Stream parameters handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Consumer of an ordered sequence of opaque RGB frames.
///
/// `push_frame` is called with strictly increasing indices between one `begin` and one `end`.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> TrailreelResult<()>;
    fn push_frame(&mut self, idx: u64, frame: &RgbImage) -> TrailreelResult<()>;
    fn end(&mut self) -> TrailreelResult<()>;
}

/// Sink that keeps everything in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, RgbImage)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(u64, RgbImage)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TrailreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &RgbImage) -> TrailreelResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| TrailreelError::encode("in-memory sink not started"))?;
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(TrailreelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TrailreelResult<()> {
        self.ended = true;
        Ok(())
    }
}
