use std::path::Path;

use image::RgbaImage;

use crate::foundation::core::Background;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::mul_div255_u16;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture rate the frame count was derived from.
    pub fps: f64,
    pub frame_count: u32,
    /// Display time of each frame, `round(loop_ms / frame_count)`.
    pub frame_delay_ms: u32,
    /// Length of the captured loop.
    pub loop_ms: f64,
    /// Effect background; opaque formats flatten over it.
    pub background: Background,
}

impl SinkConfig {
    pub fn validate(&self) -> ForgeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ForgeError::validation("sink width/height must be non-zero"));
        }
        if self.frame_count == 0 {
            return Err(ForgeError::validation("sink frame count must be non-zero"));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ForgeError::validation("sink fps must be positive"));
        }
        Ok(())
    }

    pub(crate) fn check_frame(&self, frame: &RgbaImage) -> ForgeResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(ForgeError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

/// Sink contract for consuming captured frames in loop order.
///
/// `push_frame` is called with strictly increasing indices starting at 0.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ForgeResult<()>;
    /// Push one frame (straight-alpha RGBA8).
    fn push_frame(&mut self, idx: u32, frame: &RgbaImage) -> ForgeResult<()>;
    /// Called once after the last frame is pushed. Not called when a capture fails or is
    /// cancelled.
    fn end(&mut self) -> ForgeResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<RgbaImage>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RgbaImage> {
        self.frames
    }

    /// `true` once `end` ran.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ForgeResult<()> {
        cfg.validate()?;
        self.frames.clear();
        self.frames.reserve(cfg.frame_count as usize);
        self.cfg = Some(cfg);
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u32, frame: &RgbaImage) -> ForgeResult<()> {
        let cfg = started(&self.cfg)?;
        cfg.check_frame(frame)?;
        check_order(idx, self.frames.len())?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> ForgeResult<()> {
        started(&self.cfg)?;
        self.finished = true;
        Ok(())
    }
}

pub(crate) fn started(cfg: &Option<SinkConfig>) -> ForgeResult<&SinkConfig> {
    cfg.as_ref()
        .ok_or_else(|| ForgeError::encode("sink not started"))
}

pub(crate) fn check_order(idx: u32, pushed: usize) -> ForgeResult<()> {
    if idx as usize != pushed {
        return Err(ForgeError::encode(format!(
            "out-of-order frame {idx}, expected {pushed}"
        )));
    }
    Ok(())
}

/// Composite a straight-alpha RGBA8 buffer over an opaque color.
pub fn flatten_over(dst: &mut [u8], src: &[u8], bg: [u8; 3]) -> ForgeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ForgeError::validation(
            "flatten_over expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(s[c]), a) + mul_div255_u16(u16::from(bg[c]), inv);
            d[c] = v.min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ForgeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;
