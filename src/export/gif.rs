use std::path::PathBuf;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::export::sink::{FrameSink, SinkConfig, check_order, ensure_parent_dir, started};
use crate::foundation::error::{ForgeError, ForgeResult};

/// Palette quantization speed (1 = best, 30 = fastest).
const GIF_SPEED: i32 = 10;

/// Looping GIF written with the `image` crate's encoder.
#[derive(Debug)]
pub struct GifSink {
    out_path: PathBuf,
    cfg: Option<SinkConfig>,
    frames: Vec<RgbaImage>,
}

impl GifSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            cfg: None,
            frames: Vec::new(),
        }
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> ForgeResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&self.out_path)?;
        self.frames.clear();
        self.cfg = Some(cfg);
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
        let cfg = started(&self.cfg)?;
        let delay = Delay::from_numer_denom_ms(cfg.frame_delay_ms, 1);

        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, GIF_SPEED);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| ForgeError::encode(format!("gif repeat: {e}")))?;
            for frame in self.frames.drain(..) {
                encoder
                    .encode_frame(Frame::from_parts(frame, 0, 0, delay))
                    .map_err(|e| ForgeError::encode(format!("gif frame: {e}")))?;
            }
        }
        std::fs::write(&self.out_path, bytes)?;
        tracing::info!(path = %self.out_path.display(), "gif written");
        self.cfg = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/gif.rs"]
mod tests;
