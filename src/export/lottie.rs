use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, RgbaImage};
use serde_json::{Value, json};

use crate::export::sink::{FrameSink, SinkConfig, check_order, ensure_parent_dir, started};
use crate::foundation::error::{ForgeError, ForgeResult};

pub const LOTTIE_VERSION: &str = "5.9.0";
/// Longest side of the raster frames embedded in the animation.
pub const LOTTIE_MAX_PX: u32 = 256;

/// Output size after capping the longer side at `max_px`.
pub fn capped_size(width: u32, height: u32, max_px: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_px {
        return (width, height);
    }
    let scale = f64::from(max_px) / f64::from(longest);
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Rough output size in MiB: PNG at ~30% of raw, base64 adds ~37%.
pub fn estimate_size_mb(frame_count: u32, width: u32, height: u32) -> f64 {
    let (w, h) = capped_size(width, height, LOTTIE_MAX_PX);
    let per_frame = f64::from(w) * f64::from(h) * 4.0 * 0.3 * 1.37;
    per_frame * f64::from(frame_count) / 1024.0 / 1024.0
}

fn png_data_url(img: &RgbaImage) -> ForgeResult<String> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ForgeError::encode(format!("png encode: {e}")))?;
    Ok(format!(
        "data:image/png;base64,{}",
        BASE64_STANDARD.encode(png)
    ))
}

/// One image layer per frame, each visible for exactly one Lottie frame.
fn frame_layer(i: u32, w: u32, h: u32) -> Value {
    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    json!({
        "ddd": 0,
        "ind": i + 1,
        "ty": 2,
        "nm": format!("f{i}"),
        "refId": format!("f{i}"),
        "ks": {
            "o": { "a": 0, "k": 100 },
            "r": { "a": 0, "k": 0 },
            "p": { "a": 0, "k": [cx, cy, 0] },
            "a": { "a": 0, "k": [cx, cy, 0] },
            "s": { "a": 0, "k": [100, 100, 100] }
        },
        "ao": 0,
        "ip": i,
        "op": i + 1,
        "st": 0,
        "sr": 1,
        "bm": 0
    })
}

/// Lottie JSON with raster frames embedded as PNG data URIs.
#[derive(Debug)]
pub struct LottieSink {
    out_path: PathBuf,
    name: String,
    max_px: u32,
    cfg: Option<SinkConfig>,
    out_size: (u32, u32),
    assets: Vec<Value>,
    layers: Vec<Value>,
}

impl LottieSink {
    pub fn new(out_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            out_path: out_path.into(),
            name: name.into(),
            max_px: LOTTIE_MAX_PX,
            cfg: None,
            out_size: (0, 0),
            assets: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn with_max_px(mut self, max_px: u32) -> Self {
        self.max_px = max_px.max(1);
        self
    }

    fn document(&self, cfg: &SinkConfig) -> Value {
        let (w, h) = self.out_size;
        json!({
            "v": LOTTIE_VERSION,
            "fr": cfg.fps,
            "ip": 0,
            "op": cfg.frame_count,
            "w": w,
            "h": h,
            "nm": self.name,
            "ddd": 0,
            "assets": self.assets,
            "layers": self.layers
        })
    }
}

impl FrameSink for LottieSink {
    fn begin(&mut self, cfg: SinkConfig) -> ForgeResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&self.out_path)?;
        self.out_size = capped_size(cfg.width, cfg.height, self.max_px);
        self.assets.clear();
        self.layers.clear();
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: u32, frame: &RgbaImage) -> ForgeResult<()> {
        let cfg = started(&self.cfg)?;
        cfg.check_frame(frame)?;
        check_order(idx, self.layers.len())?;

        let (w, h) = self.out_size;
        let url = if frame.dimensions() == (w, h) {
            png_data_url(frame)?
        } else {
            png_data_url(&imageops::resize(frame, w, h, FilterType::Triangle))?
        };
        self.assets.push(json!({
            "id": format!("f{idx}"),
            "w": w,
            "h": h,
            "u": "",
            "p": url,
            "e": 1
        }));
        self.layers.push(frame_layer(idx, w, h));
        Ok(())
    }

    fn end(&mut self) -> ForgeResult<()> {
        let cfg = started(&self.cfg)?;
        let doc = self.document(cfg);
        let text = serde_json::to_string(&doc).map_err(|e| ForgeError::serde(e.to_string()))?;
        std::fs::write(&self.out_path, text)?;
        tracing::info!(path = %self.out_path.display(), frames = self.layers.len(), "lottie written");
        self.cfg = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/lottie.rs"]
mod tests;
