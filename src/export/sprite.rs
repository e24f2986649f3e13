use std::path::{Path, PathBuf};

use image::{RgbaImage, imageops};

use crate::export::sink::{FrameSink, SinkConfig, check_order, ensure_parent_dir, started};
use crate::foundation::error::{ForgeError, ForgeResult};

/// Frames per sprite-sheet row.
pub const SPRITE_COLUMNS: u32 = 6;

/// Lay frames out left-to-right, top-to-bottom in [`SPRITE_COLUMNS`] columns.
pub fn build_sprite_sheet(frames: &[RgbaImage], frame_w: u32, frame_h: u32) -> RgbaImage {
    let rows = (frames.len() as u32).div_ceil(SPRITE_COLUMNS).max(1);
    let mut sheet = RgbaImage::new(SPRITE_COLUMNS * frame_w, rows * frame_h);
    for (i, frame) in frames.iter().enumerate() {
        let i = i as u32;
        let x = (i % SPRITE_COLUMNS) * frame_w;
        let y = (i / SPRITE_COLUMNS) * frame_h;
        imageops::replace(&mut sheet, frame, i64::from(x), i64::from(y));
    }
    sheet
}

fn save_png(img: &RgbaImage, path: &Path) -> ForgeResult<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ForgeError::encode(format!("failed to write '{}': {e}", path.display())))
}

/// Collects frames and writes one PNG sprite sheet.
#[derive(Debug)]
pub struct SpriteSheetSink {
    out_path: PathBuf,
    cfg: Option<SinkConfig>,
    frames: Vec<RgbaImage>,
}

impl SpriteSheetSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            cfg: None,
            frames: Vec::new(),
        }
    }
}

impl FrameSink for SpriteSheetSink {
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
        let sheet = build_sprite_sheet(&self.frames, cfg.width, cfg.height);
        save_png(&sheet, &self.out_path)?;
        tracing::info!(path = %self.out_path.display(), frames = self.frames.len(), "sprite sheet written");
        self.frames.clear();
        self.cfg = None;
        Ok(())
    }
}

fn keyframe_percent(i: u32, count: u32) -> String {
    let pct = format!("{:.4}", f64::from(i) / f64::from(count) * 100.0);
    pct.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Keyframe CSS stepping through a sprite sheet. The 100% stop is omitted so the loop
/// restarts at 0% without showing a frame twice.
pub fn generate_css(name: &str, frame_w: u32, frame_h: u32, frame_count: u32, loop_ms: f64) -> String {
    let rows = frame_count.div_ceil(SPRITE_COLUMNS).max(1);
    let total_w = SPRITE_COLUMNS * frame_w;
    let total_h = rows * frame_h;
    let stops = (0..frame_count)
        .map(|i| {
            let x = (i % SPRITE_COLUMNS) * frame_w;
            let y = (i / SPRITE_COLUMNS) * frame_h;
            format!(
                "  {}% {{ background-position: -{x}px -{y}px; }}",
                keyframe_percent(i, frame_count)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let loop_ms = loop_ms.round() as u64;

    format!(
        ".{name} {{
  display: inline-block;
  width: {frame_w}px;
  height: {frame_h}px;
  background-image: url('./{name}-sprite.png');
  background-repeat: no-repeat;
  background-size: {total_w}px {total_h}px;
  animation: {name}-frames {loop_ms}ms steps(1, end) infinite;
}}

@keyframes {name}-frames {{
{stops}
}}
"
    )
}

pub fn generate_css_readme(name: &str, frame_w: u32, frame_h: u32) -> String {
    format!(
        "# {name}: CSS Animation

BitmapForge CSS export. No JavaScript required.

## Usage

```html
<link rel=\"stylesheet\" href=\"./{name}.css\">

<div class=\"{name}\"></div>
```

The sprite sheet `{name}-sprite.png` must be served alongside the CSS file.

## Sizing

The default size is {frame_w}x{frame_h}px (the export canvas size).
To scale up without blurring, use CSS `transform: scale(2)` or similar.

## Notes

- Works in all modern browsers, pure CSS.
- To change animation speed, override the `animation-duration` property.
- To pause: `.{name} {{ animation-play-state: paused; }}`
"
    )
}

/// Writes `<name>.css`, `<name>-sprite.png` and `README.md` into a directory.
#[derive(Debug)]
pub struct CssSink {
    dir: PathBuf,
    name: String,
    sheet: SpriteSheetSink,
}

impl CssSink {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        let dir = dir.into();
        let name = name.into();
        let sheet = SpriteSheetSink::new(dir.join(format!("{name}-sprite.png")));
        Self { dir, name, sheet }
    }
}

impl FrameSink for CssSink {
    fn begin(&mut self, cfg: SinkConfig) -> ForgeResult<()> {
        if self.name.is_empty() || !self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ForgeError::validation(format!(
                "css animation name '{}' must be non-empty [A-Za-z0-9_-]",
                self.name
            )));
        }
        std::fs::create_dir_all(&self.dir)?;
        self.sheet.begin(cfg)
    }

    fn push_frame(&mut self, idx: u32, frame: &RgbaImage) -> ForgeResult<()> {
        self.sheet.push_frame(idx, frame)
    }

    fn end(&mut self) -> ForgeResult<()> {
        let cfg = started(&self.sheet.cfg)?.clone();
        self.sheet.end()?;
        let css = generate_css(&self.name, cfg.width, cfg.height, cfg.frame_count, cfg.loop_ms);
        std::fs::write(self.dir.join(format!("{}.css", self.name)), css)?;
        std::fs::write(
            self.dir.join("README.md"),
            generate_css_readme(&self.name, cfg.width, cfg.height),
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sprite.rs"]
mod tests;
