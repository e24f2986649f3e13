use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;

use crate::export::sink::{FrameSink, InMemorySink, SinkConfig};
use crate::foundation::core::Background;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::scene::manager::SceneManager;

/// Capture rate used by the frame-based exporters.
pub const DEFAULT_EXPORT_FPS: f64 = 16.0;
pub const MIN_EXPORT_FRAMES: u32 = 12;

/// Frames to capture for one loop: `max(12, round(loop_s * fps))`.
pub fn frame_count(loop_ms: f64, fps: f64) -> u32 {
    let n = (loop_ms / 1000.0 * fps).round();
    if n.is_finite() && n > f64::from(MIN_EXPORT_FRAMES) {
        n.min(f64::from(u32::MAX)) as u32
    } else {
        MIN_EXPORT_FRAMES
    }
}

/// Per-frame display time, `round(loop_ms / count)`.
pub fn frame_delay_ms(loop_ms: f64, count: u32) -> u32 {
    let d = (loop_ms / f64::from(count.max(1))).round();
    if d.is_finite() && d > 0.0 { d as u32 } else { 0 }
}

/// Which loop an export spans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportTiming {
    /// fadeIn + show + fadeOut (or one revolution without fades).
    #[default]
    FullLoop,
    /// One fade-free revolution, capped for short looping exports.
    ShortLoop,
}

/// Anything that can render deterministic frames on a loop.
pub trait FrameSource {
    fn canvas_size(&self) -> (u32, u32);
    fn background(&self) -> Background;
    fn loop_duration_ms(&self, timing: ExportTiming) -> f64;
    fn render_at(&mut self, abs_ms: f64, timing: ExportTiming) -> ForgeResult<()>;
    fn surface(&self) -> ForgeResult<&RgbaImage>;
    fn pause_live(&mut self);
    fn resume_live(&mut self);
}

impl FrameSource for SceneManager {
    fn canvas_size(&self) -> (u32, u32) {
        SceneManager::canvas_size(self)
    }

    fn background(&self) -> Background {
        self.effect_options().background
    }

    fn loop_duration_ms(&self, timing: ExportTiming) -> f64 {
        match timing {
            ExportTiming::FullLoop => SceneManager::loop_duration_ms(self),
            ExportTiming::ShortLoop => self.export_loop_duration_ms(),
        }
    }

    fn render_at(&mut self, abs_ms: f64, timing: ExportTiming) -> ForgeResult<()> {
        match timing {
            ExportTiming::FullLoop => self.render_at_time(abs_ms),
            ExportTiming::ShortLoop => self.render_at_time_for_export(abs_ms),
        }
    }

    fn surface(&self) -> ForgeResult<&RgbaImage> {
        self.get_canvas_surface()
    }

    fn pause_live(&mut self) {
        self.pause_live_loop();
    }

    fn resume_live(&mut self) {
        self.resume_live_loop();
    }
}

/// Cooperative cancellation flag shared between an export and its caller.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct CaptureOptions {
    pub fps: f64,
    pub timing: ExportTiming,
    pub cancel: Option<CancelToken>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_EXPORT_FPS,
            timing: ExportTiming::FullLoop,
            cancel: None,
        }
    }
}

impl CaptureOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// What an export produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportSummary {
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    pub loop_ms: f64,
}

/// Keeps the live loop paused for its lifetime.
struct LivePause<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FrameSource + ?Sized> LivePause<'a, S> {
    fn new(source: &'a mut S) -> Self {
        source.pause_live();
        Self { source }
    }
}

impl<S: FrameSource + ?Sized> Drop for LivePause<'_, S> {
    fn drop(&mut self) {
        self.source.resume_live();
    }
}

/// Capture one loop into `sink`, frame `k` at `k / n * loop_ms`.
///
/// The live loop is paused for the duration and resumed on every exit path. `progress`
/// receives `(captured, total)` after each frame.
#[tracing::instrument(skip_all, fields(fps = opts.fps, timing = ?opts.timing))]
pub fn export_frames<S: FrameSource + ?Sized>(
    source: &mut S,
    sink: &mut dyn FrameSink,
    opts: &CaptureOptions,
    mut progress: impl FnMut(u32, u32),
) -> ForgeResult<ExportSummary> {
    if !(opts.fps.is_finite() && opts.fps > 0.0) {
        return Err(ForgeError::validation("export fps must be positive"));
    }
    let guard = LivePause::new(source);
    let source = &mut *guard.source;

    let loop_ms = source.loop_duration_ms(opts.timing);
    let count = frame_count(loop_ms, opts.fps);
    let delay = frame_delay_ms(loop_ms, count);
    let (width, height) = source.canvas_size();
    tracing::debug!(loop_ms, count, delay, "capturing loop");

    sink.begin(SinkConfig {
        width,
        height,
        fps: opts.fps,
        frame_count: count,
        frame_delay_ms: delay,
        loop_ms,
        background: source.background(),
    })?;

    for i in 0..count {
        if opts.is_cancelled() {
            tracing::info!(captured = i, "export cancelled");
            return Err(ForgeError::Cancelled);
        }
        let t = f64::from(i) / f64::from(count) * loop_ms;
        source.render_at(t, opts.timing)?;
        sink.push_frame(i, source.surface()?)?;
        progress(i + 1, count);
    }
    sink.end()?;
    drop(guard);

    Ok(ExportSummary {
        frame_count: count,
        frame_delay_ms: delay,
        loop_ms,
    })
}

/// Capture one loop into memory.
pub fn capture_frames<S: FrameSource + ?Sized>(
    source: &mut S,
    opts: &CaptureOptions,
) -> ForgeResult<Vec<RgbaImage>> {
    let mut sink = InMemorySink::new();
    export_frames(source, &mut sink, opts, |_, _| {})?;
    Ok(sink.into_frames())
}

#[cfg(test)]
#[path = "../../tests/unit/export/capture.rs"]
mod tests;
