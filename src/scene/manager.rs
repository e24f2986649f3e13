use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;

use image::RgbaImage;

use crate::animation::motion::{MotionController, MotionOptions, MotionOptionsPatch};
use crate::animation::phase::{PhaseClock, PhaseState};
use crate::animation::timeline::LoopModel;
use crate::effects::bitmap::{BitmapEffect, ParticleSource};
use crate::effects::options::{EffectChanges, EffectOptions, EffectOptionsPatch};
use crate::foundation::core::{LightDirection, Orientation};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::scene::backend::{BackendKind, RenderBackend, SceneView, create_backend};
use crate::scene::loader::{ModelFile, ParserRegistry};
use crate::scene::mesh::Mesh;

/// Largest wall-clock delta a single live frame may advance by, in seconds.
pub const MAX_FRAME_DELTA_S: f64 = 0.25;

type FrameObserver = Box<dyn FnMut(&RgbaImage) + Send>;

struct PendingLoad {
    name: String,
    rx: Receiver<ForgeResult<Mesh>>,
}

/// Owns the scene, the bitmap effect and both time axes.
///
/// The live axis (`frame`/`tick`) advances the phase clock and motion incrementally.
/// The seek axis (`render_at_time`) derives everything from the requested time and
/// leaves the live state untouched, so exports can interleave with a paused preview.
pub struct SceneManager {
    backend: Box<dyn RenderBackend>,
    registry: Arc<ParserRegistry>,
    mesh: Option<Mesh>,
    model_name: Option<String>,
    effect: BitmapEffect,
    motion_options: MotionOptions,
    clock: PhaseClock,
    motion: MotionController,
    anim: Orientation,
    base: Orientation,
    light: LightDirection,
    frame: RgbaImage,
    running: bool,
    suspended: bool,
    disposed: bool,
    last_frame: Option<Instant>,
    pending: Option<PendingLoad>,
    on_frame: Option<FrameObserver>,
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("backend", &self.backend.name())
            .field("size", &self.frame.dimensions())
            .field("model", &self.model_name)
            .field("phase", &self.clock.state())
            .field("running", &self.running)
            .field("suspended", &self.suspended)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl SceneManager {
    /// Facade over the CPU backend with default options.
    pub fn new(width: u32, height: u32) -> ForgeResult<Self> {
        Ok(Self::with_backend(
            create_backend(BackendKind::Cpu)?,
            width,
            height,
        ))
    }

    pub fn with_backend(backend: Box<dyn RenderBackend>, width: u32, height: u32) -> Self {
        let options = EffectOptions::default();
        let motion_options = MotionOptions::default();
        let timing = motion_options.loop_model(options.fade_ms);
        let mut manager = Self {
            backend,
            registry: Arc::new(ParserRegistry::default()),
            mesh: None,
            model_name: None,
            effect: BitmapEffect::new(options, width, height),
            motion: MotionController::new(motion_options.effects, motion_options.speed),
            motion_options,
            clock: PhaseClock::new(timing),
            anim: Orientation::ZERO,
            base: Orientation::ZERO,
            light: LightDirection::default(),
            frame: RgbaImage::new(1, 1),
            running: true,
            suspended: false,
            disposed: false,
            last_frame: None,
            pending: None,
            on_frame: None,
        };
        manager.set_size(width, height);
        manager
    }

    pub fn set_parser_registry(&mut self, registry: Arc<ParserRegistry>) {
        self.registry = registry;
    }

    /// Reallocate every surface. An in-flight fade restarts with fresh particles.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.effect.set_size(width, height);
        let layout = self.effect.layout();
        self.frame = RgbaImage::new(layout.canvas_width, layout.canvas_height);
        self.backend.resize(layout.canvas_width, layout.canvas_height);
        if self.clock.state().is_fading() {
            self.clock.restart_phase();
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        let layout = self.effect.layout();
        (layout.canvas_width, layout.canvas_height)
    }

    // Model lifecycle

    /// Replace the current model. Ignored while a background load is in flight.
    #[tracing::instrument(skip(self, file), fields(name = %file.name))]
    pub fn load_model(&mut self, file: ModelFile) -> ForgeResult<()> {
        if self.disposed {
            return Err(ForgeError::disposed("load_model"));
        }
        if self.pending.is_some() {
            tracing::warn!("model load already in flight; request ignored");
            return Ok(());
        }
        // The current model stays on screen when parsing fails.
        let mesh = self.registry.load(&file)?;
        self.dispose_model();
        self.install_model(file.name, mesh);
        Ok(())
    }

    pub fn load_model_file(&mut self, path: impl AsRef<std::path::Path>) -> ForgeResult<()> {
        self.load_model(ModelFile::open(path)?)
    }

    /// Parse `file` on a worker thread. Returns `false` (and does nothing) when a load is
    /// already in flight.
    pub fn begin_load_model(&mut self, file: ModelFile) -> bool {
        if self.disposed || self.pending.is_some() {
            return false;
        }
        let (tx, rx) = mpsc::channel();
        let registry = Arc::clone(&self.registry);
        let name = file.name.clone();
        std::thread::spawn(move || {
            // The receiver may be gone if the manager was disposed meanwhile.
            let _ = tx.send(registry.load(&file));
        });
        self.pending = Some(PendingLoad { name, rx });
        true
    }

    /// Install a finished background load. `None` while still loading or when idle.
    pub fn poll_model_load(&mut self) -> Option<ForgeResult<()>> {
        let pending = self.pending.as_ref()?;
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ForgeError::Other(anyhow::anyhow!(
                "model loader thread exited"
            ))
            .into_model_load(pending.name.clone())),
        };
        Some(self.finish_pending(result))
    }

    /// Block until the background load finishes and install it.
    pub fn wait_model_load(&mut self) -> Option<ForgeResult<()>> {
        let pending = self.pending.as_ref()?;
        let result = pending.rx.recv().unwrap_or_else(|_| {
            Err(ForgeError::Other(anyhow::anyhow!("model loader thread exited"))
                .into_model_load(pending.name.clone()))
        });
        Some(self.finish_pending(result))
    }

    fn finish_pending(&mut self, result: ForgeResult<Mesh>) -> ForgeResult<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let mesh = result?;
        self.dispose_model();
        self.install_model(pending.name, mesh);
        Ok(())
    }

    fn install_model(&mut self, name: String, mesh: Mesh) {
        tracing::info!(%name, triangles = mesh.triangle_count(), "model installed");
        self.mesh = Some(mesh);
        self.model_name = Some(name);
        self.restart_loop();
    }

    /// Drop the current model. Idempotent.
    pub fn dispose_model(&mut self) {
        if let Some(name) = self.model_name.take() {
            tracing::debug!(%name, "model disposed");
        }
        self.mesh = None;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_model(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    // Configuration

    pub fn effect_options(&self) -> &EffectOptions {
        self.effect.options()
    }

    pub fn motion_options(&self) -> &MotionOptions {
        &self.motion_options
    }

    pub fn light_direction(&self) -> LightDirection {
        self.light
    }

    pub fn base_orientation(&self) -> Orientation {
        self.base
    }

    fn loop_model(&self) -> LoopModel {
        self.motion_options.loop_model(self.effect.options().fade_ms)
    }

    pub fn update_effect_options(&mut self, patch: &EffectOptionsPatch) -> EffectChanges {
        let changes = self.effect.update_options(patch);
        if changes.timing {
            self.clock.set_timing(self.loop_model());
        }
        if (changes.fade_variant || changes.pixel_size) && self.clock.state().is_fading() {
            self.clock.restart_phase();
        }
        changes
    }

    pub fn update_motion_options(&mut self, patch: &MotionOptionsPatch) {
        self.motion_options.apply(patch);
        self.motion.set_effects(self.motion_options.effects);
        self.motion.set_speed(self.motion_options.speed);
        self.clock.set_timing(self.loop_model());
    }

    pub fn set_light_direction(&mut self, light: LightDirection) {
        self.light = light;
    }

    pub fn set_base_orientation(&mut self, base: Orientation) {
        self.base = base;
    }

    // Live loop

    pub fn pause_live_loop(&mut self) {
        self.running = false;
    }

    /// Resume live frames. The next frame starts with a zero delta.
    pub fn resume_live_loop(&mut self) {
        if self.disposed {
            return;
        }
        self.running = true;
        self.last_frame = None;
    }

    pub fn is_live_running(&self) -> bool {
        self.running && !self.suspended && !self.disposed
    }

    pub fn on_context_lost(&mut self) {
        if !self.suspended {
            tracing::warn!("render context lost; live loop suspended");
        }
        self.suspended = true;
    }

    pub fn on_context_restored(&mut self) {
        if self.suspended {
            tracing::info!("render context restored");
        }
        self.suspended = false;
        self.last_frame = None;
    }

    pub fn set_on_frame_rendered(&mut self, observer: Option<FrameObserver>) {
        self.on_frame = observer;
    }

    /// Live frame at wall time `now`. Returns whether a frame was rendered.
    pub fn frame(&mut self, now: Instant) -> ForgeResult<bool> {
        if !self.is_live_running() {
            return Ok(false);
        }
        let delta_s = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0)
            .clamp(0.0, MAX_FRAME_DELTA_S);
        self.last_frame = Some(now);
        self.tick(delta_s)
    }

    /// Advance the live state by `delta_s` and render. Returns whether a frame was rendered.
    pub fn tick(&mut self, delta_s: f64) -> ForgeResult<bool> {
        if !self.is_live_running() {
            return Ok(false);
        }
        let step = self.clock.advance(delta_s);
        if step.entered.is_some() {
            self.effect.reset_particles();
        }
        self.motion.apply_live(&mut self.anim, delta_s, step.motion_s);

        match self.render_pass(self.anim, step.state, ParticleSource::Live) {
            Ok(()) => {}
            Err(e) if e.is_context_lost() => {
                self.on_context_lost();
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
        if let Some(observer) = self.on_frame.as_mut() {
            observer(self.effect.output());
        }
        Ok(true)
    }

    /// Render the current live state once without advancing time.
    pub fn render_once(&mut self) -> ForgeResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.render_pass(self.anim, self.clock.state(), ParticleSource::Live)
    }

    fn restart_loop(&mut self) {
        self.clock.reset();
        self.motion.reset();
        self.anim = Orientation::ZERO;
        self.effect.reset_particles();
    }

    /// Restart the loop from its first frame (fadeIn, or show without fades) and render it.
    pub fn reset_to_loop_start(&mut self) -> ForgeResult<()> {
        self.restart_loop();
        self.last_frame = None;
        self.render_once()
    }

    // Seek axis

    /// Deterministically render the frame at `abs_ms` on the full loop.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render_at_time(&mut self, abs_ms: f64) -> ForgeResult<()> {
        let timing = self.loop_model();
        let state = timing.phase_at(abs_ms);
        let anim = self.motion.orientation_at(abs_ms, &timing);
        self.seek_render(anim, state)
    }

    /// Render the frame at `abs_ms` on the fade-free short loop used by looping exports.
    /// The loop closes: `export_loop_duration_ms()` renders the same frame as 0.
    pub fn render_at_time_for_export(&mut self, abs_ms: f64) -> ForgeResult<()> {
        let cycle = self.loop_model().export_cycle(abs_ms);
        let anim = self.motion.orientation_in_cycle(cycle);
        self.seek_render(anim, PhaseState::SHOW)
    }

    fn seek_render(&mut self, anim: Orientation, state: PhaseState) -> ForgeResult<()> {
        if self.disposed {
            tracing::warn!("render_at_time after dispose ignored");
            return Ok(());
        }
        let result = self.render_pass(anim, state, ParticleSource::Fresh);
        if matches!(&result, Err(e) if e.is_context_lost()) {
            self.on_context_lost();
        }
        result
    }

    fn render_pass(&mut self, anim: Orientation, state: PhaseState, source: ParticleSource) -> ForgeResult<()> {
        let view = SceneView {
            mesh: self.mesh.as_ref(),
            base: self.base,
            anim,
            light: self.light,
            background: self.effect.options().background,
        };
        self.backend.render(&view, &mut self.frame)?;
        self.effect.render(&self.frame, state, source);
        Ok(())
    }

    // Introspection

    /// Live phase and progress.
    pub fn phase_state(&self) -> PhaseState {
        self.clock.state()
    }

    /// Live animated rotation.
    pub fn orientation(&self) -> Orientation {
        self.anim
    }

    pub fn loop_duration_ms(&self) -> f64 {
        self.loop_model().loop_duration_ms()
    }

    pub fn export_loop_duration_ms(&self) -> f64 {
        self.loop_model().export_loop_duration_ms()
    }

    /// The dithered output canvas. Fails after [`dispose`](Self::dispose).
    pub fn get_canvas_surface(&self) -> ForgeResult<&RgbaImage> {
        if self.disposed {
            return Err(ForgeError::disposed("get_canvas_surface"));
        }
        Ok(self.effect.output())
    }

    /// Stop the live loop and release the model and render resources. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.running = false;
        self.pending = None;
        self.on_frame = None;
        self.dispose_model();
        self.backend.release();
        self.disposed = true;
        tracing::debug!("scene manager disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/manager.rs"]
mod tests;
