use super::*;
use crate::animation::motion::MotionEffectsPatch;
use crate::animation::phase::Phase;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Paints a flat gray derived from the animated Y angle.
struct GrayBackend {
    lost: Arc<AtomicBool>,
}

impl RenderBackend for GrayBackend {
    fn name(&self) -> &'static str {
        "gray"
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn render(&mut self, view: &SceneView<'_>, target: &mut RgbaImage) -> ForgeResult<()> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(ForgeError::ContextLost);
        }
        let tau = std::f64::consts::TAU;
        let g = (view.anim.y.rem_euclid(tau) / tau * 255.0).round() as u8;
        for px in target.pixels_mut() {
            *px = image::Rgba([g, g, g, 255]);
        }
        Ok(())
    }
}

fn manager() -> (SceneManager, Arc<AtomicBool>) {
    let lost = Arc::new(AtomicBool::new(false));
    let backend = GrayBackend {
        lost: Arc::clone(&lost),
    };
    (SceneManager::with_backend(Box::new(backend), 48, 32), lost)
}

const TRIANGLE_OBJ: &[u8] = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

fn no_fade(m: &mut SceneManager, speed: f64) {
    m.update_motion_options(&MotionOptionsPatch {
        use_fade_in_out: Some(false),
        animation_speed: Some(speed),
        ..Default::default()
    });
}

#[test]
fn canvas_is_unavailable_after_dispose_and_dispose_is_idempotent() {
    let (mut m, _) = manager();
    assert!(m.get_canvas_surface().is_ok());
    m.dispose();
    m.dispose();
    assert!(matches!(
        m.get_canvas_surface(),
        Err(ForgeError::Disposed(_))
    ));
    assert!(!m.tick(0.1).unwrap());
    assert!(m.render_at_time(0.0).is_ok());
}

#[test]
fn unsupported_model_is_rejected_with_its_name() {
    let (mut m, _) = manager();
    let err = m
        .load_model(ModelFile::new("scene.fbx", vec![0u8; 4]))
        .unwrap_err();
    assert!(err.to_string().contains("scene.fbx"));
    assert!(!m.has_model());
}

#[test]
fn loading_a_model_starts_a_fade_in() {
    let (mut m, _) = manager();
    m.tick(1.0).unwrap();
    m.load_model(ModelFile::new("tri.obj", TRIANGLE_OBJ)).unwrap();
    assert!(m.has_model());
    assert_eq!(m.model_name(), Some("tri.obj"));
    let state = m.phase_state();
    assert_eq!((state.phase, state.progress), (Phase::FadeIn, 0.0));
    m.dispose_model();
    m.dispose_model();
    assert!(!m.has_model());
}

#[test]
fn failed_load_keeps_the_current_model() {
    let (mut m, _) = manager();
    m.load_model(ModelFile::new("tri.obj", TRIANGLE_OBJ)).unwrap();

    let err = m
        .load_model(ModelFile::new("bad.obj", "f 1 2 3\n"))
        .unwrap_err();
    assert!(matches!(err, ForgeError::ModelLoad { .. }));
    assert!(m.has_model());
    assert_eq!(m.model_name(), Some("tri.obj"));

    assert!(m.begin_load_model(ModelFile::new("broken.stl", "garbage")));
    assert!(m.wait_model_load().unwrap().is_err());
    assert!(!m.is_loading());
    assert_eq!(m.model_name(), Some("tri.obj"));
}

#[test]
fn background_loads_are_not_reentrant() {
    let (mut m, _) = manager();
    assert!(m.begin_load_model(ModelFile::new("a.obj", TRIANGLE_OBJ)));
    assert!(m.is_loading());
    assert!(!m.begin_load_model(ModelFile::new("b.obj", TRIANGLE_OBJ)));
    m.load_model(ModelFile::new("c.obj", TRIANGLE_OBJ)).unwrap();
    assert!(!m.has_model());

    m.wait_model_load().unwrap().unwrap();
    assert!(!m.is_loading());
    assert_eq!(m.model_name(), Some("a.obj"));
    assert!(m.poll_model_load().is_none());
}

#[test]
fn paused_loop_renders_nothing_and_resume_starts_from_zero_delta() {
    let (mut m, _) = manager();
    let t0 = Instant::now();
    assert!(m.frame(t0).unwrap());
    m.pause_live_loop();
    assert!(!m.tick(0.1).unwrap());
    assert!(!m.frame(t0 + Duration::from_millis(100)).unwrap());

    m.resume_live_loop();
    let before = m.phase_state();
    assert!(m.frame(t0 + Duration::from_secs(5)).unwrap());
    assert_eq!(m.phase_state(), before);
}

#[test]
fn frame_delta_is_clamped() {
    let (mut m, _) = manager();
    let t0 = Instant::now();
    m.frame(t0).unwrap();
    m.frame(t0 + Duration::from_secs(10)).unwrap();
    let state = m.phase_state();
    assert_eq!(state.phase, Phase::FadeIn);
    assert!((state.progress - MAX_FRAME_DELTA_S * 1000.0 / 2500.0).abs() < 1e-9);
}

#[test]
fn seeking_never_touches_live_state() {
    let (mut m, _) = manager();
    m.load_model(ModelFile::new("tri.obj", TRIANGLE_OBJ)).unwrap();
    for _ in 0..10 {
        m.tick(0.5).unwrap();
    }
    let phase = m.phase_state();
    let orientation = m.orientation();

    m.render_at_time(12_345.0).unwrap();
    m.render_at_time(1_000.0).unwrap();
    assert_eq!(m.phase_state(), phase);
    assert_eq!(m.orientation(), orientation);
}

#[test]
fn seek_is_deterministic_and_out_of_order_safe() {
    let (mut m, _) = manager();
    no_fade(&mut m, 1.0);
    m.render_at_time(700.0).unwrap();
    let a = m.get_canvas_surface().unwrap().clone();
    m.render_at_time(3_000.0).unwrap();
    m.render_at_time(700.0).unwrap();
    assert_eq!(&a, m.get_canvas_surface().unwrap());
}

#[test]
fn live_spin_matches_seek() {
    let (mut m, _) = manager();
    no_fade(&mut m, std::f64::consts::PI);
    for _ in 0..32 {
        m.tick(0.015625).unwrap();
    }
    let live = m.get_canvas_surface().unwrap().clone();
    m.render_at_time(500.0).unwrap();
    assert_eq!(&live, m.get_canvas_surface().unwrap());
}

#[test]
fn context_loss_suspends_until_restored() {
    let (mut m, lost) = manager();
    lost.store(true, Ordering::SeqCst);
    assert!(!m.tick(0.1).unwrap());
    assert!(!m.is_live_running());
    assert!(m.render_at_time(0.0).unwrap_err().is_context_lost());

    lost.store(false, Ordering::SeqCst);
    m.on_context_restored();
    assert!(m.is_live_running());
    assert!(m.tick(0.1).unwrap());
}

#[test]
fn option_updates_drive_loop_durations() {
    let (mut m, _) = manager();
    assert_eq!(m.loop_duration_ms(), 2.0 * 2500.0 + 20000.0);

    m.update_effect_options(&EffectOptionsPatch {
        animation_duration: Some(1000.0),
        ..Default::default()
    });
    assert_eq!(m.loop_duration_ms(), 22000.0);

    no_fade(&mut m, std::f64::consts::PI);
    assert!((m.loop_duration_ms() - 2000.0).abs() < 1e-9);
    assert!((m.export_loop_duration_ms() - 2000.0).abs() < 1e-9);
    assert_eq!(m.phase_state().phase, Phase::Show);
}

#[test]
fn disabling_spin_returns_to_rest() {
    let (mut m, _) = manager();
    no_fade(&mut m, 1.0);
    m.tick(0.2).unwrap();
    assert!(m.orientation().y > 0.0);
    m.update_motion_options(&MotionOptionsPatch {
        animation_effects: Some(MotionEffectsPatch {
            spin_y: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    });
    for _ in 0..30 {
        m.tick(1.0 / 60.0).unwrap();
    }
    assert_eq!(m.orientation().y, 0.0);
}

#[test]
fn observer_sees_every_live_frame() {
    let (mut m, _) = manager();
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    m.set_on_frame_rendered(Some(Box::new(move |img: &RgbaImage| {
        assert_eq!(img.dimensions(), (48, 32));
        seen.fetch_add(1, Ordering::SeqCst);
    })));
    m.tick(0.01).unwrap();
    m.tick(0.01).unwrap();
    m.render_at_time(0.0).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn reset_to_loop_start_rewinds_live_state() {
    let (mut m, _) = manager();
    m.tick(0.25).unwrap();
    m.tick(0.25).unwrap();
    m.reset_to_loop_start().unwrap();
    assert_eq!(m.phase_state(), PhaseState::new(Phase::FadeIn, 0.0));
    assert_eq!(m.orientation(), Orientation::ZERO);
}

#[test]
fn resizing_reallocates_the_canvas() {
    let (mut m, _) = manager();
    m.set_size(20, 10);
    assert_eq!(m.canvas_size(), (20, 10));
    assert_eq!(m.get_canvas_surface().unwrap().dimensions(), (20, 10));
}
