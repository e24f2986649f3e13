use super::*;
use serde_json::json;
use std::f64::consts::PI;

const DT: f64 = 1.0 / 60.0;

fn no_fade(speed: f64) -> LoopModel {
    LoopModel {
        use_fade: false,
        fade_ms: 1000.0,
        show_ms: 2000.0,
        speed,
    }
}

fn run_live(c: &mut MotionController, steps: usize, dt: f64) -> Orientation {
    let mut o = Orientation::ZERO;
    for _ in 0..steps {
        c.apply_live(&mut o, dt, dt);
    }
    o
}

#[test]
fn pure_spin_live_matches_seek() {
    let timing = no_fade(PI);
    let mut c = MotionController::new(MotionEffects::default(), PI);
    let live = run_live(&mut c, 60, DT);
    let seek = c.orientation_at(1000.0, &timing);
    assert!(live.max_abs_diff(seek) < 1e-9, "{live:?} vs {seek:?}");
    assert!((seek.y - PI).abs() < 1e-12);
}

#[test]
fn float_live_telescopes_onto_closed_form() {
    let timing = no_fade(0.36);
    let effects = MotionEffects {
        spin_x: true,
        float: true,
        ..MotionEffects::NONE
    };
    let mut c = MotionController::new(effects, 0.36);
    let live = run_live(&mut c, 600, DT);
    let seek = c.orientation_at(10_000.0, &timing);
    assert!(live.max_abs_diff(seek) < 1e-9, "{live:?} vs {seek:?}");
    assert!(seek.z.abs() > 0.0);
}

#[test]
fn seek_is_idempotent_and_pure() {
    let timing = no_fade(1.0);
    let mut c = MotionController::new(MotionEffects::default(), 1.0);
    let _ = run_live(&mut c, 10, DT);
    let before = c.orientation();
    let mut a = Orientation::ZERO;
    let mut b = Orientation::new(9.0, 9.0, 9.0);
    c.apply_seek(&mut a, 1234.0, &timing);
    c.apply_seek(&mut b, 1234.0, &timing);
    assert_eq!(a, b);
    assert_eq!(c.orientation(), before);
}

#[test]
fn motion_is_frozen_during_fades_in_seek() {
    let timing = LoopModel {
        use_fade: true,
        fade_ms: 1000.0,
        show_ms: 2000.0,
        speed: 1.0,
    };
    let c = MotionController::new(MotionEffects::default(), 1.0);
    assert_eq!(c.orientation_at(500.0, &timing).y, 0.0);
    assert!((c.orientation_at(2000.0, &timing).y - 1.0).abs() < 1e-12);
    assert!((c.orientation_at(3500.0, &timing).y - 2.0).abs() < 1e-12);
}

#[test]
fn disabling_spin_returns_to_zero_within_duration() {
    let mut c = MotionController::new(MotionEffects::default(), 2.0);
    let o = run_live(&mut c, 30, DT);
    assert!(o.y > 0.5);

    c.set_effects(MotionEffects::NONE);
    assert!(c.is_returning());
    let mut o = c.orientation();
    let mut elapsed = 0.0;
    while elapsed < RETURN_DURATION_S + 1e-9 {
        c.apply_live(&mut o, DT, DT);
        elapsed += DT;
    }
    assert_eq!(o.y, 0.0);
    assert!(!c.is_returning());
}

#[test]
fn return_path_is_monotone() {
    let mut c = MotionController::new(MotionEffects::default(), 2.0);
    let _ = run_live(&mut c, 30, DT);
    c.set_effects(MotionEffects::NONE);
    let mut o = c.orientation();
    let mut prev = o.y;
    for _ in 0..30 {
        c.apply_live(&mut o, DT, DT);
        assert!(o.y <= prev + 1e-12);
        prev = o.y;
    }
}

#[test]
fn reenabling_mid_return_has_no_jump() {
    let speed = 2.0;
    let mut c = MotionController::new(MotionEffects::default(), speed);
    let _ = run_live(&mut c, 30, DT);
    c.set_effects(MotionEffects::NONE);
    let mut o = c.orientation();
    for _ in 0..6 {
        c.apply_live(&mut o, DT, DT);
    }
    let mid = o.y;
    assert!(mid > 0.0);

    c.set_effects(MotionEffects::default());
    assert!(!c.is_returning());
    c.apply_live(&mut o, DT, DT);
    assert!((o.y - mid).abs() <= speed * DT + 1e-12);
    assert!(o.y > mid);
}

#[test]
fn float_off_eases_oscillation_back() {
    let effects = MotionEffects {
        float: true,
        ..MotionEffects::NONE
    };
    let mut c = MotionController::new(effects, 1.0);
    let o = run_live(&mut c, 120, DT);
    assert!(o.x.abs() > 0.0);

    c.set_effects(MotionEffects::NONE);
    let mut o = c.orientation();
    for _ in 0..30 {
        c.apply_live(&mut o, DT, DT);
    }
    assert_eq!(o, Orientation::ZERO);
}

#[test]
fn reset_clears_accumulated_motion() {
    let mut c = MotionController::default();
    let _ = run_live(&mut c, 30, DT);
    c.reset();
    assert_eq!(c.orientation(), Orientation::ZERO);
}

#[test]
fn options_patch_is_lenient_and_clamped() {
    let patch: MotionOptionsPatch = serde_json::from_value(json!({
        "useFadeInOut": "false",
        "animationEffects": { "spinX": true, "float": "yes" },
        "animationSpeed": 0,
        "showPhaseDuration": "-5",
        "unknown": 1
    }))
    .unwrap();
    let mut opts = MotionOptions::default();
    opts.apply(&patch);
    assert!(!opts.use_fade);
    assert!(opts.effects.spin_x);
    assert!(opts.effects.spin_y);
    assert!(!opts.effects.float);
    assert_eq!(opts.speed, MIN_SPEED);
    assert_eq!(opts.show_ms, 0.0);
}

#[test]
fn short_loop_cycle_closes_on_every_axis() {
    let all = MotionEffects {
        spin_x: true,
        spin_y: true,
        spin_z: true,
        float: true,
    };
    let c = MotionController::new(all, 0.36);
    let start = c.orientation_in_cycle(0.0);
    assert_eq!(start, Orientation::ZERO);

    let half = c.orientation_in_cycle(0.5);
    assert!((half.y - PI).abs() < 1e-12);

    // One full turn lands on the starting pose.
    let end = c.orientation_in_cycle(1.0);
    assert!(end.to_mat4().abs_diff_eq(start.to_mat4(), 1e-5));
}
