use super::*;

#[test]
fn endpoints_are_fixed_for_every_curve() {
    for ease in [Ease::Linear, Ease::InCubic, Ease::OutCubic, Ease::InOutCubic] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
        assert_eq!(ease.apply(-3.0), 0.0);
        assert_eq!(ease.apply(7.0), 1.0);
    }
}

#[test]
fn in_out_cubic_is_symmetric_about_midpoint() {
    assert!((Ease::InOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
    let a = Ease::InOutCubic.apply(0.25);
    let b = Ease::InOutCubic.apply(0.75);
    assert!((a + b - 1.0).abs() < 1e-12);
    assert!((a - 0.0625).abs() < 1e-12);
}

#[test]
fn out_cubic_front_loads_motion() {
    assert!(Ease::OutCubic.apply(0.2) > 0.2);
    assert!(Ease::InCubic.apply(0.2) < 0.2);
}

#[test]
fn nan_is_treated_as_start() {
    assert_eq!(Ease::OutCubic.apply(f64::NAN), 0.0);
}
