use super::*;
use crate::effects::options::EffectOptions;

fn engine(dither: DitherAlgorithm, colors: Vec<Rgb8>, min_brightness: f64) -> DitherEngine {
    DitherEngine::new(&EffectOptions {
        dither,
        colors,
        min_brightness,
        ..EffectOptions::default()
    })
}

#[test]
fn brightness_weights_channels() {
    assert_eq!(brightness(0, 0, 0), 0.0);
    assert!((brightness(255, 255, 255) - 1.0).abs() < 1e-12);
    assert!((brightness(255, 0, 0) - 0.3).abs() < 1e-12);
}

#[test]
fn bayer_tables_are_normalized_below_one() {
    for y in 0..8 {
        for x in 0..8 {
            let t4 = threshold(DitherAlgorithm::Bayer4x4, x, y);
            let t8 = threshold(DitherAlgorithm::Bayer8x8, x, y);
            assert!((0.0..1.0).contains(&t4));
            assert!((0.0..1.0).contains(&t8));
        }
    }
    assert_eq!(threshold(DitherAlgorithm::Bayer4x4, 1, 0), 0.5);
    assert_eq!(threshold(DitherAlgorithm::Bayer4x4, 5, 4), 0.5);
}

#[test]
fn threshold_equality_always_skips() {
    let e = engine(DitherAlgorithm::Bayer4x4, vec![Rgb8::WHITE], 0.0);
    // (1, 0) has threshold exactly 0.5.
    for _ in 0..3 {
        assert!(!e.should_draw(0.5, 1, 0));
        assert!(e.should_draw(0.5 + 1e-9, 1, 0));
    }
}

#[test]
fn transparent_and_dark_samples_are_skipped() {
    let e = engine(DitherAlgorithm::Bayer4x4, vec![Rgb8::WHITE], 0.05);
    assert_eq!(e.classify([255, 255, 255, 0], 0, 0), None);
    assert_eq!(e.classify([5, 5, 5, 255], 0, 0), None);
    assert!(e.classify([255, 255, 255, 255], 0, 0).is_some());
}

#[test]
fn invert_applies_after_threshold_check() {
    let e = DitherEngine::new(&EffectOptions {
        invert: true,
        min_brightness: 0.05,
        dither: DitherAlgorithm::VariableDot,
        colors: vec![Rgb8::BLACK, Rgb8::WHITE],
        ..EffectOptions::default()
    });
    // Dark samples are dropped before inversion.
    assert_eq!(e.adjusted_brightness([0, 0, 0, 255]), None);
    let b = e.adjusted_brightness([51, 51, 51, 255]).unwrap();
    assert!((b - 0.8).abs() < 1e-9);
}

#[test]
fn white_pixel_variable_dot_scenario() {
    let e = engine(
        DitherAlgorithm::VariableDot,
        vec![Rgb8::from_hex("#000000").unwrap(), Rgb8::from_hex("#ffffff").unwrap()],
        0.1,
    );
    let d = e.classify([255, 255, 255, 255], 0, 0).unwrap();
    assert!((d.brightness - 1.0).abs() < 1e-12);
    assert_eq!(d.color.to_hex(), "#ffffff");
    let ps = f64::from(e.pixel_size());
    assert_eq!(d.shape, DotShape::Dot { radius: ps * 0.12 });
}

#[test]
fn dot_radius_shrinks_with_brightness() {
    assert!(dot_radius(10, 0.2) > dot_radius(10, 0.6));
    assert_eq!(dot_radius(10, 0.0), 5.0);
    assert!((dot_radius(10, 0.95) - 1.2).abs() < 1e-12);
}

#[test]
fn render_is_deterministic_and_fills_background() {
    let e = engine(DitherAlgorithm::Bayer8x8, vec![Rgb8::BLACK, Rgb8::WHITE], 0.05);
    let mut sample = RgbaImage::new(8, 8);
    for (x, y, p) in sample.enumerate_pixels_mut() {
        let v = ((x + y) * 16) as u8;
        p.0 = [v, v, v, 255];
    }
    let bg = Background::Solid(Rgb8::new(9, 9, 9));
    let mut a = RgbaImage::new(24, 24);
    let mut b = RgbaImage::new(24, 24);
    e.render(&sample, &mut a, bg);
    e.render(&sample, &mut b, bg);
    assert_eq!(a.as_raw(), b.as_raw());
    assert_eq!(a.get_pixel(0, 0).0, [9, 9, 9, 255]);
    assert!(a.pixels().any(|p| p.0 != [9, 9, 9, 255]));
}
