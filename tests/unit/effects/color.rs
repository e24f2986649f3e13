use super::*;

#[test]
fn empty_palette_falls_back_to_black() {
    let lut = ColorLut::new(&[]);
    assert_eq!(lut.get(0.0), Rgb8::BLACK);
    assert_eq!(lut.get(1.0), Rgb8::BLACK);
}

#[test]
fn single_stop_is_flat() {
    let c = Rgb8::new(12, 34, 56);
    let lut = ColorLut::new(&[c]);
    for b in [0.0, 0.2, 0.5, 0.99, 1.0] {
        assert_eq!(lut.get(b), c);
    }
}

#[test]
fn two_stops_interpolate_linearly() {
    let lut = ColorLut::new(&[Rgb8::BLACK, Rgb8::WHITE]);
    assert_eq!(lut.get(0.0), Rgb8::BLACK);
    assert_eq!(lut.get(1.0), Rgb8::WHITE);
    assert_eq!(lut.get(128.0 / 255.0), Rgb8::new(128, 128, 128));
}

#[test]
fn three_stops_hit_the_middle_exactly() {
    let mid = Rgb8::new(200, 0, 0);
    let stops = [Rgb8::BLACK, mid, Rgb8::WHITE];
    assert_eq!(gradient(&stops, 0.5), mid);
    assert_eq!(gradient(&stops, 0.25), Rgb8::new(100, 0, 0));
}

#[test]
fn out_of_range_brightness_is_clamped() {
    let lut = ColorLut::new(&[Rgb8::BLACK, Rgb8::WHITE]);
    assert_eq!(lut.get(-1.0), Rgb8::BLACK);
    assert_eq!(lut.get(4.0), Rgb8::WHITE);
    assert_eq!(lut.get(f64::NAN), Rgb8::BLACK);
}
