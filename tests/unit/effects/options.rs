use super::*;
use serde_json::json;

#[test]
fn defaults_follow_the_stock_palette() {
    let o = EffectOptions::default();
    assert_eq!(o.pixel_size, 3);
    assert_eq!(o.dither, DitherAlgorithm::Bayer4x4);
    assert_eq!(o.colors.len(), 4);
    assert_eq!(o.colors[0].to_hex(), "#074434");
    assert_eq!(o.background, Background::Transparent);
    assert_eq!(o.fade_ms, 2500.0);
}

#[test]
fn dither_keys_use_persisted_spelling() {
    let d: DitherAlgorithm = serde_json::from_value(json!("variableDot")).unwrap();
    assert_eq!(d, DitherAlgorithm::VariableDot);
    assert_eq!(
        serde_json::to_value(DitherAlgorithm::Bayer8x8).unwrap(),
        json!("bayer8x8")
    );
}

#[test]
fn fade_variant_parse_accepts_aliases() {
    assert_eq!(
        FadeVariantKind::parse(" Cascade ").unwrap(),
        FadeVariantKind::Cascade
    );
    assert_eq!(
        FadeVariantKind::parse("circle").unwrap(),
        FadeVariantKind::Radial
    );
    assert!(FadeVariantKind::parse("dissolve").is_err());
    assert!(FadeVariantKind::parse("").is_err());
    for kind in FadeVariantKind::ALL {
        assert_eq!(FadeVariantKind::parse(kind.key()).unwrap(), kind);
    }
}

#[test]
fn patch_clamps_and_reports_changes() {
    let patch: EffectOptionsPatch = serde_json::from_value(json!({
        "pixelSize": "200",
        "ditherType": "sparkle",
        "colors": ["#000", "#fff"],
        "minBrightness": 3.5,
        "backgroundColor": "#101010",
        "animationDuration": 0,
        "fadeVariant": "glitch"
    }))
    .unwrap();

    let mut o = EffectOptions::default();
    let changes = o.apply(&patch);
    assert_eq!(o.pixel_size, MAX_PIXEL_SIZE);
    assert_eq!(o.dither, DitherAlgorithm::Bayer4x4);
    assert_eq!(o.colors, vec![Rgb8::BLACK, Rgb8::WHITE]);
    assert_eq!(o.min_brightness, 1.0);
    assert_eq!(o.fade_ms, 1.0);
    assert_eq!(o.fade_variant, FadeVariantKind::Glitch);
    assert!(changes.pixel_size);
    assert!(changes.palette);
    assert!(changes.dither);
    assert!(changes.background);
    assert!(changes.fade_variant);
    assert!(changes.timing);
}

#[test]
fn unchanged_values_report_no_change() {
    let mut o = EffectOptions::default();
    let patch = EffectOptionsPatch::from(&o.clone());
    let changes = o.apply(&patch);
    assert!(!changes.any());
}

#[test]
fn color_stops_are_capped() {
    let colors: Vec<String> = (0..40).map(|i| format!("#{i:02x}0000")).collect();
    let patch: EffectOptionsPatch =
        serde_json::from_value(json!({ "colors": colors })).unwrap();
    let mut o = EffectOptions::default();
    o.apply(&patch);
    assert_eq!(o.colors.len(), MAX_COLOR_STOPS);
}

#[test]
fn stepped_alpha_snaps_levels() {
    let m = AlphaMode::from_steps(4);
    assert_eq!(m, AlphaMode::Stepped(4));
    assert_eq!(m.quantize(0.3), 0.25);
    assert_eq!(m.quantize(0.9), 1.0);
    assert_eq!(AlphaMode::Continuous.quantize(0.3), 0.3);
    assert_eq!(AlphaMode::from_steps(0), AlphaMode::Continuous);
}
