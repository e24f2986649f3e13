use super::*;
use crate::foundation::core::Background;

#[test]
fn frames_are_capped_on_the_longer_side() {
    assert_eq!(capped_size(512, 256, 256), (256, 128));
    assert_eq!(capped_size(100, 300, 256), (85, 256));
    assert_eq!(capped_size(200, 100, 256), (200, 100));
}

#[test]
fn size_estimate_grows_with_frames() {
    let one = estimate_size_mb(1, 256, 256);
    assert!((estimate_size_mb(10, 256, 256) - 10.0 * one).abs() < 1e-9);
    assert_eq!(estimate_size_mb(1, 1024, 1024), one);
}

#[test]
fn document_has_one_image_layer_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anim.json");
    let mut sink = LottieSink::new(&path, "anim").with_max_px(4);
    sink.begin(SinkConfig {
        width: 8,
        height: 4,
        fps: 16.0,
        frame_count: 2,
        frame_delay_ms: 63,
        loop_ms: 125.0,
        background: Background::Transparent,
    })
    .unwrap();
    sink.push_frame(0, &RgbaImage::new(8, 4)).unwrap();
    sink.push_frame(1, &RgbaImage::new(8, 4)).unwrap();
    sink.end().unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["v"], "5.9.0");
    assert_eq!(doc["op"], 2);
    assert_eq!((doc["w"].as_u64(), doc["h"].as_u64()), (Some(4), Some(2)));
    let layers = doc["layers"].as_array().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[1]["ip"], 1);
    assert_eq!(layers[1]["op"], 2);
    assert_eq!(layers[1]["refId"], "f1");
    let asset = &doc["assets"][0];
    assert!(
        asset["p"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
}
