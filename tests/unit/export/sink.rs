use super::*;

fn cfg(width: u32, height: u32, frame_count: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: 16.0,
        frame_count,
        frame_delay_ms: 63,
        loop_ms: 1000.0,
        background: Background::Transparent,
    }
}

#[test]
fn in_memory_sink_collects_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2, 2)).unwrap();
    sink.push_frame(0, &RgbaImage::new(2, 2)).unwrap();
    sink.push_frame(1, &RgbaImage::new(2, 2)).unwrap();
    sink.end().unwrap();
    assert!(sink.is_finished());
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.config().unwrap().frame_count, 2);
}

#[test]
fn in_memory_sink_rejects_bad_frames() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(0, &RgbaImage::new(2, 2)).is_err());
    sink.begin(cfg(2, 2, 2)).unwrap();
    assert!(sink.push_frame(0, &RgbaImage::new(3, 2)).is_err());
    assert!(sink.push_frame(1, &RgbaImage::new(2, 2)).is_err());
}

#[test]
fn config_validation() {
    assert!(cfg(0, 2, 1).validate().is_err());
    assert!(cfg(2, 2, 0).validate().is_err());
    let mut c = cfg(2, 2, 1);
    c.fps = 0.0;
    assert!(c.validate().is_err());
}

#[test]
fn flatten_alpha_0_returns_bg() {
    let src = vec![9u8, 9, 9, 0];
    let mut dst = vec![0u8; 4];
    flatten_over(&mut dst, &src, [10, 20, 30]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_over(&mut dst, &src, [10, 20, 30]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_mixes_straight_alpha() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_over(&mut dst, &src, [0, 0, 0]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}
