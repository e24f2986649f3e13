use super::*;
use crate::foundation::core::Background;
use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

#[test]
fn writes_a_looping_animation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out.gif");
    let mut sink = GifSink::new(&path);
    sink.begin(SinkConfig {
        width: 4,
        height: 4,
        fps: 16.0,
        frame_count: 3,
        frame_delay_ms: 80,
        loop_ms: 240.0,
        background: Background::Transparent,
    })
    .unwrap();
    for i in 0..3u8 {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([i * 80, 0, 0, 255]));
        sink.push_frame(u32::from(i), &img).unwrap();
    }
    sink.end().unwrap();

    let file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
    let frames = GifDecoder::new(file)
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap();
    assert_eq!(frames.len(), 3);
    let (numer, denom) = frames[0].delay().numer_denom_ms();
    assert_eq!(numer / denom, 80);
}

#[test]
fn end_without_begin_fails() {
    let mut sink = GifSink::new("unused.gif");
    assert!(sink.end().is_err());
}
