use super::*;

#[derive(Default)]
struct FakeSource {
    paused: bool,
    pauses: u32,
    resumes: u32,
    times: Vec<f64>,
    fail_at: Option<usize>,
    cancel_after: Option<(usize, CancelToken)>,
    surface: RgbaImage,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            surface: RgbaImage::new(4, 2),
            ..Default::default()
        }
    }
}

impl FrameSource for FakeSource {
    fn canvas_size(&self) -> (u32, u32) {
        (4, 2)
    }

    fn background(&self) -> Background {
        Background::Transparent
    }

    fn loop_duration_ms(&self, timing: ExportTiming) -> f64 {
        match timing {
            ExportTiming::FullLoop => 2000.0,
            ExportTiming::ShortLoop => 500.0,
        }
    }

    fn render_at(&mut self, abs_ms: f64, _timing: ExportTiming) -> ForgeResult<()> {
        assert!(self.paused, "rendered while the live loop was running");
        if self.fail_at == Some(self.times.len()) {
            return Err(ForgeError::ContextLost);
        }
        self.times.push(abs_ms);
        if let Some((n, token)) = &self.cancel_after
            && self.times.len() == *n
        {
            token.cancel();
        }
        Ok(())
    }

    fn surface(&self) -> ForgeResult<&RgbaImage> {
        Ok(&self.surface)
    }

    fn pause_live(&mut self) {
        self.paused = true;
        self.pauses += 1;
    }

    fn resume_live(&mut self) {
        self.paused = false;
        self.resumes += 1;
    }
}

#[test]
fn frame_count_has_a_floor_of_twelve() {
    assert_eq!(frame_count(25_000.0, 16.0), 400);
    assert_eq!(frame_count(100.0, 16.0), 12);
    assert_eq!(frame_count(f64::NAN, 16.0), 12);
    assert_eq!(frame_delay_ms(2000.0, 12), 167);
    assert_eq!(frame_delay_ms(2000.0, 32), 63);
}

#[test]
fn frames_are_evenly_spaced_over_one_loop() {
    let mut src = FakeSource::new();
    let mut sink = InMemorySink::new();
    let mut seen = Vec::new();
    let summary = export_frames(&mut src, &mut sink, &CaptureOptions::default(), |i, n| {
        seen.push((i, n))
    })
    .unwrap();

    assert_eq!(summary.frame_count, 32);
    assert_eq!(summary.frame_delay_ms, 63);
    assert_eq!(src.times.len(), 32);
    assert_eq!(src.times[0], 0.0);
    assert_eq!(src.times[16], 1000.0);
    assert!(src.times.iter().all(|&t| t < 2000.0));
    assert_eq!(seen.last(), Some(&(32, 32)));
    assert!(sink.is_finished());
    assert_eq!((src.pauses, src.resumes), (1, 1));
    assert!(!src.paused);
}

#[test]
fn short_loop_uses_the_export_duration() {
    let mut src = FakeSource::new();
    let opts = CaptureOptions {
        timing: ExportTiming::ShortLoop,
        ..Default::default()
    };
    let frames = capture_frames(&mut src, &opts).unwrap();
    assert_eq!(frames.len(), 12);
    assert_eq!(src.times[6], 250.0);
}

#[test]
fn cancellation_stops_and_resumes_the_live_loop() {
    let token = CancelToken::new();
    let mut src = FakeSource::new();
    src.cancel_after = Some((3, token.clone()));
    let mut sink = InMemorySink::new();
    let opts = CaptureOptions {
        cancel: Some(token),
        ..Default::default()
    };
    let err = export_frames(&mut src, &mut sink, &opts, |_, _| {}).unwrap_err();
    assert!(matches!(err, ForgeError::Cancelled));
    assert_eq!(src.times.len(), 3);
    assert!(!src.paused);
    assert!(!sink.is_finished());
}

#[test]
fn render_failure_still_resumes() {
    let mut src = FakeSource::new();
    src.fail_at = Some(5);
    let mut sink = InMemorySink::new();
    let err = export_frames(&mut src, &mut sink, &CaptureOptions::default(), |_, _| {});
    assert!(err.unwrap_err().is_context_lost());
    assert!(!src.paused);
    assert_eq!(src.resumes, 1);
}

#[test]
fn invalid_fps_is_rejected_before_pausing() {
    let mut src = FakeSource::new();
    let opts = CaptureOptions {
        fps: 0.0,
        ..Default::default()
    };
    assert!(capture_frames(&mut src, &opts).is_err());
    assert_eq!(src.pauses, 0);
}
