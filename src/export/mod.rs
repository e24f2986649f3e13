//! Loop capture and export sinks.
//!
//! Exporters pause the live loop, render every frame through the seek axis and stream
//! the frames into a [`sink::FrameSink`].

/// Frame scheduling, cancellation and the capture driver.
pub mod capture;
/// `ffmpeg`-based sinks (MP4, WebM and APNG via system `ffmpeg`).
pub mod ffmpeg;
/// Looping GIF sink.
pub mod gif;
/// Lottie JSON sink.
pub mod lottie;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
/// Sprite sheet and CSS keyframe sinks.
pub mod sprite;
