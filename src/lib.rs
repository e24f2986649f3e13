//! BitmapForge renders 3D models through a dithered bitmap effect with seekable reveal
//! animations, and exports seamless loops.
//!
//! The public API centres on [`SceneManager`]:
//!
//! - Load a model ([`ModelFile`], [`ParserRegistry`])
//! - Drive the live preview with [`SceneManager::frame`] / [`SceneManager::tick`]
//! - Render any loop time deterministically with [`SceneManager::render_at_time`]
//! - Stream a whole loop into a [`FrameSink`] with [`export_frames`]
#![forbid(unsafe_code)]

pub mod animation;
pub mod effects;
pub mod export;
pub mod foundation;
pub mod scene;
pub mod settings;

pub use crate::animation::ease::Ease;
pub use crate::animation::motion::{
    MotionController, MotionEffects, MotionEffectsPatch, MotionOptions, MotionOptionsPatch,
};
pub use crate::animation::phase::{FadeDirection, Phase, PhaseClock, PhaseState};
pub use crate::animation::timeline::LoopModel;
pub use crate::effects::bitmap::{BitmapEffect, ParticleSource};
pub use crate::effects::options::{
    AlphaMode, DitherAlgorithm, EffectChanges, EffectOptions, EffectOptionsPatch, FadeVariantKind,
};
pub use crate::effects::reveal::{RevealVariant, VisiblePixel, variant_for};
pub use crate::export::capture::{
    CancelToken, CaptureOptions, ExportSummary, ExportTiming, FrameSource, capture_frames,
    export_frames, frame_count, frame_delay_ms,
};
pub use crate::export::ffmpeg::{FfmpegSink, FfmpegSinkOpts, VideoFormat};
pub use crate::export::gif::GifSink;
pub use crate::export::lottie::LottieSink;
pub use crate::export::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::export::sprite::{CssSink, SpriteSheetSink};
pub use crate::foundation::core::{
    Background, GridLayout, LightDirection, Orientation, Point, Rect, Rgb8, Vec2,
};
pub use crate::foundation::error::{ForgeError, ForgeResult};
pub use crate::scene::backend::{BackendKind, RenderBackend, SceneView, create_backend};
pub use crate::scene::cpu::CpuRasterizer;
pub use crate::scene::loader::{
    GltfParser, ModelFile, ModelParser, ObjParser, ParserRegistry, StlParser,
};
pub use crate::scene::manager::SceneManager;
pub use crate::scene::mesh::Mesh;
pub use crate::settings::ProjectSettings;
