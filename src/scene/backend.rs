use image::RgbaImage;

use crate::foundation::core::{Background, LightDirection, Orientation};
use crate::foundation::error::ForgeResult;
use crate::scene::mesh::Mesh;

/// Everything a backend needs to draw one frame of the 3D scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneView<'a> {
    /// `None` renders an empty scene (background only).
    pub mesh: Option<&'a Mesh>,
    /// User-set base rotation, applied outside the animated rotation.
    pub base: Orientation,
    /// Animated rotation (spin and float).
    pub anim: Orientation,
    pub light: LightDirection,
    pub background: Background,
}

impl SceneView<'_> {
    /// World transform of the model: `R_base * R_anim`.
    pub fn model_matrix(&self) -> glam::Mat4 {
        self.base.to_mat4() * self.anim.to_mat4()
    }
}

/// A renderer that draws a [`SceneView`] into an RGBA8 frame (straight alpha).
///
/// Backends may report [`ForgeError::ContextLost`](crate::ForgeError::ContextLost) when
/// their drawing context goes away; the facade suspends its live loop until restored.
pub trait RenderBackend: Send {
    fn name(&self) -> &'static str;

    /// Called whenever the output canvas changes size.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw `view` into `target`, which is already sized to the canvas.
    fn render(&mut self, view: &SceneView<'_>, target: &mut RgbaImage) -> ForgeResult<()>;

    /// Free backend resources. The backend is not used again afterwards.
    fn release(&mut self) {}
}

/// Available backend kinds.
///
/// - `Cpu` is always available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Software rasterizer with a depth buffer.
    #[default]
    Cpu,
}

/// Create a rendering backend implementation.
pub fn create_backend(kind: BackendKind) -> ForgeResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::scene::cpu::CpuRasterizer::new())),
    }
}
