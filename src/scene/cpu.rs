use glam::{Mat4, Vec3, Vec4};
use image::RgbaImage;

use crate::foundation::core::Rgb8;
use crate::foundation::error::ForgeResult;
use crate::scene::backend::{RenderBackend, SceneView};

pub const FOV_Y_DEG: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const EYE: Vec3 = Vec3::new(0.0, 0.5, 5.0);

pub const AMBIENT: f32 = 0.15;
pub const KEY_INTENSITY: f32 = 1.5;
/// Fixed fill and rim lights: position (shining toward the origin) and intensity.
pub const FILL_LIGHT: (Vec3, f32) = (Vec3::new(-4.0, 2.0, 3.0), 0.4);
pub const RIM_LIGHT: (Vec3, f32) = (Vec3::new(0.0, 2.0, -5.0), 0.8);

/// Inside-test tolerance on barycentric weights.
const EDGE_EPS: f32 = -0.0001;

struct ScreenVertex {
    x: f32,
    y: f32,
    /// Clip-space w, i.e. view depth.
    w: f32,
}

/// Flat-shaded software rasterizer with a depth buffer.
///
/// Triangles are double-sided. Output alpha is 255 where the model covers a pixel
/// and the background's alpha elsewhere.
#[derive(Debug, Default)]
pub struct CpuRasterizer {
    width: u32,
    height: u32,
    depth: Vec<f32>,
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn view_projection(&self) -> Mat4 {
        let aspect = self.width.max(1) as f32 / self.height.max(1) as f32;
        let proj = Mat4::perspective_rh_gl(FOV_Y_DEG.to_radians(), aspect, NEAR, FAR);
        let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y);
        proj * view
    }

    fn shade(normal: Vec3, key: Vec3) -> f32 {
        let lights = [(key, KEY_INTENSITY), FILL_LIGHT, RIM_LIGHT];
        let diffuse: f32 = lights
            .iter()
            .map(|&(pos, intensity)| normal.dot(pos.normalize_or_zero()).max(0.0) * intensity)
            .sum();
        (AMBIENT + diffuse).clamp(0.0, 1.0)
    }

    fn to_screen(&self, clip: Vec4) -> ScreenVertex {
        let inv_w = 1.0 / clip.w;
        ScreenVertex {
            x: (clip.x * inv_w + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - clip.y * inv_w) * 0.5 * self.height as f32,
            w: clip.w,
        }
    }

    fn rasterize(&mut self, target: &mut RgbaImage, v: [ScreenVertex; 3], color: [u8; 4]) {
        let [v1, v2, v3] = v;
        let min_x = v1.x.min(v2.x).min(v3.x).max(0.0) as u32;
        let max_x = (v1.x.max(v2.x).max(v3.x) + 1.0).min(self.width as f32) as u32;
        let min_y = v1.y.min(v2.y).min(v3.y).max(0.0) as u32;
        let max_y = (v1.y.max(v2.y).max(v3.y) + 1.0).min(self.height as f32) as u32;
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let area = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
        if area.abs() < 0.00001 {
            return;
        }
        let inv_area = 1.0 / area;
        let (inv_w1, inv_w2, inv_w3) = (1.0 / v1.w, 1.0 / v2.w, 1.0 / v3.w);

        for y in min_y..max_y {
            let py = y as f32 + 0.5;
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let bc_x = ((v2.y - v3.y) * (px - v3.x) + (v3.x - v2.x) * (py - v3.y)) * inv_area;
                let bc_y = ((v3.y - v1.y) * (px - v3.x) + (v1.x - v3.x) * (py - v3.y)) * inv_area;
                let bc_z = 1.0 - bc_x - bc_y;
                if bc_x < EDGE_EPS || bc_y < EDGE_EPS || bc_z < EDGE_EPS {
                    continue;
                }

                // 1/w is linear in screen space.
                let depth = 1.0 / (bc_x * inv_w1 + bc_y * inv_w2 + bc_z * inv_w3);
                let idx = (y * self.width + x) as usize;
                if depth >= self.depth[idx] {
                    continue;
                }
                self.depth[idx] = depth;
                target.put_pixel(x, y, image::Rgba(color));
            }
        }
    }
}

impl RenderBackend for CpuRasterizer {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth = vec![f32::INFINITY; self.width as usize * self.height as usize];
    }

    #[tracing::instrument(level = "trace", skip_all, fields(w = target.width(), h = target.height()))]
    fn render(&mut self, view: &SceneView<'_>, target: &mut RgbaImage) -> ForgeResult<()> {
        if target.width() != self.width || target.height() != self.height {
            self.resize(target.width(), target.height());
        }
        for px in target.pixels_mut() {
            *px = image::Rgba(view.background.to_rgba());
        }
        self.depth.fill(f32::INFINITY);

        let Some(mesh) = view.mesh else {
            return Ok(());
        };

        let model = view.model_matrix();
        let view_proj = self.view_projection();
        let key = view.light.to_vec3();

        let world: Vec<Vec3> = mesh
            .positions
            .iter()
            .map(|&p| model.transform_point3(p))
            .collect();

        for tri in &mesh.triangles {
            let [a, b, c] = tri.map(|i| world[i as usize]);
            let mut normal = (b - a).cross(c - a).normalize_or_zero();
            if normal == Vec3::ZERO {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            if normal.dot(EYE - centroid) < 0.0 {
                normal = -normal;
            }

            let clip = [a, b, c].map(|p| view_proj * p.extend(1.0));
            if clip.iter().any(|c| c.w <= NEAR) {
                continue;
            }

            let base = if mesh.colors.is_empty() {
                Vec3::ONE
            } else {
                let rgb = |c: Rgb8| Vec3::new(f32::from(c.r), f32::from(c.g), f32::from(c.b)) / 255.0;
                tri.iter()
                    .map(|&i| rgb(mesh.colors[i as usize]))
                    .sum::<Vec3>()
                    / 3.0
            };
            let lit = (base * Self::shade(normal, key) * 255.0).round();
            let color = [lit.x as u8, lit.y as u8, lit.z as u8, 255];

            let screen = clip.map(|c| self.to_screen(c));
            self.rasterize(target, screen, color);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.depth = Vec::new();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/cpu.rs"]
mod tests;
