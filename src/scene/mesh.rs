use glam::Vec3;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Edge length of the cube a normalized model fits into.
pub const REFERENCE_SIZE: f32 = 3.0;

/// Indexed triangle mesh with optional per-vertex colors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Empty, or one entry per position.
    pub colors: Vec<Rgb8>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn validate(&self) -> ForgeResult<()> {
        if self.triangles.is_empty() {
            return Err(ForgeError::parse("model contains no triangles"));
        }
        if !self.colors.is_empty() && self.colors.len() != self.positions.len() {
            return Err(ForgeError::parse("vertex color count does not match positions"));
        }
        let n = self.positions.len();
        if let Some(bad) = self
            .triangles
            .iter()
            .flatten()
            .find(|&&i| i as usize >= n)
        {
            return Err(ForgeError::parse(format!(
                "triangle index {bad} out of range ({n} vertices)"
            )));
        }
        if self.positions.iter().any(|p| !p.is_finite()) {
            return Err(ForgeError::parse("non-finite vertex position"));
        }
        Ok(())
    }

    /// Axis-aligned bounds, `None` for a mesh without positions.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Center on the bounding-box center and scale uniformly to [`REFERENCE_SIZE`], so
    /// rotation happens about the model's own center.
    pub fn normalize(&mut self) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let center = (lo + hi) * 0.5;
        let max_dim = (hi - lo).max_element();
        let scale = REFERENCE_SIZE / max_dim.max(1e-6);
        for p in &mut self.positions {
            *p = (*p - center) * scale;
        }
    }

    pub fn rotate_x(&mut self, angle: f32) {
        let m = glam::Mat3::from_rotation_x(angle);
        for p in &mut self.positions {
            *p = m * *p;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/mesh.rs"]
mod tests;
