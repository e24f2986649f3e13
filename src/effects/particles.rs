use image::RgbaImage;

use crate::effects::dither::{DitherEngine, DotShape};
use crate::foundation::core::{GridLayout, Rgb8};

/// One drawn grid cell, tracked through a fade.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Row-major grid index; the seed for all per-particle noise.
    pub index: u32,
    pub col: u32,
    pub row: u32,
    pub final_x: f64,
    pub final_y: f64,
    pub brightness: f64,
    pub color: Rgb8,
    pub shape: DotShape,
    pub distance_from_center: f64,
    /// Threshold assigned by the active reveal variant.
    pub reveal_key: f64,
    /// Secondary per-variant value (e.g. a start offset).
    pub reveal_aux: f64,
}

/// Build the particle set for the sample buffer as it looks right now.
pub fn build_particles(sample: &RgbaImage, engine: &DitherEngine, layout: &GridLayout) -> Vec<Particle> {
    let ps = f64::from(layout.pixel_size);
    let center = layout.center();
    let mut out = Vec::new();

    for (col, row, px) in sample.enumerate_pixels() {
        let Some(draw) = engine.classify(px.0, col, row) else {
            continue;
        };
        let index = row * sample.width() + col;
        let final_x = f64::from(col) * ps;
        let final_y = f64::from(row) * ps;
        let dx = final_x - center.x;
        let dy = final_y - center.y;
        let distance_from_center = (dx * dx + dy * dy).sqrt();

        out.push(Particle {
            index,
            col,
            row,
            final_x,
            final_y,
            brightness: draw.brightness,
            color: draw.color,
            shape: draw.shape,
            distance_from_center,
            reveal_key: 0.0,
            reveal_aux: 0.0,
        });
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/effects/particles.rs"]
mod tests;
