use image::RgbaImage;

use crate::effects::color::ColorLut;
use crate::effects::options::{DitherAlgorithm, EffectOptions};
use crate::effects::paint::{fill_background, fill_circle, fill_rect};
use crate::foundation::core::{Background, Rgb8};

pub const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

pub const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Perceptual brightness in `[0, 1]`.
pub fn brightness(r: u8, g: u8, b: u8) -> f64 {
    (0.3 * f64::from(r) + 0.59 * f64::from(g) + 0.11 * f64::from(b)) / 255.0
}

/// Ordered-dither threshold at grid cell `(x, y)`, in `[0, 1)`.
pub fn threshold(algorithm: DitherAlgorithm, x: u32, y: u32) -> f64 {
    match algorithm {
        DitherAlgorithm::Bayer4x4 => f64::from(BAYER_4X4[(y % 4) as usize][(x % 4) as usize]) / 16.0,
        DitherAlgorithm::Bayer8x8 => f64::from(BAYER_8X8[(y % 8) as usize][(x % 8) as usize]) / 64.0,
        DitherAlgorithm::VariableDot => 0.5,
    }
}

/// Variable-dot radius: brighter pixels get smaller dots.
pub fn dot_radius(pixel_size: u32, brightness: f64) -> f64 {
    let ps = f64::from(pixel_size);
    (ps * 0.12).max(ps * 0.5 * (1.0 - brightness))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DotShape {
    Square,
    Dot { radius: f64 },
}

/// Drawing decision for one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelDraw {
    /// Brightness after inversion.
    pub brightness: f64,
    pub color: Rgb8,
    pub shape: DotShape,
}

/// Turns a low-resolution sample buffer into dithered squares or dots.
#[derive(Clone, Debug)]
pub struct DitherEngine {
    lut: ColorLut,
    algorithm: DitherAlgorithm,
    invert: bool,
    min_brightness: f64,
    pixel_size: u32,
}

impl DitherEngine {
    pub fn new(options: &EffectOptions) -> Self {
        Self {
            lut: ColorLut::new(&options.colors),
            algorithm: options.dither,
            invert: options.invert,
            min_brightness: options.min_brightness,
            pixel_size: options.pixel_size.max(1),
        }
    }

    /// Pick up new options; the color table is only rebuilt when asked.
    pub fn configure(&mut self, options: &EffectOptions, rebuild_lut: bool) {
        if rebuild_lut {
            self.lut = ColorLut::new(&options.colors);
        }
        self.algorithm = options.dither;
        self.invert = options.invert;
        self.min_brightness = options.min_brightness;
        self.pixel_size = options.pixel_size.max(1);
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn color_for(&self, brightness: f64) -> Rgb8 {
        self.lut.get(brightness)
    }

    /// Brightness after inversion, or `None` for transparent or too-dark samples.
    pub fn adjusted_brightness(&self, px: [u8; 4]) -> Option<f64> {
        let b = brightness(px[0], px[1], px[2]);
        if px[3] == 0 || b < self.min_brightness {
            return None;
        }
        Some(if self.invert { 1.0 - b } else { b })
    }

    pub fn should_draw(&self, adjusted: f64, x: u32, y: u32) -> bool {
        match self.algorithm {
            DitherAlgorithm::VariableDot => adjusted > self.min_brightness,
            algo => adjusted > threshold(algo, x, y),
        }
    }

    pub fn shape(&self, adjusted: f64) -> DotShape {
        match self.algorithm {
            DitherAlgorithm::VariableDot => DotShape::Dot {
                radius: dot_radius(self.pixel_size, adjusted),
            },
            _ => DotShape::Square,
        }
    }

    pub fn classify(&self, px: [u8; 4], x: u32, y: u32) -> Option<PixelDraw> {
        let b = self.adjusted_brightness(px)?;
        if !self.should_draw(b, x, y) {
            return None;
        }
        Some(PixelDraw {
            brightness: b,
            color: self.lut.get(b),
            shape: self.shape(b),
        })
    }

    /// Paint one cell whose top-left corner is at `(x, y)` in canvas pixels.
    pub fn draw(&self, out: &mut RgbaImage, x: f64, y: f64, draw: &PixelDraw, alpha: f64) {
        let ps = f64::from(self.pixel_size);
        match draw.shape {
            DotShape::Square => fill_rect(out, x, y, ps, draw.color, alpha),
            DotShape::Dot { radius } => {
                fill_circle(out, x + ps / 2.0, y + ps / 2.0, radius, draw.color, alpha)
            }
        }
    }

    /// Draw every qualifying cell of `sample` at full opacity.
    pub fn draw_static(&self, sample: &RgbaImage, out: &mut RgbaImage) {
        let ps = f64::from(self.pixel_size);
        for (x, y, px) in sample.enumerate_pixels() {
            if let Some(d) = self.classify(px.0, x, y) {
                self.draw(out, f64::from(x) * ps, f64::from(y) * ps, &d, 1.0);
            }
        }
    }

    /// Clear or fill the background, then draw the static dithered image.
    pub fn render(&self, sample: &RgbaImage, out: &mut RgbaImage, background: Background) {
        fill_background(out, background);
        self.draw_static(sample, out);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/dither.rs"]
mod tests;
