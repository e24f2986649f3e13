//! Square and dot rasterization onto straight-alpha RGBA canvases.

use image::RgbaImage;

use crate::foundation::core::{Background, Rgb8};
use crate::foundation::math::blend_over;

pub fn fill_background(img: &mut RgbaImage, background: Background) {
    let px = image::Rgba(background.to_rgba());
    for p in img.pixels_mut() {
        *p = px;
    }
}

fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgb8, alpha: f64) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    let p = img.get_pixel_mut(x as u32, y as u32);
    p.0 = blend_over(p.0, [color.r, color.g, color.b], alpha);
}

/// Axis-aligned square covering every pixel whose center lies inside it.
pub fn fill_rect(img: &mut RgbaImage, x: f64, y: f64, size: f64, color: Rgb8, alpha: f64) {
    if !(alpha > 0.0) || !(size > 0.0) || !x.is_finite() || !y.is_finite() {
        return;
    }
    let x0 = (x - 0.5).ceil() as i64;
    let x1 = (x + size - 0.5).ceil() as i64;
    let y0 = (y - 0.5).ceil() as i64;
    let y1 = (y + size - 0.5).ceil() as i64;
    let w = i64::from(img.width());
    let h = i64::from(img.height());
    for py in y0.max(0)..y1.min(h) {
        for px in x0.max(0)..x1.min(w) {
            put(img, px, py, color, alpha);
        }
    }
}

/// Filled circle. The pixel under the center is always covered.
pub fn fill_circle(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgb8, alpha: f64) {
    if !(alpha > 0.0) || !cx.is_finite() || !cy.is_finite() {
        return;
    }
    let r = radius.max(0.0);
    let r2 = r * r;
    let center = (cx.floor() as i64, cy.floor() as i64);
    let x0 = (cx - r).floor() as i64;
    let x1 = (cx + r).ceil() as i64;
    let y0 = (cy - r).floor() as i64;
    let y1 = (cy + r).ceil() as i64;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let dx = px as f64 + 0.5 - cx;
            let dy = py as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 || (px, py) == center {
                put(img, px, py, color, alpha);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/paint.rs"]
mod tests;
