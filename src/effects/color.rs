use crate::foundation::core::Rgb8;

/// 256-entry brightness -> color table built from evenly spaced color stops.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorLut {
    table: Box<[Rgb8; 256]>,
}

impl ColorLut {
    pub fn new(stops: &[Rgb8]) -> Self {
        let mut table = Box::new([Rgb8::BLACK; 256]);
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = gradient(stops, i as f64 / 255.0);
        }
        Self { table }
    }

    /// Color for a brightness in `[0, 1]`, quantized to the nearest table entry.
    pub fn get(&self, brightness: f64) -> Rgb8 {
        let b = if brightness.is_nan() {
            0.0
        } else {
            brightness.clamp(0.0, 1.0)
        };
        self.table[(b * 255.0).round() as usize]
    }
}

impl Default for ColorLut {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Piecewise-linear gradient; no stops yields black, one stop a flat color.
pub fn gradient(stops: &[Rgb8], brightness: f64) -> Rgb8 {
    match stops {
        [] => Rgb8::BLACK,
        [only] => *only,
        _ => {
            let scaled = brightness.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
            let lower = (scaled.floor() as usize).min(stops.len() - 1);
            let upper = (lower + 1).min(stops.len() - 1);
            stops[lower].lerp(stops[upper], scaled - lower as f64)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/color.rs"]
mod tests;
