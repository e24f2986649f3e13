use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::foundation::math::wrap_angle;

pub use kurbo::{Point, Rect, Vec2};

/// Opaque 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (alpha is ignored). The `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return Err(format!("invalid hex color \"{s}\""));
        }

        fn hex_byte(pair: &str) -> Result<u8, String> {
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
        }

        match s.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in s.chars().enumerate() {
                    let v = hex_byte(&c.to_string())?;
                    out[i] = v * 17;
                }
                Ok(Self::new(out[0], out[1], out[2]))
            }
            6 | 8 => Ok(Self::new(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise linear interpolation, rounded to the nearest integer.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        fn mix(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }
        Self::new(
            mix(self.r, other.r, t),
            mix(self.g, other.g, t),
            mix(self.b, other.b, t),
        )
    }

    pub fn to_rgba(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }
}

impl Serialize for Rgb8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr([u8; 3]),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Self::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr([r, g, b]) => Ok(Self::new(r, g, b)),
        }
    }
}

/// Output background: cleared to transparent or flood-filled with a solid color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Background {
    #[default]
    Transparent,
    Solid(Rgb8),
}

impl Background {
    pub fn solid(self) -> Option<Rgb8> {
        match self {
            Self::Transparent => None,
            Self::Solid(c) => Some(c),
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        match self {
            Self::Transparent => [0, 0, 0, 0],
            Self::Solid(c) => c.to_rgba(255),
        }
    }
}

impl Serialize for Background {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Transparent => serializer.serialize_str("transparent"),
            Self::Solid(c) => c.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Background {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::Transparent);
        }
        Rgb8::from_hex(trimmed)
            .map(Self::Solid)
            .map_err(serde::de::Error::custom)
    }
}

/// Euler rotation in radians, applied in X-Y-Z order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Orientation {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Angles are wrapped before narrowing so long-running spins keep their precision.
    pub fn to_mat4(self) -> glam::Mat4 {
        glam::Mat4::from_euler(
            glam::EulerRot::XYZ,
            wrap_angle(self.x) as f32,
            wrap_angle(self.y) as f32,
            wrap_angle(self.z) as f32,
        )
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn max_abs_diff(self, other: Self) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

/// Position of the key light; it shines toward the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightDirection {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Default for LightDirection {
    fn default() -> Self {
        Self {
            x: 3.0,
            y: 4.0,
            z: 5.0,
        }
    }
}

impl LightDirection {
    pub fn to_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Output canvas size and the low-resolution sampling grid derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub pixel_size: u32,
    pub grid_width: u32,
    pub grid_height: u32,
}

impl GridLayout {
    pub fn new(canvas_width: u32, canvas_height: u32, pixel_size: u32) -> Self {
        let canvas_width = canvas_width.max(1);
        let canvas_height = canvas_height.max(1);
        let pixel_size = pixel_size.max(1);
        Self {
            canvas_width,
            canvas_height,
            pixel_size,
            grid_width: (canvas_width / pixel_size).max(1),
            grid_height: (canvas_height / pixel_size).max(1),
        }
    }

    pub fn cell_count(self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }

    pub fn center(self) -> Point {
        Point::new(
            f64::from(self.canvas_width) / 2.0,
            f64::from(self.canvas_height) / 2.0,
        )
    }

    /// Half of the canvas diagonal.
    pub fn max_center_distance(self) -> f64 {
        let w = f64::from(self.canvas_width);
        let h = f64::from(self.canvas_height);
        (w * w + h * h).sqrt() / 2.0
    }

    pub fn bounds(self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas_width),
            f64::from(self.canvas_height),
        )
    }
}

/// `deserialize_with` helper for persisted settings: coerces strings such as `"4"` or
/// `"true"` and integral floats, and maps anything it cannot coerce to `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce(value))
}

pub(crate) fn coerce<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    if let Ok(v) = serde_json::from_value::<T>(value.clone()) {
        return Some(v);
    }
    match value {
        Value::String(s) => serde_json::from_str::<T>(s.trim()).ok(),
        Value::Number(n) => {
            let f = n.as_f64()?;
            if f.is_finite() && f.fract() == 0.0 {
                serde_json::from_value::<T>(Value::from(f as i64)).ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
