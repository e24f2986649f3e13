use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::foundation::core::{Background, Rgb8, lenient};
use crate::foundation::error::{ForgeError, ForgeResult};

pub const MAX_PIXEL_SIZE: u32 = 64;
pub const MAX_COLOR_STOPS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DitherAlgorithm {
    #[default]
    #[serde(rename = "bayer4x4")]
    Bayer4x4,
    #[serde(rename = "bayer8x8")]
    Bayer8x8,
    #[serde(rename = "variableDot")]
    VariableDot,
}

/// Identifier of a reveal variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FadeVariantKind {
    #[default]
    Bloom,
    Cascade,
    Static,
    Glitch,
    Scanline,
    Radial,
}

impl FadeVariantKind {
    pub const ALL: [Self; 6] = [
        Self::Bloom,
        Self::Cascade,
        Self::Static,
        Self::Glitch,
        Self::Scanline,
        Self::Radial,
    ];

    pub fn parse(key: &str) -> ForgeResult<Self> {
        let key = key.trim().to_ascii_lowercase();
        match key.as_str() {
            "bloom" => Ok(Self::Bloom),
            "cascade" | "rain" => Ok(Self::Cascade),
            "static" | "noise" => Ok(Self::Static),
            "glitch" => Ok(Self::Glitch),
            "scanline" | "scan" | "wipe" => Ok(Self::Scanline),
            "radial" | "circle" => Ok(Self::Radial),
            "" => Err(ForgeError::validation("fade variant must be non-empty")),
            other => Err(ForgeError::validation(format!(
                "unknown fade variant '{other}'"
            ))),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Bloom => "bloom",
            Self::Cascade => "cascade",
            Self::Static => "static",
            Self::Glitch => "glitch",
            Self::Scanline => "scanline",
            Self::Radial => "radial",
        }
    }
}

impl Serialize for FadeVariantKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for FadeVariantKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// How fade alpha is composited: as-is, or snapped to `n` discrete levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaMode {
    #[default]
    Continuous,
    Stepped(u8),
}

impl AlphaMode {
    /// Persisted as a level count; `0` means continuous.
    pub fn from_steps(steps: u32) -> Self {
        match steps {
            0 => Self::Continuous,
            n => Self::Stepped(n.clamp(1, 255) as u8),
        }
    }

    pub fn steps(self) -> u32 {
        match self {
            Self::Continuous => 0,
            Self::Stepped(n) => u32::from(n),
        }
    }

    pub fn quantize(self, alpha: f64) -> f64 {
        let a = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        match self {
            Self::Continuous => a,
            Self::Stepped(n) => {
                let n = f64::from(n.max(1));
                (a * n).round() / n
            }
        }
    }
}

/// Bitmap effect configuration owned by the facade.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectOptions {
    pub pixel_size: u32,
    pub dither: DitherAlgorithm,
    pub colors: Vec<Rgb8>,
    pub background: Background,
    pub invert: bool,
    pub min_brightness: f64,
    /// Duration of each fade phase.
    pub fade_ms: f64,
    pub fade_variant: FadeVariantKind,
    pub alpha_mode: AlphaMode,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            pixel_size: 3,
            dither: DitherAlgorithm::Bayer4x4,
            colors: vec![
                Rgb8::new(0x07, 0x44, 0x34),
                Rgb8::new(0x0a, 0x58, 0x45),
                Rgb8::new(0xab, 0xc6, 0x85),
                Rgb8::new(0xe8, 0xff, 0x99),
            ],
            background: Background::Transparent,
            invert: false,
            min_brightness: 0.05,
            fade_ms: 2500.0,
            fade_variant: FadeVariantKind::Bloom,
            alpha_mode: AlphaMode::Continuous,
        }
    }
}

/// What an [`EffectOptions::apply`] call actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectChanges {
    pub pixel_size: bool,
    pub palette: bool,
    /// Dither algorithm or brightness threshold, i.e. which cells draw and their shape.
    pub dither: bool,
    pub background: bool,
    pub fade_variant: bool,
    pub timing: bool,
}

impl EffectChanges {
    pub fn any(&self) -> bool {
        self.pixel_size || self.palette || self.dither || self.background || self.fade_variant || self.timing
    }
}

impl EffectOptions {
    /// Merge a patch, clamping values into range.
    pub fn apply(&mut self, patch: &EffectOptionsPatch) -> EffectChanges {
        let mut changes = EffectChanges::default();

        if let Some(ps) = patch.pixel_size {
            let ps = ps.clamp(1, MAX_PIXEL_SIZE);
            changes.pixel_size = ps != self.pixel_size;
            self.pixel_size = ps;
        }
        if let Some(d) = patch.dither_type {
            changes.dither |= d != self.dither;
            self.dither = d;
        }
        if let Some(colors) = &patch.colors {
            let colors: Vec<Rgb8> = colors.iter().copied().take(MAX_COLOR_STOPS).collect();
            changes.palette |= colors != self.colors;
            self.colors = colors;
        }
        if let Some(invert) = patch.invert {
            changes.palette |= invert != self.invert;
            self.invert = invert;
        }
        if let Some(v) = patch.min_brightness.filter(|v| v.is_finite()) {
            let v = v.clamp(0.0, 1.0);
            changes.dither |= v != self.min_brightness;
            self.min_brightness = v;
        }
        if let Some(bg) = patch.background_color {
            changes.background = bg != self.background;
            self.background = bg;
        }
        if let Some(v) = patch.animation_duration.filter(|v| v.is_finite()) {
            let v = v.max(1.0);
            changes.timing = v != self.fade_ms;
            self.fade_ms = v;
        }
        if let Some(kind) = patch.fade_variant {
            changes.fade_variant = kind != self.fade_variant;
            self.fade_variant = kind;
        }
        if let Some(steps) = patch.alpha_steps {
            self.alpha_mode = AlphaMode::from_steps(steps);
        }

        changes
    }
}

/// Partial effect update using the persisted field names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectOptionsPatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub dither_type: Option<DitherAlgorithm>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Rgb8>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub min_brightness: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Background>,
    /// Fade phase duration in ms.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub animation_duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fade_variant: Option<FadeVariantKind>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub alpha_steps: Option<u32>,
}

impl From<&EffectOptions> for EffectOptionsPatch {
    fn from(o: &EffectOptions) -> Self {
        Self {
            pixel_size: Some(o.pixel_size),
            dither_type: Some(o.dither),
            colors: Some(o.colors.clone()),
            invert: Some(o.invert),
            min_brightness: Some(o.min_brightness),
            background_color: Some(o.background),
            animation_duration: Some(o.fade_ms),
            fade_variant: Some(o.fade_variant),
            alpha_steps: Some(o.alpha_mode.steps()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/options.rs"]
mod tests;
