//! Reveal variants: stateless strategies deciding which particles are visible, and
//! where, at a given fade progress.
//!
//! Every variant is a pure function of `(particles, layout, progress, direction)`.
//! Per-particle randomness is keyed by the particle's grid index.

pub mod bloom;
pub mod cascade;
pub mod glitch;
pub mod radial;
pub mod scanline;
pub mod static_noise;

use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::dither::DotShape;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::{GridLayout, Rgb8};
use crate::foundation::math::clamp01;

/// A particle as it should be drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisiblePixel {
    pub x: f64,
    pub y: f64,
    pub brightness: f64,
    pub color: Rgb8,
    pub shape: DotShape,
    pub alpha: f64,
}

impl VisiblePixel {
    pub(crate) fn at_rest(p: &Particle, alpha: f64) -> Self {
        Self {
            x: p.final_x,
            y: p.final_y,
            brightness: p.brightness,
            color: p.color,
            shape: p.shape,
            alpha,
        }
    }
}

pub trait RevealVariant: Send + Sync {
    fn kind(&self) -> FadeVariantKind;

    /// Attach variant-specific keys to freshly built particles.
    fn init_metadata(&self, particles: &mut [Particle], layout: &GridLayout);

    /// Append every visible particle at `progress` to `out`.
    fn visible_pixels(
        &self,
        particles: &[Particle],
        layout: &GridLayout,
        progress: f64,
        direction: FadeDirection,
        ease: Ease,
        out: &mut Vec<VisiblePixel>,
    );
}

/// Shared threshold ramp used by the alpha-only variants.
pub(crate) fn soft_ramp(front: f64, softness: f64) -> f64 {
    clamp01(front / softness)
}

/// Push `p` at rest when `alpha` is positive.
pub(crate) fn push_if_visible(out: &mut Vec<VisiblePixel>, p: &Particle, alpha: f64) {
    if alpha > 0.0 {
        out.push(VisiblePixel::at_rest(p, alpha));
    }
}

pub fn variant_for(kind: FadeVariantKind) -> &'static dyn RevealVariant {
    match kind {
        FadeVariantKind::Bloom => &bloom::Bloom,
        FadeVariantKind::Cascade => &cascade::Cascade,
        FadeVariantKind::Static => &static_noise::StaticNoise,
        FadeVariantKind::Glitch => &glitch::Glitch,
        FadeVariantKind::Scanline => &scanline::Scanline,
        FadeVariantKind::Radial => &radial::Radial,
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/effects/reveal/mod.rs"]
mod tests;
