use super::{RevealVariant, VisiblePixel, push_if_visible, soft_ramp};
use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::GridLayout;

const SOFTNESS: f64 = 0.18;

/// Bright pixels light up first and go out first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bloom;

impl RevealVariant for Bloom {
    fn kind(&self) -> FadeVariantKind {
        FadeVariantKind::Bloom
    }

    fn init_metadata(&self, particles: &mut [Particle], _layout: &GridLayout) {
        for p in particles {
            p.reveal_key = 1.0 - p.brightness;
        }
    }

    fn visible_pixels(
        &self,
        particles: &[Particle],
        _layout: &GridLayout,
        progress: f64,
        direction: FadeDirection,
        _ease: Ease,
        out: &mut Vec<VisiblePixel>,
    ) {
        for p in particles {
            let front = match direction {
                FadeDirection::In => progress - p.reveal_key + SOFTNESS,
                FadeDirection::Out => p.reveal_key - progress + SOFTNESS,
            };
            push_if_visible(out, p, soft_ramp(front, SOFTNESS));
        }
    }
}
