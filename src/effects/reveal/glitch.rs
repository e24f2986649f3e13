use super::{RevealVariant, VisiblePixel};
use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::GridLayout;
use crate::foundation::math::noise01;

const NOISE_SEED: u64 = 0;

/// Hard per-pixel flips in seeded random order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Glitch;

impl RevealVariant for Glitch {
    fn kind(&self) -> FadeVariantKind {
        FadeVariantKind::Glitch
    }

    fn init_metadata(&self, particles: &mut [Particle], _layout: &GridLayout) {
        for p in particles {
            p.reveal_key = noise01(NOISE_SEED, u64::from(p.index));
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
        out.extend(
            particles
                .iter()
                .filter(|p| match direction {
                    FadeDirection::In => p.reveal_key < progress,
                    FadeDirection::Out => p.reveal_key >= progress,
                })
                .map(|p| VisiblePixel::at_rest(p, 1.0)),
        );
    }
}
