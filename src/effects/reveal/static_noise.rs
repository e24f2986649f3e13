use super::{RevealVariant, VisiblePixel, push_if_visible, soft_ramp};
use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::GridLayout;
use crate::foundation::math::noise01;

const NOISE_SEED: u64 = 2;
const ROW_WEIGHT: f64 = 0.7;
const SOFTNESS: f64 = 0.06;

/// A noisy signal that tunes in from the top down and cuts out from the bottom up.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticNoise;

impl RevealVariant for StaticNoise {
    fn kind(&self) -> FadeVariantKind {
        FadeVariantKind::Static
    }

    fn init_metadata(&self, particles: &mut [Particle], layout: &GridLayout) {
        let rows = layout.grid_height;
        for p in particles {
            let row_norm = if rows > 1 {
                f64::from(p.row) / f64::from(rows - 1)
            } else {
                0.0
            };
            let noise = noise01(NOISE_SEED, u64::from(p.index));
            p.reveal_key = row_norm * ROW_WEIGHT + noise * (1.0 - ROW_WEIGHT);
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
                FadeDirection::Out => (1.0 - progress) - p.reveal_key + SOFTNESS,
            };
            push_if_visible(out, p, soft_ramp(front, SOFTNESS));
        }
    }
}
