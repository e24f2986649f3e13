use super::{RevealVariant, VisiblePixel, push_if_visible, soft_ramp};
use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::GridLayout;

/// Rows of feathering at the wipe front.
const SOFTNESS_ROWS: f64 = 2.0;

/// A top-to-bottom wipe across grid rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scanline;

impl RevealVariant for Scanline {
    fn kind(&self) -> FadeVariantKind {
        FadeVariantKind::Scanline
    }

    fn init_metadata(&self, particles: &mut [Particle], _layout: &GridLayout) {
        for p in particles {
            p.reveal_key = f64::from(p.row);
        }
    }

    fn visible_pixels(
        &self,
        particles: &[Particle],
        layout: &GridLayout,
        progress: f64,
        direction: FadeDirection,
        ease: Ease,
        out: &mut Vec<VisiblePixel>,
    ) {
        let wipe = ease.apply(progress) * f64::from(layout.grid_height);
        for p in particles {
            let front = match direction {
                FadeDirection::In => wipe - p.reveal_key,
                FadeDirection::Out => p.reveal_key - wipe + SOFTNESS_ROWS,
            };
            push_if_visible(out, p, soft_ramp(front, SOFTNESS_ROWS));
        }
    }
}
