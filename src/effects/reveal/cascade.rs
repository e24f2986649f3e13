use super::{RevealVariant, VisiblePixel};
use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::GridLayout;
use crate::foundation::math::{clamp01, noise01};

const COLUMN_SEED: u64 = 1;
const MAX_STAGGER: f64 = 0.4;

/// Columns drop in from above with a seeded stagger and fall out below.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cascade;

impl RevealVariant for Cascade {
    fn kind(&self) -> FadeVariantKind {
        FadeVariantKind::Cascade
    }

    fn init_metadata(&self, particles: &mut [Particle], layout: &GridLayout) {
        let lift = f64::from(layout.canvas_height) + f64::from(layout.pixel_size);
        for p in particles {
            let col = p.col.min(layout.grid_width.saturating_sub(1));
            p.reveal_key = noise01(COLUMN_SEED, u64::from(col)) * MAX_STAGGER;
            p.reveal_aux = p.final_y - lift;
        }
    }

    fn visible_pixels(
        &self,
        particles: &[Particle],
        _layout: &GridLayout,
        progress: f64,
        direction: FadeDirection,
        ease: Ease,
        out: &mut Vec<VisiblePixel>,
    ) {
        for p in particles {
            let delay = p.reveal_key;
            let remaining = 1.0 - delay;
            let local = if remaining <= 0.0 {
                1.0
            } else {
                clamp01((progress - delay) / remaining)
            };
            let t = ease.apply(local);
            let start_y = p.reveal_aux;

            let (y, visible) = match direction {
                FadeDirection::In => ((start_y + (p.final_y - start_y) * t).round(), local > 0.0),
                FadeDirection::Out => {
                    let exit_y = 2.0 * p.final_y - start_y;
                    ((p.final_y + (exit_y - p.final_y) * t).round(), local < 1.0)
                }
            };
            if visible {
                out.push(VisiblePixel {
                    y,
                    ..VisiblePixel::at_rest(p, 1.0)
                });
            }
        }
    }
}
