use super::{RevealVariant, VisiblePixel, push_if_visible, soft_ramp};
use crate::animation::ease::Ease;
use crate::animation::phase::FadeDirection;
use crate::effects::options::FadeVariantKind;
use crate::effects::particles::Particle;
use crate::foundation::core::GridLayout;

/// Feather width of the circle edge, in canvas pixels.
const EDGE_SOFTNESS_PX: f64 = 20.0;

/// A circle that grows from the center on the way in and shrinks back on the way out,
/// so the end of a fade-out meets the start of the next fade-in.
#[derive(Clone, Copy, Debug, Default)]
pub struct Radial;

impl RevealVariant for Radial {
    fn kind(&self) -> FadeVariantKind {
        FadeVariantKind::Radial
    }

    fn init_metadata(&self, particles: &mut [Particle], _layout: &GridLayout) {
        for p in particles {
            p.reveal_key = p.distance_from_center;
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
        let max_dist = layout.max_center_distance();
        let radius = ease.apply(progress) * max_dist;
        for p in particles {
            let front = match direction {
                FadeDirection::In => radius - p.reveal_key + EDGE_SOFTNESS_PX,
                FadeDirection::Out => (max_dist - radius) - p.reveal_key + EDGE_SOFTNESS_PX,
            };
            push_if_visible(out, p, soft_ramp(front, EDGE_SOFTNESS_PX));
        }
    }
}
