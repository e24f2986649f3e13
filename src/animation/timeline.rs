use std::f64::consts::TAU;

use crate::animation::phase::{Phase, PhaseState};

/// Lowest accepted angular speed, in rad/s.
pub const MIN_SPEED: f64 = 0.01;
/// Upper bound for the fade-free export loop.
pub const EXPORT_LOOP_CAP_MS: f64 = 3000.0;

/// Timing parameters that define one seamless animation loop.
///
/// Everything here is a pure function of time; the live clock and every seek path
/// share these boundaries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopModel {
    pub use_fade: bool,
    pub fade_ms: f64,
    pub show_ms: f64,
    /// Angular speed in rad/s.
    pub speed: f64,
}

impl Default for LoopModel {
    fn default() -> Self {
        Self {
            use_fade: true,
            fade_ms: 2500.0,
            show_ms: 20000.0,
            speed: 0.36,
        }
    }
}

impl LoopModel {
    pub fn speed(&self) -> f64 {
        if self.speed.is_finite() {
            self.speed.max(MIN_SPEED)
        } else {
            MIN_SPEED
        }
    }

    /// Time for one full revolution at the current speed.
    pub fn rotation_period_ms(&self) -> f64 {
        TAU / self.speed() * 1000.0
    }

    pub fn loop_duration_ms(&self) -> f64 {
        if self.use_fade {
            2.0 * self.fade_ms + self.show_ms
        } else {
            self.rotation_period_ms()
        }
    }

    /// Fade-free loop used by short looping exports.
    pub fn export_loop_duration_ms(&self) -> f64 {
        self.rotation_period_ms().min(EXPORT_LOOP_CAP_MS)
    }

    /// Position of `abs_ms` within the short export loop, in `[0, 1)`.
    ///
    /// The short loop always spans exactly one motion cycle, so its last frame wraps onto
    /// its first even when the cap cuts a slow revolution short.
    pub fn export_cycle(&self, abs_ms: f64) -> f64 {
        let len = self.export_loop_duration_ms();
        if !abs_ms.is_finite() || !(len > 0.0) {
            return 0.0;
        }
        let u = abs_ms.rem_euclid(len) / len;
        if u >= 1.0 { 0.0 } else { u }
    }

    /// The same timing with fades switched off.
    pub fn without_fade(self) -> Self {
        Self {
            use_fade: false,
            ..self
        }
    }

    /// Fold an absolute time into `[0, loop)`.
    pub fn fold_ms(&self, abs_ms: f64) -> f64 {
        let len = self.loop_duration_ms();
        if !abs_ms.is_finite() || !(len > 0.0) {
            return 0.0;
        }
        let t = abs_ms.rem_euclid(len);
        // rem_euclid can round up to `len` for tiny negative inputs.
        if t >= len { 0.0 } else { t }
    }

    pub fn phase_at(&self, abs_ms: f64) -> PhaseState {
        if !self.use_fade {
            return PhaseState::SHOW;
        }
        let t = self.fold_ms(abs_ms);
        let fade_in_end = self.fade_ms;
        let show_end = self.fade_ms + self.show_ms;
        if t < fade_in_end {
            PhaseState::new(Phase::FadeIn, t / self.fade_ms)
        } else if t < show_end {
            PhaseState::SHOW
        } else {
            PhaseState::new(Phase::FadeOut, (t - show_end) / self.fade_ms)
        }
    }

    /// Seconds of motion accumulated by `abs_ms`. Motion only runs during `show` when
    /// fading is enabled.
    pub fn motion_time_s(&self, abs_ms: f64) -> f64 {
        let t = self.fold_ms(abs_ms);
        let ms = if self.use_fade {
            (t - self.fade_ms).clamp(0.0, self.show_ms.max(0.0))
        } else {
            t
        };
        ms / 1000.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
