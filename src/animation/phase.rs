use crate::animation::timeline::LoopModel;

/// Coarse lifecycle stage of the reveal animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    FadeIn,
    Show,
    FadeOut,
}

impl Phase {
    pub fn next(self) -> Self {
        match self {
            Self::FadeIn => Self::Show,
            Self::Show => Self::FadeOut,
            Self::FadeOut => Self::FadeIn,
        }
    }

    pub fn fade_direction(self) -> Option<FadeDirection> {
        match self {
            Self::FadeIn => Some(FadeDirection::In),
            Self::FadeOut => Some(FadeDirection::Out),
            Self::Show => None,
        }
    }
}

/// Direction of a reveal: assembling (`In`) or disassembling (`Out`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FadeDirection {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseState {
    pub phase: Phase,
    /// Normalized progress in `[0, 1]`; always 1 during `show`.
    pub progress: f64,
}

impl PhaseState {
    pub const SHOW: Self = Self {
        phase: Phase::Show,
        progress: 1.0,
    };

    pub fn new(phase: Phase, progress: f64) -> Self {
        let progress = if phase == Phase::Show {
            1.0
        } else if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        Self { phase, progress }
    }

    pub fn is_fading(&self) -> bool {
        self.phase != Phase::Show
    }
}

/// Result of one live [`PhaseClock::advance`] step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseStep {
    pub state: PhaseState,
    /// Last phase entered during the step, if any boundary was crossed.
    pub entered: Option<Phase>,
    /// Share of the step spent in `show`, in seconds. Drives motion.
    pub motion_s: f64,
}

/// Live phase state machine: fadeIn -> show -> fadeOut -> fadeIn.
///
/// Leftover time is carried across boundaries so that a live clock advanced in any
/// step pattern lands on the same state as [`LoopModel::phase_at`].
#[derive(Clone, Debug)]
pub struct PhaseClock {
    timing: LoopModel,
    phase: Phase,
    elapsed_ms: f64,
}

impl PhaseClock {
    pub fn new(timing: LoopModel) -> Self {
        let mut clock = Self {
            timing,
            phase: Phase::Show,
            elapsed_ms: 0.0,
        };
        clock.reset();
        clock
    }

    pub fn timing(&self) -> &LoopModel {
        &self.timing
    }

    /// Update timing. Toggling fades resets the clock; other changes keep the position.
    pub fn set_timing(&mut self, timing: LoopModel) {
        let toggled = timing.use_fade != self.timing.use_fade;
        self.timing = timing;
        if toggled {
            self.reset();
        }
    }

    /// Back to the loop start: `fadeIn` at 0, or permanent `show` without fades.
    pub fn reset(&mut self) {
        self.phase = if self.timing.use_fade {
            Phase::FadeIn
        } else {
            Phase::Show
        };
        self.elapsed_ms = 0.0;
    }

    /// Restart the current phase from its beginning.
    pub fn restart_phase(&mut self) {
        self.elapsed_ms = 0.0;
    }

    pub fn state(&self) -> PhaseState {
        match self.phase {
            Phase::Show => PhaseState::SHOW,
            fading => PhaseState::new(fading, self.elapsed_ms / self.timing.fade_ms),
        }
    }

    fn phase_len_ms(&self, phase: Phase) -> f64 {
        match phase {
            Phase::FadeIn | Phase::FadeOut => self.timing.fade_ms.max(1.0),
            Phase::Show => self.timing.show_ms.max(0.0),
        }
    }

    pub fn advance(&mut self, delta_s: f64) -> PhaseStep {
        let delta_s = if delta_s.is_finite() {
            delta_s.max(0.0)
        } else {
            0.0
        };

        if !self.timing.use_fade {
            self.phase = Phase::Show;
            self.elapsed_ms += delta_s * 1000.0;
            return PhaseStep {
                state: PhaseState::SHOW,
                entered: None,
                motion_s: delta_s,
            };
        }

        let mut remaining = delta_s * 1000.0;
        let mut show_ms = 0.0;
        let mut entered = None;
        loop {
            let left = (self.phase_len_ms(self.phase) - self.elapsed_ms).max(0.0);
            if remaining < left {
                self.elapsed_ms += remaining;
                if self.phase == Phase::Show {
                    show_ms += remaining;
                }
                break;
            }
            remaining -= left;
            if self.phase == Phase::Show {
                show_ms += left;
            }
            self.phase = self.phase.next();
            self.elapsed_ms = 0.0;
            entered = Some(self.phase);
        }

        PhaseStep {
            state: self.state(),
            entered,
            motion_s: show_ms / 1000.0,
        }
    }

    /// Pure: the state at `abs_ms` within the loop. Never touches the live position.
    pub fn seek_to(&self, abs_ms: f64) -> PhaseState {
        self.timing.phase_at(abs_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/phase.rs"]
mod tests;
