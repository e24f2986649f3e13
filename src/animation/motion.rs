use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::animation::ease::Ease;
use crate::animation::timeline::{LoopModel, MIN_SPEED};
use crate::foundation::core::{Orientation, lenient};
use crate::foundation::math::wrap_angle;

/// Duration of the ease back to rest after an effect is switched off.
pub const RETURN_DURATION_S: f64 = 0.4;

/// Float oscillation on X: amplitude (rad) and angular frequency (rad/s).
const FLOAT_X: (f64, f64) = (0.15, 0.5);
/// Float oscillation on Z.
const FLOAT_Z: (f64, f64) = (0.08, 0.3);

/// Independently toggled motion effects. Spins and float share axes and sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotionEffects {
    pub spin_x: bool,
    pub spin_y: bool,
    pub spin_z: bool,
    pub float: bool,
}

impl Default for MotionEffects {
    fn default() -> Self {
        Self {
            spin_x: false,
            spin_y: true,
            spin_z: false,
            float: false,
        }
    }
}

impl MotionEffects {
    pub const NONE: Self = Self {
        spin_x: false,
        spin_y: false,
        spin_z: false,
        float: false,
    };

    fn spin(&self) -> [bool; 3] {
        [self.spin_x, self.spin_y, self.spin_z]
    }

    pub fn apply(&mut self, patch: &MotionEffectsPatch) {
        if let Some(v) = patch.spin_x {
            self.spin_x = v;
        }
        if let Some(v) = patch.spin_y {
            self.spin_y = v;
        }
        if let Some(v) = patch.spin_z {
            self.spin_z = v;
        }
        if let Some(v) = patch.float {
            self.float = v;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionEffectsPatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub spin_x: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub spin_y: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub spin_z: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub float: Option<bool>,
}

impl From<MotionEffects> for MotionEffectsPatch {
    fn from(e: MotionEffects) -> Self {
        Self {
            spin_x: Some(e.spin_x),
            spin_y: Some(e.spin_y),
            spin_z: Some(e.spin_z),
            float: Some(e.float),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionOptions {
    pub use_fade: bool,
    pub effects: MotionEffects,
    /// Angular speed in rad/s, never below [`MIN_SPEED`].
    pub speed: f64,
    pub show_ms: f64,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            use_fade: true,
            effects: MotionEffects::default(),
            speed: 0.36,
            show_ms: 20000.0,
        }
    }
}

impl MotionOptions {
    /// Loop timing for these options with the given fade duration.
    pub fn loop_model(&self, fade_ms: f64) -> LoopModel {
        LoopModel {
            use_fade: self.use_fade,
            fade_ms,
            show_ms: self.show_ms,
            speed: self.speed,
        }
    }

    pub fn apply(&mut self, patch: &MotionOptionsPatch) {
        if let Some(v) = patch.use_fade_in_out {
            self.use_fade = v;
        }
        if let Some(effects) = &patch.animation_effects {
            self.effects.apply(effects);
        }
        if let Some(v) = patch.animation_speed.filter(|v| v.is_finite()) {
            self.speed = v.max(MIN_SPEED);
        }
        if let Some(v) = patch.show_phase_duration.filter(|v| v.is_finite()) {
            self.show_ms = v.max(0.0);
        }
    }
}

/// Partial motion update using the persisted field names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionOptionsPatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub use_fade_in_out: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub animation_effects: Option<MotionEffectsPatch>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub show_phase_duration: Option<f64>,
}

impl From<&MotionOptions> for MotionOptionsPatch {
    fn from(o: &MotionOptions) -> Self {
        Self {
            use_fade_in_out: Some(o.use_fade),
            animation_effects: Some(o.effects.into()),
            animation_speed: Some(o.speed),
            show_phase_duration: Some(o.show_ms),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Return {
    from: f64,
    elapsed_s: f64,
}

/// One additive contribution to an axis, with its own ease back to rest.
#[derive(Clone, Copy, Debug, Default)]
struct Channel {
    value: f64,
    ret: Option<Return>,
}

impl Channel {
    fn begin_return(&mut self, wrap: bool) {
        let from = if wrap {
            wrap_angle(self.value)
        } else {
            self.value
        };
        self.value = from;
        self.ret = (from != 0.0).then_some(Return {
            from,
            elapsed_s: 0.0,
        });
    }

    fn step_return(&mut self, delta_s: f64) {
        let Some(ret) = self.ret.as_mut() else {
            return;
        };
        ret.elapsed_s += delta_s;
        let t = ret.elapsed_s / RETURN_DURATION_S;
        if t >= 1.0 {
            self.value = 0.0;
            self.ret = None;
        } else {
            self.value = ret.from * (1.0 - Ease::OutCubic.apply(t));
        }
    }

    fn toggle(&mut self, was: bool, now: bool, wrap: bool) {
        if was && !now {
            self.begin_return(wrap);
        } else if now {
            // Resume from wherever an interrupted return left the axis.
            self.ret = None;
        }
    }
}

/// Model orientation driven by the active [`MotionEffects`].
///
/// The live path integrates per step; the seek path evaluates the closed form. Both
/// use the same motion time, so a live run from zero telescopes onto the seek value.
#[derive(Clone, Debug)]
pub struct MotionController {
    effects: MotionEffects,
    speed: f64,
    time_s: f64,
    spin: [Channel; 3],
    float_x: Channel,
    float_z: Channel,
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new(MotionEffects::default(), 0.36)
    }
}

impl MotionController {
    pub fn new(effects: MotionEffects, speed: f64) -> Self {
        let mut c = Self {
            effects,
            speed: MIN_SPEED,
            time_s: 0.0,
            spin: [Channel::default(); 3],
            float_x: Channel::default(),
            float_z: Channel::default(),
        };
        c.set_speed(speed);
        c
    }

    pub fn effects(&self) -> MotionEffects {
        self.effects
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed.max(MIN_SPEED);
        }
    }

    /// Switch effects. Disabled axes ease back to zero during live playback.
    pub fn set_effects(&mut self, effects: MotionEffects) {
        let was = self.effects;
        for (axis, channel) in self.spin.iter_mut().enumerate() {
            channel.toggle(was.spin()[axis], effects.spin()[axis], true);
        }
        self.float_x.toggle(was.float, effects.float, false);
        self.float_z.toggle(was.float, effects.float, false);
        self.effects = effects;
    }

    pub fn reset(&mut self) {
        self.time_s = 0.0;
        self.spin = [Channel::default(); 3];
        self.float_x = Channel::default();
        self.float_z = Channel::default();
    }

    pub fn is_returning(&self) -> bool {
        self.spin.iter().any(|c| c.ret.is_some())
            || self.float_x.ret.is_some()
            || self.float_z.ret.is_some()
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::new(
            self.spin[0].value + self.float_x.value,
            self.spin[1].value,
            self.spin[2].value + self.float_z.value,
        )
    }

    /// Live step. `delta_s` is wall time (drives returns); `motion_s` is the share of it
    /// that counts as motion time.
    pub fn apply_live(&mut self, orientation: &mut Orientation, delta_s: f64, motion_s: f64) {
        let delta_s = if delta_s.is_finite() { delta_s.max(0.0) } else { 0.0 };
        let motion_s = if motion_s.is_finite() { motion_s.max(0.0) } else { 0.0 };

        let spin = self.effects.spin();
        for (axis, channel) in self.spin.iter_mut().enumerate() {
            if spin[axis] {
                channel.value += self.speed * motion_s;
            } else {
                channel.step_return(delta_s);
            }
        }

        let t0 = self.time_s;
        let t1 = t0 + motion_s;
        self.time_s = t1;
        if self.effects.float {
            let (ax, wx) = FLOAT_X;
            let (az, wz) = FLOAT_Z;
            self.float_x.value += ax * ((wx * t1).sin() - (wx * t0).sin());
            self.float_z.value += az * ((wz * t1).sin() - (wz * t0).sin());
        } else {
            self.float_x.step_return(delta_s);
            self.float_z.step_return(delta_s);
        }

        *orientation = self.orientation();
    }

    /// Closed-form orientation at `abs_ms`. Returns are ignored; the live state is untouched.
    pub fn apply_seek(&self, orientation: &mut Orientation, abs_ms: f64, timing: &LoopModel) {
        *orientation = self.orientation_at(abs_ms, timing);
    }

    pub fn orientation_at(&self, abs_ms: f64, timing: &LoopModel) -> Orientation {
        let t = timing.motion_time_s(abs_ms);
        let angle = timing.speed() * t;
        let spin = self.effects.spin();
        let pick = |on: bool| if on { angle } else { 0.0 };
        let (mut fx, mut fz) = (0.0, 0.0);
        if self.effects.float {
            let (ax, wx) = FLOAT_X;
            let (az, wz) = FLOAT_Z;
            fx = ax * (wx * t).sin();
            fz = az * (wz * t).sin();
        }
        Orientation::new(pick(spin[0]) + fx, pick(spin[1]), pick(spin[2]) + fz)
    }

    /// Orientation at `cycle` in `[0, 1)` of a closed short loop: each active spin makes one
    /// full turn and each float axis one full oscillation.
    pub fn orientation_in_cycle(&self, cycle: f64) -> Orientation {
        let phase = TAU * cycle;
        let spin = self.effects.spin();
        let pick = |on: bool| if on { phase } else { 0.0 };
        let (mut fx, mut fz) = (0.0, 0.0);
        if self.effects.float {
            fx = FLOAT_X.0 * phase.sin();
            fz = FLOAT_Z.0 * phase.sin();
        }
        Orientation::new(pick(spin[0]) + fx, pick(spin[1]), pick(spin[2]) + fz)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/motion.rs"]
mod tests;
