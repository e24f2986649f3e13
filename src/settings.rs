//! Persisted project configuration.
//!
//! The on-disk shape is a flat JSON object using the camelCase field names of the
//! effect and motion patches, plus `lightDirection` and `baseRotation`. Loading is
//! lenient: values are coerced where possible and anything else is ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::motion::MotionOptionsPatch;
use crate::effects::options::EffectOptionsPatch;
use crate::foundation::core::{LightDirection, Orientation, lenient};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::scene::manager::SceneManager;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    #[serde(flatten)]
    pub effect: EffectOptionsPatch,
    #[serde(flatten)]
    pub motion: MotionOptionsPatch,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub light_direction: Option<LightDirection>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub base_rotation: Option<Orientation>,
}

impl ProjectSettings {
    pub fn from_json(json: &str) -> ForgeResult<Self> {
        serde_json::from_str(json).map_err(|e| ForgeError::serde(e.to_string()))
    }

    pub fn to_json(&self) -> ForgeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ForgeError::serde(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ForgeResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ForgeResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Snapshot of everything configurable on `manager`.
    pub fn from_state(manager: &SceneManager) -> Self {
        Self {
            effect: EffectOptionsPatch::from(manager.effect_options()),
            motion: MotionOptionsPatch::from(manager.motion_options()),
            light_direction: Some(manager.light_direction()),
            base_rotation: Some(manager.base_orientation()),
        }
    }

    /// Push every present field into `manager`. Missing fields keep their current value.
    pub fn apply_to(&self, manager: &mut SceneManager) {
        manager.update_effect_options(&self.effect);
        manager.update_motion_options(&self.motion);
        if let Some(light) = self.light_direction {
            manager.set_light_direction(light);
        }
        if let Some(base) = self.base_rotation {
            manager.set_base_orientation(base);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/settings.rs"]
mod tests;
