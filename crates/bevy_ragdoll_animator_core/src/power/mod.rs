pub mod loader;

use bevy::{asset::Asset, log::warn, platform::collections::HashMap, reflect::Reflect};
use serde::{Deserialize, Serialize};

use crate::id::BoneName;

/// The possible power settings for a ragdoll bone.
///
/// * `Kinematic`: the bone follows the target pose perfectly, no forces.
/// * `Powered`: spring forces drive the bone toward the target pose.
/// * `Unpowered`: no drive is applied; pure dead-weight dynamics.
#[derive(Reflect, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSetting {
    #[default]
    Kinematic,
    Powered,
    Unpowered,
}

/// Defines the power setting of each bone in the ragdoll.
#[derive(Asset, Reflect, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RagdollPowerProfile {
    pub settings: HashMap<BoneName, PowerSetting>,
}

impl RagdollPowerProfile {
    /// Looks up the setting for a bone. A bone missing from the profile is a
    /// recoverable authoring mistake: it is logged and treated as unpowered
    /// rather than aborting the step.
    pub fn bone_setting(&self, bone: &BoneName) -> PowerSetting {
        match self.settings.get(bone) {
            Some(setting) => *setting,
            None => {
                warn!("requested power setting for {bone:?}, but no entry for it was found");
                PowerSetting::Unpowered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bones_return_their_setting() {
        let mut profile = RagdollPowerProfile::default();
        profile.settings.insert("hips".into(), PowerSetting::Powered);
        assert_eq!(profile.bone_setting(&"hips".into()), PowerSetting::Powered);
    }

    #[test]
    fn missing_bones_fall_back_to_unpowered() {
        let profile = RagdollPowerProfile::default();
        assert_eq!(
            profile.bone_setting(&"absent".into()),
            PowerSetting::Unpowered
        );
    }
}
