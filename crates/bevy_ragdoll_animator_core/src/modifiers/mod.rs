//! Strategy-list extension points consulted by the simulation loop. Modifiers
//! are registered explicitly, in order, on the animator; the core loop works
//! with zero registered modifiers.

pub mod collision_softening;
pub mod limb_position;
pub mod power_on;

pub use collision_softening::CollisionSoftening;
pub use limb_position::LimbPositionOverride;
pub use power_on::PowerOnTransitioner;

use crate::{pairs::AnimatedPair, power::PowerSetting, profile::BoneProfile};

/// Adjusts the resolved [`BoneProfile`] of a bone right before matching forces
/// are computed for it. May scale or zero the alpha and damping fields.
pub trait BoneProfileModifier: Send + Sync {
    /// Called once, after correspondence is built, before the first tick.
    fn initialize(&mut self, pairs: &[AnimatedPair]) {
        let _ = pairs;
    }

    fn modify(&mut self, profile: &mut BoneProfile, pair: &AnimatedPair, dt: f32);

    /// Explicit observer for power-setting changes on a bone.
    fn power_setting_changed(
        &mut self,
        pair: &AnimatedPair,
        previous: PowerSetting,
        new: PowerSetting,
    ) {
        let _ = (pair, previous, new);
    }
}

/// Adjusts the sampled target pose right before matching is done. Receives the
/// full pair list and may overwrite any pair's current pose.
pub trait TargetPoseModifier: Send + Sync {
    /// Called once, after correspondence is built, before the first tick.
    fn initialize(&mut self, pairs: &[AnimatedPair]) {
        let _ = pairs;
    }

    fn modify_pose(&mut self, pairs: &mut [AnimatedPair], dt: f32);
}
