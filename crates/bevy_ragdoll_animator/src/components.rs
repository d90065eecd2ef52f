use bevy::{asset::prelude::*, ecs::prelude::*, reflect::prelude::*};

use bevy_ragdoll_animator_core::{
    animator::{BodyState, RagdollAnimator},
    definition::RagdollDefinition,
    pairs::AnimatedPose,
    power::RagdollPowerProfile,
    profile::RagdollAnimationProfile,
};

/// Drives one physics ragdoll to match one animated target hierarchy.
///
/// Target and ragdoll bones are matched against the definition's bone names
/// using the entities' [`Name`](bevy::prelude::Name) components. The rig is
/// built lazily once both assets are loaded and both roots are set.
#[derive(Component, Reflect)]
#[reflect(Component)]
pub struct RagdollPlayer {
    pub definition: Handle<RagdollDefinition>,
    pub profile: Handle<RagdollAnimationProfile>,
    pub power_profile: Option<Handle<RagdollPowerProfile>>,

    /// Root of the animated target hierarchy to match.
    pub target_root: Option<Entity>,
    /// Root bone entity of the simulated ragdoll.
    pub ragdoll_root: Option<Entity>,

    /// While disabled, no matching forces are applied and all bones simulate
    /// freely. Re-enabling snaps the ragdoll back onto the target pose.
    pub enabled: bool,

    pub master_alpha: f32,
    pub master_damping_ratio: f32,
    pub profile_transition_length: f32,

    #[reflect(ignore)]
    pub(crate) rig: Option<RagdollRig>,
}

impl Default for RagdollPlayer {
    fn default() -> Self {
        Self {
            definition: Handle::default(),
            profile: Handle::default(),
            power_profile: None,
            target_root: None,
            ragdoll_root: None,
            enabled: true,
            master_alpha: 1.,
            master_damping_ratio: 1.,
            profile_transition_length: 1.,
            rig: None,
        }
    }
}

impl RagdollPlayer {
    pub fn new(
        definition: Handle<RagdollDefinition>,
        profile: Handle<RagdollAnimationProfile>,
        target_root: Entity,
        ragdoll_root: Entity,
    ) -> Self {
        Self {
            definition,
            profile,
            target_root: Some(target_root),
            ragdoll_root: Some(ragdoll_root),
            ..Default::default()
        }
    }

    pub fn with_power_profile(mut self, power_profile: Handle<RagdollPowerProfile>) -> Self {
        self.power_profile = Some(power_profile);
        self
    }

    /// The running animator, once the rig has been built. Use it to change
    /// power settings or register modifiers at runtime.
    pub fn animator(&self) -> Option<&RagdollAnimator> {
        self.rig.as_ref().map(|rig| &rig.animator)
    }

    pub fn animator_mut(&mut self) -> Option<&mut RagdollAnimator> {
        self.rig.as_mut().map(|rig| &mut rig.animator)
    }
}

/// Built once per player when its assets are loaded and both hierarchies
/// have been walked. All vectors are indexed by pair order.
pub(crate) struct RagdollRig {
    pub animator: RagdollAnimator,
    /// Simulated bone entities.
    pub body_entities: Vec<Entity>,
    /// Target bone entities.
    pub target_entities: Vec<Entity>,
    /// Pair index of each bone's parent simulated bone. `None` for the root.
    pub parent_bodies: Vec<Option<usize>>,

    pub applied_power_profile: Option<AssetId<RagdollPowerProfile>>,
    /// Teleport onto the target pose before the next simulated step.
    pub pending_snap: bool,
    pub was_enabled: bool,

    // Scratch buffers reused every step.
    pub poses: Vec<AnimatedPose>,
    pub bodies: Vec<BodyState>,
}
