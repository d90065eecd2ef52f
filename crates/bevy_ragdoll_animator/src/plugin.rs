use bevy::{
    app::{App, FixedPostUpdate, Plugin},
    asset::AssetApp,
    ecs::{
        intern::Interned,
        schedule::{IntoScheduleConfigs, ScheduleLabel, SystemSet},
    },
};

use bevy_ragdoll_animator_core::{
    definition::{RagdollDefinition, loader::RagdollDefinitionLoader},
    id::BoneName,
    power::{PowerSetting, RagdollPowerProfile, loader::RagdollPowerProfileLoader},
    profile::{
        BoneProfile, BoneProfileOverride, RagdollAnimationProfile,
        loader::RagdollAnimationProfileLoader,
    },
};

use crate::components::RagdollPlayer;
#[cfg(feature = "physics_avian")]
use crate::physics_systems_avian::{
    initialize_ragdoll_rigs_avian, update_ragdoll_rigidbodies, update_ragdolls_avian,
};

/// Adds ragdoll animation matching to an app. The schedule must be the one
/// the physics update runs in.
pub struct RagdollAnimatorPlugin {
    pub physics_schedule: Interned<dyn ScheduleLabel>,
}

impl Default for RagdollAnimatorPlugin {
    fn default() -> Self {
        Self {
            physics_schedule: FixedPostUpdate.intern(),
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum RagdollAnimatorSet {
    /// Runs in the physics schedule, before the physics update.
    PrePhysics,
    /// Runs in the physics schedule, after the physics update.
    PostPhysics,
}

impl Plugin for RagdollAnimatorPlugin {
    fn build(&self, app: &mut App) {
        self.register_assets(app);
        self.register_types(app);

        app.configure_sets(
            self.physics_schedule,
            (
                RagdollAnimatorSet::PrePhysics,
                RagdollAnimatorSet::PostPhysics,
            )
                .chain(),
        );

        #[cfg(feature = "physics_avian")]
        {
            use avian3d::prelude::PhysicsSystems;

            app.configure_sets(
                self.physics_schedule,
                (
                    RagdollAnimatorSet::PrePhysics.before(PhysicsSystems::First),
                    RagdollAnimatorSet::PostPhysics.after(PhysicsSystems::Last),
                ),
            );

            app.add_systems(
                self.physics_schedule,
                (
                    initialize_ragdoll_rigs_avian,
                    update_ragdoll_rigidbodies,
                    update_ragdolls_avian,
                )
                    .chain()
                    .in_set(RagdollAnimatorSet::PrePhysics),
            );
        }
    }
}

impl RagdollAnimatorPlugin {
    /// Registers asset types and their loaders
    fn register_assets(&self, app: &mut App) {
        app.init_asset::<RagdollDefinition>()
            .init_asset_loader::<RagdollDefinitionLoader>()
            .register_asset_reflect::<RagdollDefinition>();
        app.init_asset::<RagdollAnimationProfile>()
            .init_asset_loader::<RagdollAnimationProfileLoader>()
            .register_asset_reflect::<RagdollAnimationProfile>();
        app.init_asset::<RagdollPowerProfile>()
            .init_asset_loader::<RagdollPowerProfileLoader>()
            .register_asset_reflect::<RagdollPowerProfile>();
    }

    fn register_types(&self, app: &mut App) {
        app //
            .register_type::<RagdollPlayer>()
            .register_type::<BoneName>()
            .register_type::<BoneProfile>()
            .register_type::<BoneProfileOverride>()
            .register_type::<PowerSetting>();
    }
}
