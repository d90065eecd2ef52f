pub mod components;
#[cfg(feature = "physics_avian")]
pub mod physics_systems_avian;
pub mod plugin;

pub mod prelude {
    pub use crate::components::RagdollPlayer;
    pub use crate::plugin::{RagdollAnimatorPlugin, RagdollAnimatorSet};
    pub use bevy_ragdoll_animator_core::prelude::*;
}
