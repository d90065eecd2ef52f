pub mod animator;
pub mod definition;
pub mod errors;
pub mod id;
pub mod mapping;
pub mod matching;
pub mod modifiers;
pub mod pairs;
pub mod power;
pub mod profile;
pub mod target_skeleton;
pub mod transition;

pub mod prelude {
    pub use crate::animator::{BodyState, BoneCommand, RagdollAnimator};
    pub use crate::definition::{BoneBinding, RagdollBindings, RagdollDefinition};
    pub use crate::errors::RagdollError;
    pub use crate::id::BoneName;
    pub use crate::matching::JointDrive;
    pub use crate::modifiers::{
        BoneProfileModifier, CollisionSoftening, LimbPositionOverride, PowerOnTransitioner,
        TargetPoseModifier,
    };
    pub use crate::pairs::{AnimatedPair, AnimatedPose};
    pub use crate::power::{PowerSetting, RagdollPowerProfile};
    pub use crate::profile::{BoneProfile, RagdollAnimationProfile, ResolvedProfile};
    pub use crate::target_skeleton::{TargetNodeId, TargetSkeleton};
    pub use crate::transition::ValueTransitioner;
}
