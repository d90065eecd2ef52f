pub mod loader;

use bevy::{asset::Asset, math::Quat, platform::collections::HashMap, reflect::Reflect};
use serde::{Deserialize, Serialize};

use crate::{errors::RagdollError, id::BoneName};

/// Defines the set of bones in a ragdoll and which of them is the root.
/// Profiles refer to bones through the names declared here.
#[derive(Asset, Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct RagdollDefinition {
    root: BoneName,
    bones: Vec<BoneName>,
}

impl RagdollDefinition {
    pub fn new<B>(
        root: impl Into<BoneName>,
        bones: impl IntoIterator<Item = B>,
    ) -> Result<Self, RagdollError>
    where
        B: Into<BoneName>,
    {
        let definition = Self {
            root: root.into(),
            bones: bones.into_iter().map(Into::into).collect(),
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Checks that the declared root is one of the bones. Deserialized
    /// definitions must be validated before use.
    pub fn validate(&self) -> Result<(), RagdollError> {
        if !self.contains(&self.root) {
            return Err(RagdollError::RootNotInDefinition(self.root.clone()));
        }
        Ok(())
    }

    pub fn root(&self) -> &BoneName {
        &self.root
    }

    pub fn is_root(&self, bone: &BoneName) -> bool {
        *bone == self.root
    }

    pub fn contains(&self, bone: &BoneName) -> bool {
        self.bones.contains(bone)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> impl Iterator<Item = &BoneName> {
        self.bones.iter()
    }
}

/// How one simulated bone is anchored to the physics backend.
#[derive(Debug, Clone, Copy)]
pub struct BoneBinding {
    /// The joint-local rotation of the bone at initialization time. Target
    /// angular velocities handed to the joint drive are expressed relative to
    /// this frame.
    pub starting_joint_rotation: Quat,
}

/// Read-only map from bone name to its physics anchoring, built once by the
/// embedding before the animator is constructed. Every bone of the definition
/// must be bound.
#[derive(Debug, Clone, Default)]
pub struct RagdollBindings {
    bones: HashMap<BoneName, BoneBinding>,
}

impl RagdollBindings {
    pub fn insert(&mut self, bone: impl Into<BoneName>, binding: BoneBinding) {
        self.bones.insert(bone.into(), binding);
    }

    pub fn get(&self, bone: &BoneName) -> Option<&BoneBinding> {
        self.bones.get(bone)
    }

    pub fn contains(&self, bone: &BoneName) -> bool {
        self.bones.contains_key(bone)
    }

    /// Checks that every bone of `definition` is bound.
    pub fn validate_against(&self, definition: &RagdollDefinition) -> Result<(), RagdollError> {
        for bone in definition.bones() {
            if !self.contains(bone) {
                return Err(RagdollError::MissingBoneBinding(bone.clone()));
            }
        }
        Ok(())
    }
}
