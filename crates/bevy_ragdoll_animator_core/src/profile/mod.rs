pub mod loader;

use bevy::{asset::Asset, platform::collections::HashMap, reflect::Reflect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{definition::RagdollDefinition, errors::RagdollError, id::BoneName};

/// Matching parameters for a single bone. Immutable value type; blending
/// produces a new value.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneProfile {
    pub position_alpha: f32,
    pub position_damping_ratio: f32,
    pub max_linear_acceleration: f32,

    pub rotation_alpha: f32,
    pub rotation_damping_ratio: f32,
    pub max_angular_acceleration: f32,
}

impl BoneProfile {
    pub fn blend(a: BoneProfile, b: BoneProfile, t: f32) -> BoneProfile {
        // Exact endpoints: the sqrt-space alpha blend does not round-trip
        // bit-exactly through sqrt and square.
        if t <= 0. {
            return a;
        }
        if t >= 1. {
            return b;
        }

        BoneProfile {
            position_alpha: blend_alpha(a.position_alpha, b.position_alpha, t),
            position_damping_ratio: lerp(a.position_damping_ratio, b.position_damping_ratio, t),
            max_linear_acceleration: blend_max_acceleration(
                a.max_linear_acceleration,
                b.max_linear_acceleration,
                t,
            ),

            rotation_alpha: blend_alpha(a.rotation_alpha, b.rotation_alpha, t),
            rotation_damping_ratio: lerp(a.rotation_damping_ratio, b.rotation_damping_ratio, t),
            max_angular_acceleration: blend_max_acceleration(
                a.max_angular_acceleration,
                b.max_angular_acceleration,
                t,
            ),
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Alpha maps to spring stiffness, which scales quadratically with a linear
/// gain, so it interpolates evenly in its square-root domain.
fn blend_alpha(a: f32, b: f32, t: f32) -> f32 {
    let blended = lerp(a.sqrt(), b.sqrt(), t);
    blended * blended
}

/// An unclamped (infinite) endpoint dominates the blend.
fn blend_max_acceleration(a: f32, b: f32, t: f32) -> f32 {
    if a.is_infinite() || b.is_infinite() {
        f32::INFINITY
    } else {
        lerp(a, b, t)
    }
}

/// Overrides the position or rotation matching parameters of one bone.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneProfileOverride {
    pub bone: BoneName,
    pub alpha: f32,
    pub damping_ratio: f32,
}

/// Defines animation matching parameters for a ragdoll: global defaults plus
/// per-bone override tables. Resolved into an immutable [`ResolvedProfile`]
/// snapshot before use.
#[derive(Asset, Reflect, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagdollAnimationProfile {
    pub global_position_alpha: f32,
    pub global_position_damping_ratio: f32,
    pub global_max_linear_acceleration: f32,

    pub global_rotation_alpha: f32,
    pub global_rotation_damping_ratio: f32,
    pub global_max_angular_acceleration: f32,

    /// When disabled, the root bone's orientation is governed purely by
    /// unconstrained dynamics, regardless of overrides.
    pub match_root_rotation: bool,

    pub position_overrides: Vec<BoneProfileOverride>,
    pub rotation_overrides: Vec<BoneProfileOverride>,

    /// Regenerated whenever the profile contents change. Resolved snapshots
    /// carry it so dependents can poll for staleness instead of subscribing
    /// to edit notifications.
    #[serde(skip)]
    #[reflect(ignore)]
    pub version: Uuid,
}

impl Default for RagdollAnimationProfile {
    fn default() -> Self {
        Self {
            global_position_alpha: 0.4,
            global_position_damping_ratio: 0.7,
            global_max_linear_acceleration: f32::INFINITY,
            global_rotation_alpha: 0.6,
            global_rotation_damping_ratio: 0.7,
            global_max_angular_acceleration: f32::INFINITY,
            match_root_rotation: true,
            position_overrides: Vec::new(),
            rotation_overrides: Vec::new(),
            version: Uuid::new_v4(),
        }
    }
}

impl RagdollAnimationProfile {
    pub fn default_bone_profile(&self) -> BoneProfile {
        BoneProfile {
            position_alpha: self.global_position_alpha,
            position_damping_ratio: self.global_position_damping_ratio,
            max_linear_acceleration: self.global_max_linear_acceleration,
            rotation_alpha: self.global_rotation_alpha,
            rotation_damping_ratio: self.global_rotation_damping_ratio,
            max_angular_acceleration: self.global_max_angular_acceleration,
        }
    }

    /// Builds the per-bone lookup snapshot for this profile. Fails if an
    /// override names a bone that is not part of the definition.
    pub fn resolve(
        &self,
        definition: &RagdollDefinition,
    ) -> Result<ResolvedProfile, RagdollError> {
        let mut overrides = HashMap::default();

        for position_override in &self.position_overrides {
            if !definition.contains(&position_override.bone) {
                return Err(RagdollError::IncompatibleProfile {
                    bone: position_override.bone.clone(),
                });
            }

            let profile = overrides
                .entry(position_override.bone.clone())
                .or_insert_with(|| self.default_bone_profile());
            profile.position_alpha = position_override.alpha;
            profile.position_damping_ratio = position_override.damping_ratio;
        }

        for rotation_override in &self.rotation_overrides {
            if !definition.contains(&rotation_override.bone) {
                return Err(RagdollError::IncompatibleProfile {
                    bone: rotation_override.bone.clone(),
                });
            }

            let profile = overrides
                .entry(rotation_override.bone.clone())
                .or_insert_with(|| self.default_bone_profile());
            profile.rotation_alpha = rotation_override.alpha;
            profile.rotation_damping_ratio = rotation_override.damping_ratio;
        }

        Ok(ResolvedProfile {
            version: self.version,
            match_root_rotation: self.match_root_rotation,
            default: self.default_bone_profile(),
            overrides,
        })
    }
}

/// Immutable per-bone lookup built from a [`RagdollAnimationProfile`].
/// Resolution always returns a value for any bone, falling back to the global
/// defaults.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    version: Uuid,
    match_root_rotation: bool,
    default: BoneProfile,
    overrides: HashMap<BoneName, BoneProfile>,
}

impl ResolvedProfile {
    pub fn version(&self) -> Uuid {
        self.version
    }

    pub fn bone_profile(&self, bone: &BoneName, is_root: bool) -> BoneProfile {
        let mut profile = self.overrides.get(bone).copied().unwrap_or(self.default);

        if is_root && !self.match_root_rotation {
            profile.rotation_alpha = 0.;
        }

        profile
    }
}
