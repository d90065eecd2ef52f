use bevy::math::Vec3;

use crate::{id::BoneName, modifiers::TargetPoseModifier, pairs::AnimatedPair};

/// Pins one bone's target position to an externally supplied point, e.g. a
/// hand reaching for a grab point. Rotation targets are left untouched.
pub struct LimbPositionOverride {
    bone: BoneName,
    position: Vec3,
}

impl LimbPositionOverride {
    pub fn new(bone: impl Into<BoneName>, position: Vec3) -> Self {
        Self {
            bone: bone.into(),
            position,
        }
    }

    pub fn bone(&self) -> &BoneName {
        &self.bone
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

impl TargetPoseModifier for LimbPositionOverride {
    fn modify_pose(&mut self, pairs: &mut [AnimatedPair], _dt: f32) {
        for pair in pairs {
            if pair.bone() == &self.bone {
                pair.current_pose.world_position = self.position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pairs::AnimatedPose, target_skeleton::TargetSkeleton};
    use bevy::math::Quat;

    #[test]
    fn overrides_only_the_named_bone() {
        let target = TargetSkeleton::new("root").root();
        let mut pairs = vec![
            AnimatedPair::new("hand".into(), false, target, Quat::IDENTITY),
            AnimatedPair::new("foot".into(), false, target, Quat::IDENTITY),
        ];
        for pair in &mut pairs {
            pair.current_pose = AnimatedPose {
                world_position: Vec3::ONE,
                ..Default::default()
            };
        }

        let grab_point = Vec3::new(0., 2., -1.);
        let mut modifier = LimbPositionOverride::new("hand", grab_point);
        modifier.modify_pose(&mut pairs, 0.02);

        assert_eq!(pairs[0].current_pose.world_position, grab_point);
        assert_eq!(pairs[1].current_pose.world_position, Vec3::ONE);
    }
}
