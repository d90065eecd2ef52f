use bevy::math::{Quat, Vec3};
use std::f32::consts::{PI, TAU};

use crate::{id::BoneName, target_skeleton::TargetNodeId};

/// Pose of one target bone, sampled once per step. Immutable snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AnimatedPose {
    pub world_position: Vec3,
    pub world_rotation: Quat,
    pub local_rotation: Quat,
}

/// Binds one simulated bone to one target bone and holds its per-step state:
/// the latest and previous sampled target pose, and the velocities estimated
/// from them by finite difference.
#[derive(Debug, Clone)]
pub struct AnimatedPair {
    bone: BoneName,
    is_root: bool,
    target: TargetNodeId,
    starting_joint_rotation: Quat,

    pub current_pose: AnimatedPose,
    pub(crate) previous_pose: AnimatedPose,

    pose_linear_velocity: Vec3,
    pose_angular_velocity: Vec3,
}

impl AnimatedPair {
    pub(crate) fn new(
        bone: BoneName,
        is_root: bool,
        target: TargetNodeId,
        starting_joint_rotation: Quat,
    ) -> Self {
        Self {
            bone,
            is_root,
            target,
            starting_joint_rotation,
            current_pose: AnimatedPose::default(),
            previous_pose: AnimatedPose::default(),
            pose_linear_velocity: Vec3::ZERO,
            pose_angular_velocity: Vec3::ZERO,
        }
    }

    pub fn bone(&self) -> &BoneName {
        &self.bone
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn target(&self) -> TargetNodeId {
        self.target
    }

    pub fn starting_joint_rotation(&self) -> Quat {
        self.starting_joint_rotation
    }

    pub fn pose_linear_velocity(&self) -> Vec3 {
        self.pose_linear_velocity
    }

    pub fn pose_angular_velocity(&self) -> Vec3 {
        self.pose_angular_velocity
    }

    /// Estimates target velocities from the previous and current pose.
    /// Degenerate steps (`dt <= 0`) keep the previous estimates.
    pub(crate) fn update_velocities(&mut self, dt: f32) {
        if dt <= 0. {
            return;
        }

        self.pose_linear_velocity =
            (self.current_pose.world_position - self.previous_pose.world_position) / dt;
        self.pose_angular_velocity =
            angular_velocity(self.previous_pose.local_rotation, self.current_pose.local_rotation, dt);
    }

    pub(crate) fn store_previous_pose(&mut self) {
        self.previous_pose = self.current_pose;
    }

    pub(crate) fn reset_velocities(&mut self) {
        self.pose_linear_velocity = Vec3::ZERO;
        self.pose_angular_velocity = Vec3::ZERO;
    }
}

/// Angular velocity of the minimal rotation taking `previous` to `current`,
/// with the angle wrapped into `(-PI, PI]` to avoid spurious large-angle
/// spikes from quaternion wraparound.
fn angular_velocity(previous: Quat, current: Quat, dt: f32) -> Vec3 {
    let delta = current * previous.inverse();
    let (axis, mut angle) = delta.to_axis_angle();

    if angle > PI {
        angle -= TAU;
    }

    axis.normalize_or_zero() * (angle / dt)
}
