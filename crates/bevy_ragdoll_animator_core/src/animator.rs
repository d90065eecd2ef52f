use bevy::math::{Quat, Vec3};
use uuid::Uuid;

use crate::{
    definition::{RagdollBindings, RagdollDefinition},
    errors::RagdollError,
    id::BoneName,
    mapping::map_target_to_ragdoll,
    matching::{JointDrive, position_spring_acceleration, rotation_matching_drive},
    modifiers::{BoneProfileModifier, TargetPoseModifier},
    pairs::{AnimatedPair, AnimatedPose},
    power::{PowerSetting, RagdollPowerProfile},
    profile::{BoneProfile, RagdollAnimationProfile, ResolvedProfile},
    target_skeleton::TargetSkeleton,
    transition::ValueTransitioner,
};

/// Per-step state of one simulated body, sampled from the physics backend by
/// the caller.
#[derive(Debug, Clone, Copy)]
pub struct BodyState {
    pub position: Vec3,
    pub linear_velocity: Vec3,
    pub mass: f32,
}

/// What the physics backend should do to one simulated bone this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoneCommand {
    /// Teleport to the target pose and zero all velocities.
    Snap { position: Vec3, rotation: Quat },
    /// Move kinematically to the target pose; no forces.
    Kinematic { position: Vec3, rotation: Quat },
    /// Apply `acceleration` as a mass-normalized force and configure the
    /// bone's rotational joint drive. The target rotation is world-space for
    /// the root bone (whose joint is configured in world space) and
    /// parent-local otherwise; the target angular velocity is expressed in
    /// the joint's local reference frame.
    Powered {
        acceleration: Vec3,
        drive: JointDrive,
        target_rotation: Quat,
        target_angular_velocity: Vec3,
    },
    /// Zero the joint drive; free dynamics.
    Unpowered,
}

/// Matches a target rig's animation by computing per-bone corrective forces
/// and joint drives for a physics ragdoll.
///
/// Owns the correspondence list, the per-bone power settings, the active and
/// previous animation profiles with their transition, and the registered
/// modifier lists. One instance drives one ragdoll; all state is stepped
/// synchronously from a fixed-timestep physics callback via [`Self::step`].
pub struct RagdollAnimator {
    pairs: Vec<AnimatedPair>,
    power_settings: Vec<PowerSetting>,

    current_profile: ResolvedProfile,
    previous_profile: ResolvedProfile,
    profile_transitioner: ValueTransitioner,
    profile_transition_length: f32,

    master_alpha: f32,
    master_damping_ratio: f32,

    bone_profile_modifiers: Vec<Box<dyn BoneProfileModifier>>,
    target_pose_modifiers: Vec<Box<dyn TargetPoseModifier>>,

    commands: Vec<BoneCommand>,
}

impl RagdollAnimator {
    /// Builds the animator: resolves the profile against the definition,
    /// validates the bindings and constructs the bone correspondence.
    /// Configuration errors fail here, before any state exists.
    pub fn new(
        definition: &RagdollDefinition,
        bindings: &RagdollBindings,
        target: &TargetSkeleton,
        profile: &RagdollAnimationProfile,
    ) -> Result<Self, RagdollError> {
        let resolved = profile.resolve(definition)?;
        let pairings = map_target_to_ragdoll(definition, bindings, target)?;

        let pairs: Vec<AnimatedPair> = pairings
            .into_iter()
            .map(|pairing| {
                let binding = bindings
                    .get(&pairing.bone)
                    .expect("bindings were validated against the definition");
                AnimatedPair::new(
                    pairing.bone,
                    pairing.is_root,
                    pairing.target,
                    binding.starting_joint_rotation,
                )
            })
            .collect();

        let mut profile_transitioner = ValueTransitioner::new(0., 1.);
        profile_transitioner.end_transition();

        let pair_count = pairs.len();
        Ok(Self {
            power_settings: vec![PowerSetting::default(); pair_count],
            pairs,
            previous_profile: resolved.clone(),
            current_profile: resolved,
            profile_transitioner,
            profile_transition_length: 1.,
            master_alpha: 1.,
            master_damping_ratio: 1.,
            bone_profile_modifiers: Vec::new(),
            target_pose_modifiers: Vec::new(),
            commands: Vec::with_capacity(pair_count),
        })
    }

    pub fn pairs(&self) -> &[AnimatedPair] {
        &self.pairs
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn master_alpha(&self) -> f32 {
        self.master_alpha
    }

    pub fn set_master_alpha(&mut self, value: f32) {
        self.master_alpha = value.clamp(0., 1.);
    }

    pub fn master_damping_ratio(&self) -> f32 {
        self.master_damping_ratio
    }

    pub fn set_master_damping_ratio(&mut self, value: f32) {
        self.master_damping_ratio = value.clamp(0., 1.);
    }

    pub fn profile_transition_length(&self) -> f32 {
        self.profile_transition_length
    }

    pub fn set_profile_transition_length(&mut self, value: f32) {
        self.profile_transition_length = value.max(0.);
    }

    pub fn current_profile_version(&self) -> Uuid {
        self.current_profile.version()
    }

    /// Registers a bone-profile modifier at the end of the consultation order.
    pub fn register_bone_profile_modifier(&mut self, mut modifier: Box<dyn BoneProfileModifier>) {
        modifier.initialize(&self.pairs);
        self.bone_profile_modifiers.push(modifier);
    }

    /// Registers a target-pose modifier at the end of the consultation order.
    pub fn register_target_pose_modifier(&mut self, mut modifier: Box<dyn TargetPoseModifier>) {
        modifier.initialize(&self.pairs);
        self.target_pose_modifiers.push(modifier);
    }

    pub fn power_setting(&self, bone: &BoneName) -> Option<PowerSetting> {
        self.pairs
            .iter()
            .position(|pair| pair.bone() == bone)
            .map(|i| self.power_settings[i])
    }

    pub fn set_power_setting(&mut self, bone: &BoneName, setting: PowerSetting) {
        if let Some(i) = self.pairs.iter().position(|pair| pair.bone() == bone) {
            self.change_power_setting(i, setting);
        }
    }

    /// Applies a power profile to every driven bone.
    pub fn apply_power_profile(&mut self, profile: &RagdollPowerProfile) {
        for i in 0..self.pairs.len() {
            let setting = profile.bone_setting(self.pairs[i].bone());
            self.change_power_setting(i, setting);
        }
    }

    fn change_power_setting(&mut self, index: usize, setting: PowerSetting) {
        let previous = self.power_settings[index];
        if previous == setting {
            return;
        }

        self.power_settings[index] = setting;
        for modifier in &mut self.bone_profile_modifiers {
            modifier.power_setting_changed(&self.pairs[index], previous, setting);
        }
    }

    /// Switches to a new animation profile, blending from the old one over the
    /// configured transition length. Switching to a profile with the same
    /// version as the active one is a no-op.
    pub fn transition_to(
        &mut self,
        profile: &RagdollAnimationProfile,
        definition: &RagdollDefinition,
    ) -> Result<(), RagdollError> {
        let resolved = profile.resolve(definition)?;
        if resolved.version() == self.current_profile.version() {
            return Ok(());
        }

        self.previous_profile = std::mem::replace(&mut self.current_profile, resolved);
        self.profile_transitioner
            .start_transition(self.profile_transition_length)
    }

    /// Runs one fixed physics step. `poses` and `bodies` are indexed by pair
    /// order (see [`Self::pairs`]). Returns one command per pair.
    ///
    /// A degenerate step (`dt <= 0`) computes nothing and retains all previous
    /// state; it is a recoverable no-op, not an error.
    pub fn step(
        &mut self,
        dt: f32,
        poses: &[AnimatedPose],
        bodies: &[BodyState],
    ) -> Result<&[BoneCommand], RagdollError> {
        self.check_pair_count(poses.len())?;
        self.check_pair_count(bodies.len())?;

        self.commands.clear();
        if dt <= 0. {
            return Ok(&self.commands);
        }

        for (pair, pose) in self.pairs.iter_mut().zip(poses) {
            pair.current_pose = *pose;
        }

        for modifier in &mut self.target_pose_modifiers {
            modifier.modify_pose(&mut self.pairs, dt);
        }

        for pair in &mut self.pairs {
            pair.update_velocities(dt);
        }

        self.profile_transitioner.update(dt);

        for i in 0..self.pairs.len() {
            let command = match self.power_settings[i] {
                PowerSetting::Kinematic => BoneCommand::Kinematic {
                    position: self.pairs[i].current_pose.world_position,
                    rotation: self.pairs[i].current_pose.world_rotation,
                },
                PowerSetting::Powered => self.powered_command(i, dt, &bodies[i]),
                PowerSetting::Unpowered => BoneCommand::Unpowered,
            };
            self.commands.push(command);
        }

        for pair in &mut self.pairs {
            pair.store_previous_pose();
        }

        Ok(&self.commands)
    }

    fn powered_command(&mut self, index: usize, dt: f32, body: &BodyState) -> BoneCommand {
        let mut profile = self.blended_bone_profile(index);

        for modifier in &mut self.bone_profile_modifiers {
            modifier.modify(&mut profile, &self.pairs[index], dt);
        }

        profile.position_alpha *= self.master_alpha;
        profile.position_damping_ratio *= self.master_damping_ratio;
        profile.rotation_alpha *= self.master_alpha;
        profile.rotation_damping_ratio *= self.master_damping_ratio;

        let pair = &self.pairs[index];

        let acceleration = position_spring_acceleration(
            body.position,
            pair.current_pose.world_position,
            body.linear_velocity,
            pair.pose_linear_velocity(),
            profile.position_alpha,
            profile.position_damping_ratio,
            body.mass,
            dt,
            profile.max_linear_acceleration,
        );

        let drive = rotation_matching_drive(
            profile.rotation_alpha,
            profile.rotation_damping_ratio,
            body.mass,
            dt,
            profile.max_angular_acceleration,
        );

        // Root joints are configured in world space, the rest in parent-local
        // space. The drive consumes the target angular velocity in its own
        // local frame.
        let target_rotation = if pair.is_root() {
            pair.current_pose.world_rotation
        } else {
            pair.current_pose.local_rotation
        };
        let target_angular_velocity = pair.starting_joint_rotation() * pair.pose_angular_velocity();

        BoneCommand::Powered {
            acceleration,
            drive,
            target_rotation,
            target_angular_velocity,
        }
    }

    fn blended_bone_profile(&self, index: usize) -> BoneProfile {
        let pair = &self.pairs[index];
        let previous = self
            .previous_profile
            .bone_profile(pair.bone(), pair.is_root());
        let current = self
            .current_profile
            .bone_profile(pair.bone(), pair.is_root());

        BoneProfile::blend(previous, current, self.profile_transitioner.value())
    }

    /// Teleports every bone onto its current target pose with zeroed
    /// velocities. Used on enable and before the first simulated step so the
    /// ragdoll does not start with a large correction.
    pub fn snap_to_target_pose(
        &mut self,
        poses: &[AnimatedPose],
    ) -> Result<&[BoneCommand], RagdollError> {
        self.check_pair_count(poses.len())?;

        self.commands.clear();
        for (pair, pose) in self.pairs.iter_mut().zip(poses) {
            pair.current_pose = *pose;
            pair.store_previous_pose();
            pair.reset_velocities();

            self.commands.push(BoneCommand::Snap {
                position: pose.world_position,
                rotation: pose.world_rotation,
            });
        }

        Ok(&self.commands)
    }

    /// Zeroes every joint drive, leaving the ragdoll in free dynamics. Used on
    /// disable so a suddenly-inactive ragdoll does not freeze mid-drive.
    pub fn unpower_all_joints(&mut self) -> &[BoneCommand] {
        self.commands.clear();
        self.commands
            .extend(self.pairs.iter().map(|_| BoneCommand::Unpowered));
        &self.commands
    }

    fn check_pair_count(&self, got: usize) -> Result<(), RagdollError> {
        if got == self.pairs.len() {
            Ok(())
        } else {
            Err(RagdollError::PairCountMismatch {
                expected: self.pairs.len(),
                got,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::BoneBinding;

    const DT: f32 = 0.02;

    fn two_bone_animator(profile: &RagdollAnimationProfile) -> RagdollAnimator {
        let definition = RagdollDefinition::new("hips", ["hips", "spine"]).unwrap();

        let mut bindings = RagdollBindings::default();
        for bone in definition.bones() {
            bindings.insert(
                bone.clone(),
                BoneBinding {
                    starting_joint_rotation: Quat::IDENTITY,
                },
            );
        }

        let mut target = TargetSkeleton::new("hips");
        target.add_node(target.root(), "spine");

        RagdollAnimator::new(&definition, &bindings, &target, profile).unwrap()
    }

    fn static_poses() -> Vec<AnimatedPose> {
        vec![
            AnimatedPose {
                world_position: Vec3::new(0., 1., 0.),
                ..Default::default()
            },
            AnimatedPose {
                world_position: Vec3::new(0., 1.5, 0.),
                ..Default::default()
            },
        ]
    }

    fn resting_bodies(poses: &[AnimatedPose]) -> Vec<BodyState> {
        poses
            .iter()
            .map(|pose| BodyState {
                position: pose.world_position,
                linear_velocity: Vec3::ZERO,
                mass: 1.,
            })
            .collect()
    }

    #[test]
    fn bones_default_to_kinematic_and_follow_exactly() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        let poses = static_poses();
        let bodies = resting_bodies(&poses);

        let commands = animator.step(DT, &poses, &bodies).unwrap();

        assert_eq!(
            commands[0],
            BoneCommand::Kinematic {
                position: Vec3::new(0., 1., 0.),
                rotation: Quat::IDENTITY,
            }
        );
    }

    #[test]
    fn unpowered_bones_get_no_drive() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        animator.set_power_setting(&"spine".into(), PowerSetting::Unpowered);

        let poses = static_poses();
        let bodies = resting_bodies(&poses);
        let commands = animator.step(DT, &poses, &bodies).unwrap();

        assert_eq!(commands[1], BoneCommand::Unpowered);
        assert_eq!(JointDrive::UNPOWERED.spring, 0.);
    }

    #[test]
    fn degenerate_dt_is_a_noop() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        let poses = static_poses();
        let bodies = resting_bodies(&poses);

        assert!(animator.step(0., &poses, &bodies).unwrap().is_empty());
        assert!(animator.step(-0.01, &poses, &bodies).unwrap().is_empty());
    }

    #[test]
    fn mismatched_step_input_is_fatal() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        let poses = static_poses();

        assert!(matches!(
            animator.step(DT, &poses, &[]),
            Err(RagdollError::PairCountMismatch { expected: 2, got: 0 })
        ));
    }

    #[test]
    fn snapped_ragdoll_needs_no_initial_correction() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        animator.set_power_setting(&"hips".into(), PowerSetting::Powered);
        animator.set_power_setting(&"spine".into(), PowerSetting::Powered);

        let poses = static_poses();
        animator.snap_to_target_pose(&poses).unwrap();

        let bodies = resting_bodies(&poses);
        let commands = animator.step(DT, &poses, &bodies).unwrap();

        let BoneCommand::Powered { acceleration, .. } = commands[0] else {
            panic!("expected a powered command");
        };
        assert_eq!(acceleration, Vec3::ZERO);
    }

    #[test]
    fn unpower_all_joints_covers_every_bone() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);

        let commands = animator.unpower_all_joints();
        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|c| *c == BoneCommand::Unpowered));
    }

    #[test]
    fn master_alpha_zero_disables_all_matching_force() {
        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        animator.set_power_setting(&"hips".into(), PowerSetting::Powered);
        animator.set_master_alpha(0.);

        let poses = static_poses();
        let mut bodies = resting_bodies(&poses);
        bodies[0].position += Vec3::X;

        let commands = animator.step(DT, &poses, &bodies).unwrap();
        let BoneCommand::Powered {
            acceleration, drive, ..
        } = commands[0]
        else {
            panic!("expected a powered command");
        };
        assert_eq!(acceleration, Vec3::ZERO);
        assert_eq!(drive.spring, 0.);
    }

    #[test]
    fn disabled_root_rotation_matching_zeroes_the_root_drive() {
        let mut profile = RagdollAnimationProfile::default();
        profile.match_root_rotation = false;

        let mut animator = two_bone_animator(&profile);
        animator.set_power_setting(&"hips".into(), PowerSetting::Powered);
        animator.set_power_setting(&"spine".into(), PowerSetting::Powered);

        let poses = static_poses();
        let bodies = resting_bodies(&poses);
        let commands = animator.step(DT, &poses, &bodies).unwrap();

        let BoneCommand::Powered { drive: root, .. } = commands[0] else {
            panic!("expected a powered command");
        };
        let BoneCommand::Powered { drive: spine, .. } = commands[1] else {
            panic!("expected a powered command");
        };
        assert_eq!(root.spring, 0.);
        assert!(spine.spring > 0.);
    }

    #[test]
    fn profile_transition_blends_between_profiles() {
        let mut from = RagdollAnimationProfile::default();
        from.global_rotation_alpha = 0.2;
        let mut to = RagdollAnimationProfile::default();
        to.global_rotation_alpha = 0.8;

        let definition = RagdollDefinition::new("hips", ["hips", "spine"]).unwrap();
        let mut animator = two_bone_animator(&from);
        animator.set_power_setting(&"spine".into(), PowerSetting::Powered);
        animator.set_profile_transition_length(1.);
        animator.transition_to(&to, &definition).unwrap();

        let poses = static_poses();
        let bodies = resting_bodies(&poses);

        let spring_from = 0.2 / (0.25 * 0.25);
        let spring_to = 0.8 / (0.25 * 0.25);

        let mut previous = spring_from;
        for step in 0..4 {
            let commands = animator.step(0.25, &poses, &bodies).unwrap();
            let BoneCommand::Powered { drive, .. } = commands[1] else {
                panic!("expected a powered command");
            };

            assert!(drive.spring > previous, "step {step} did not increase");
            assert!(drive.spring <= spring_to + 1e-2);
            previous = drive.spring;
        }
        // Transition finished: exactly the new profile's stiffness.
        assert!((previous - spring_to).abs() < 1e-2);
    }

    #[test]
    fn target_pose_modifiers_can_overwrite_the_target() {
        struct PinHips(Vec3);
        impl TargetPoseModifier for PinHips {
            fn modify_pose(&mut self, pairs: &mut [AnimatedPair], _dt: f32) {
                for pair in pairs {
                    if *pair.bone() == "hips".into() {
                        pair.current_pose.world_position = self.0;
                    }
                }
            }
        }

        let profile = RagdollAnimationProfile::default();
        let mut animator = two_bone_animator(&profile);
        let pinned = Vec3::new(5., 5., 5.);
        animator.register_target_pose_modifier(Box::new(PinHips(pinned)));

        let poses = static_poses();
        let bodies = resting_bodies(&poses);
        let commands = animator.step(DT, &poses, &bodies).unwrap();

        assert_eq!(
            commands[0],
            BoneCommand::Kinematic {
                position: pinned,
                rotation: Quat::IDENTITY,
            }
        );
    }

    /// Two displaced powered bones tracking a static pose must settle back
    /// onto it with monotonically decreasing positional error.
    #[test]
    fn powered_matching_converges_without_overshoot() {
        let mut profile = RagdollAnimationProfile::default();
        profile.global_position_alpha = 0.4;
        profile.global_position_damping_ratio = 0.7;

        let mut animator = two_bone_animator(&profile);
        animator.set_power_setting(&"hips".into(), PowerSetting::Powered);
        animator.set_power_setting(&"spine".into(), PowerSetting::Powered);

        let poses = static_poses();
        animator.snap_to_target_pose(&poses).unwrap();

        let mut bodies = resting_bodies(&poses);
        bodies[0].position += Vec3::new(1., 0., 0.);
        bodies[1].position += Vec3::new(0., 0., -0.5);

        let mut errors: Vec<f32> = bodies
            .iter()
            .zip(&poses)
            .map(|(body, pose)| (body.position - pose.world_position).length())
            .collect();

        for _ in 0..60 {
            let commands = animator.step(DT, &poses, &bodies).unwrap().to_vec();

            // Semi-implicit Euler, the same integration scheme the physics
            // backend applies to acceleration-mode forces.
            for (body, command) in bodies.iter_mut().zip(&commands) {
                let BoneCommand::Powered { acceleration, .. } = command else {
                    panic!("expected a powered command");
                };
                body.linear_velocity += *acceleration * DT;
                body.position += body.linear_velocity * DT;
            }

            for (i, (body, pose)) in bodies.iter().zip(&poses).enumerate() {
                let error = (body.position - pose.world_position).length();
                assert!(
                    error < errors[i] || error < 1e-6,
                    "positional error grew: {error} >= {}",
                    errors[i]
                );
                errors[i] = error;
            }
        }

        assert!(errors.iter().all(|error| *error < 1e-3));
    }
}
