use avian3d::prelude::{
    AngularVelocity, ComputedMass, LinearVelocity, Position, RigidBody, Rotation,
};
use bevy::asset::Assets;
use bevy::ecs::entity::Entity;
use bevy::ecs::hierarchy::{ChildOf, Children};
use bevy::ecs::name::Name;
use bevy::ecs::system::{Commands, Query, Res};
use bevy::log::{error, warn};
use bevy::math::{Quat, Vec3};
use bevy::platform::collections::HashMap;
use bevy::time::Time;
use bevy::transform::components::{GlobalTransform, Transform};

use bevy_ragdoll_animator_core::{
    animator::{BodyState, BoneCommand, RagdollAnimator},
    definition::{BoneBinding, RagdollBindings, RagdollDefinition},
    id::BoneName,
    pairs::AnimatedPose,
    power::{PowerSetting, RagdollPowerProfile},
    profile::RagdollAnimationProfile,
    target_skeleton::TargetSkeleton,
};

use crate::components::{RagdollPlayer, RagdollRig};

/// Builds the rig for players whose assets have loaded. Both hierarchies are
/// walked by `Name`; the resulting pair order indexes every rig vector.
pub fn initialize_ragdoll_rigs_avian(
    mut players: Query<&mut RagdollPlayer>,
    definition_assets: Res<Assets<RagdollDefinition>>,
    profile_assets: Res<Assets<RagdollAnimationProfile>>,
    names: Query<&Name>,
    children: Query<&Children>,
    parents: Query<&ChildOf>,
    transforms: Query<&Transform>,
    global_transforms: Query<&GlobalTransform>,
) {
    for mut player in &mut players {
        if player.rig.is_some() {
            continue;
        }
        let (Some(target_root), Some(ragdoll_root)) = (player.target_root, player.ragdoll_root)
        else {
            continue;
        };
        let Some(definition) = definition_assets.get(&player.definition) else {
            continue;
        };
        let Some(profile) = profile_assets.get(&player.profile) else {
            continue;
        };

        let Some((target, target_entities_by_node)) =
            build_target_skeleton(target_root, &names, &children)
        else {
            warn!("ragdoll target root {target_root} has no Name, cannot build rig");
            continue;
        };

        let bone_entities = collect_bone_entities(ragdoll_root, definition, &names, &children);

        let mut bindings = RagdollBindings::default();
        for (bone, &entity) in &bone_entities {
            // Root joints are configured in world space, the rest relative to
            // the parent body.
            let starting_joint_rotation = if definition.is_root(bone) {
                global_transforms
                    .get(entity)
                    .map(|t| t.rotation())
                    .unwrap_or(Quat::IDENTITY)
            } else {
                transforms
                    .get(entity)
                    .map(|t| t.rotation)
                    .unwrap_or(Quat::IDENTITY)
            };
            bindings.insert(bone.clone(), BoneBinding {
                starting_joint_rotation,
            });
        }

        let animator = match RagdollAnimator::new(definition, &bindings, &target, profile) {
            Ok(animator) => animator,
            Err(err) => {
                error!("failed to build ragdoll rig: {err}");
                continue;
            }
        };

        let mut body_entities = Vec::with_capacity(animator.pair_count());
        let mut target_entities = Vec::with_capacity(animator.pair_count());
        for pair in animator.pairs() {
            // Mapping only emits pairs for bones present in the bindings, and
            // bindings only exist for bones with an entity.
            body_entities.push(bone_entities[pair.bone()]);
            target_entities.push(target_entities_by_node[pair.target().index()]);
        }

        let body_indices: HashMap<Entity, usize> = body_entities
            .iter()
            .enumerate()
            .map(|(i, &entity)| (entity, i))
            .collect();
        let parent_bodies = animator
            .pairs()
            .iter()
            .zip(&body_entities)
            .map(|(pair, &entity)| {
                if pair.is_root() {
                    None
                } else {
                    parents
                        .iter_ancestors(entity)
                        .find_map(|ancestor| body_indices.get(&ancestor).copied())
                }
            })
            .collect();

        let pair_count = animator.pair_count();
        player.rig = Some(RagdollRig {
            animator,
            body_entities,
            target_entities,
            parent_bodies,
            applied_power_profile: None,
            pending_snap: true,
            was_enabled: false,
            poses: Vec::with_capacity(pair_count),
            bodies: Vec::with_capacity(pair_count),
        });
    }
}

/// Builds the target skeleton by walking the named descendants of `root`.
/// Unnamed entities pass their parent node through to their children, so
/// helper entities do not break bone chains. Returns `None` when the root
/// itself is unnamed.
fn build_target_skeleton(
    root: Entity,
    names: &Query<&Name>,
    children: &Query<&Children>,
) -> Option<(TargetSkeleton, Vec<Entity>)> {
    let root_name = names.get(root).ok()?;
    let mut skeleton = TargetSkeleton::new(root_name.as_str());
    let mut entities = vec![root];

    let mut stack = vec![(root, skeleton.root())];
    while let Some((entity, node)) = stack.pop() {
        let Ok(entity_children) = children.get(entity) else {
            continue;
        };
        for &child in entity_children {
            let child_node = if let Ok(name) = names.get(child) {
                let child_node = skeleton.add_node(node, name.as_str());
                entities.push(child);
                child_node
            } else {
                node
            };
            stack.push((child, child_node));
        }
    }

    Some((skeleton, entities))
}

/// Finds the entity for each definition bone among the named descendants of
/// `root` (inclusive). First match wins.
fn collect_bone_entities(
    root: Entity,
    definition: &RagdollDefinition,
    names: &Query<&Name>,
    children: &Query<&Children>,
) -> HashMap<BoneName, Entity> {
    let mut entities = HashMap::default();

    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        if let Ok(name) = names.get(entity) {
            let bone = BoneName::from(name.as_str());
            if definition.contains(&bone) {
                entities.entry(bone).or_insert(entity);
            }
        }
        if let Ok(entity_children) = children.get(entity) {
            stack.extend(entity_children.iter());
        }
    }

    entities
}

/// Keeps each simulated bone's rigid body mode in sync with its power
/// setting: kinematic bones are moved directly, everything else is dynamic.
pub fn update_ragdoll_rigidbodies(
    players: Query<&RagdollPlayer>,
    rigid_bodies: Query<&RigidBody>,
    mut commands: Commands,
) {
    for player in &players {
        let Some(rig) = &player.rig else {
            continue;
        };

        for (pair, &body_entity) in rig.animator.pairs().iter().zip(&rig.body_entities) {
            let Some(setting) = rig.animator.power_setting(pair.bone()) else {
                continue;
            };
            let Ok(rigid_body) = rigid_bodies.get(body_entity) else {
                continue;
            };

            let target_mode = if player.enabled && setting == PowerSetting::Kinematic {
                RigidBody::Kinematic
            } else {
                RigidBody::Dynamic
            };

            if *rigid_body != target_mode {
                commands.entity(body_entity).insert(target_mode);
            }
        }
    }
}

/// Steps every rigged player and applies the resulting bone commands to the
/// avian bodies. Matching forces are applied at the velocity level, in
/// acceleration units, right before the physics update consumes them.
pub fn update_ragdolls_avian(
    mut players: Query<&mut RagdollPlayer>,
    definition_assets: Res<Assets<RagdollDefinition>>,
    profile_assets: Res<Assets<RagdollAnimationProfile>>,
    power_profile_assets: Res<Assets<RagdollPowerProfile>>,
    target_query: Query<(&Transform, &GlobalTransform)>,
    mut body_query: Query<(
        &mut Position,
        &mut Rotation,
        &mut LinearVelocity,
        &mut AngularVelocity,
        &ComputedMass,
    )>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for mut player in &mut players {
        let player = &mut *player;
        let Some(rig) = &mut player.rig else {
            continue;
        };

        if !player.enabled {
            if rig.was_enabled {
                rig.was_enabled = false;
                // Snap back onto the target when re-enabled.
                rig.pending_snap = true;
            }
            continue;
        }

        rig.animator.set_master_alpha(player.master_alpha);
        rig.animator
            .set_master_damping_ratio(player.master_damping_ratio);
        rig.animator
            .set_profile_transition_length(player.profile_transition_length);

        // Poll the profile asset for edits and reloads.
        if let Some(profile) = profile_assets.get(&player.profile)
            && profile.version != rig.animator.current_profile_version()
            && let Some(definition) = definition_assets.get(&player.definition)
            && let Err(err) = rig.animator.transition_to(profile, definition)
        {
            error!("failed to transition ragdoll profile: {err}");
        }

        if let Some(power_profile_handle) = &player.power_profile
            && rig.applied_power_profile != Some(power_profile_handle.id())
            && let Some(power_profile) = power_profile_assets.get(power_profile_handle)
        {
            rig.animator.apply_power_profile(power_profile);
            rig.applied_power_profile = Some(power_profile_handle.id());
        }

        if !sample_rig_state(rig, &target_query, &body_query) {
            continue;
        }

        let RagdollRig {
            animator,
            body_entities,
            parent_bodies,
            pending_snap,
            was_enabled,
            poses,
            bodies,
            ..
        } = rig;

        // Current world rotations and angular velocities, needed to turn
        // joint-space drive targets into world-space velocity corrections.
        let kinematics: Vec<(Quat, Vec3)> = body_entities
            .iter()
            .map(|&entity| {
                body_query
                    .get(entity)
                    .map(|(_, rotation, _, angular_velocity, _)| (rotation.0, angular_velocity.0))
                    .unwrap_or((Quat::IDENTITY, Vec3::ZERO))
            })
            .collect();

        let commands: Vec<BoneCommand> = if *pending_snap {
            *pending_snap = false;
            match animator.snap_to_target_pose(poses) {
                Ok(commands) => commands.to_vec(),
                Err(err) => {
                    error!("failed to snap ragdoll to target pose: {err}");
                    continue;
                }
            }
        } else {
            match animator.step(dt, poses, bodies) {
                Ok(commands) => commands.to_vec(),
                Err(err) => {
                    error!("failed to step ragdoll: {err}");
                    continue;
                }
            }
        };

        for (i, command) in commands.iter().enumerate() {
            let Ok((mut position, mut rotation, mut linear_velocity, mut angular_velocity, mass)) =
                body_query.get_mut(body_entities[i])
            else {
                continue;
            };

            match *command {
                BoneCommand::Snap {
                    position: target_position,
                    rotation: target_rotation,
                } => {
                    position.0 = target_position;
                    rotation.0 = target_rotation;
                    linear_velocity.0 = Vec3::ZERO;
                    angular_velocity.0 = Vec3::ZERO;
                }
                BoneCommand::Kinematic {
                    position: target_position,
                    rotation: target_rotation,
                } => {
                    position.0 = target_position;
                    rotation.0 = target_rotation;
                }
                BoneCommand::Powered {
                    acceleration,
                    drive,
                    target_rotation,
                    target_angular_velocity,
                } => {
                    linear_velocity.0 += acceleration * dt;

                    let mass = mass.value();
                    let starting_joint_rotation =
                        animator.pairs()[i].starting_joint_rotation();

                    // Drive targets come in the joint's frame. Non-root joints
                    // additionally live in the parent body's space.
                    let (world_target_rotation, world_target_angular_velocity) =
                        match parent_bodies[i] {
                            Some(parent) => {
                                let parent_rotation = kinematics[parent].0;
                                (
                                    parent_rotation * target_rotation,
                                    parent_rotation
                                        * (starting_joint_rotation.inverse()
                                            * target_angular_velocity),
                                )
                            }
                            None => (
                                target_rotation,
                                starting_joint_rotation.inverse() * target_angular_velocity,
                            ),
                        };

                    let (current_rotation, current_angular_velocity) = kinematics[i];
                    let mut delta = world_target_rotation * current_rotation.inverse();
                    // Shortest arc.
                    if delta.w < 0. {
                        delta = -delta;
                    }
                    let rotation_error = delta.to_scaled_axis();

                    let angular_acceleration = ((drive.spring / mass) * rotation_error
                        + (drive.damper / mass)
                            * (world_target_angular_velocity - current_angular_velocity))
                        .clamp_length_max(drive.max_force / mass);

                    angular_velocity.0 += angular_acceleration * dt;
                }
                BoneCommand::Unpowered => {}
            }
        }

        *was_enabled = true;
    }
}

/// Fills the rig's pose and body scratch buffers from the ECS. Returns false
/// when any bone entity has gone missing, in which case the player is skipped
/// for this step.
fn sample_rig_state(
    rig: &mut RagdollRig,
    target_query: &Query<(&Transform, &GlobalTransform)>,
    body_query: &Query<(
        &mut Position,
        &mut Rotation,
        &mut LinearVelocity,
        &mut AngularVelocity,
        &ComputedMass,
    )>,
) -> bool {
    rig.poses.clear();
    rig.bodies.clear();

    for (pair, &target_entity) in rig.animator.pairs().iter().zip(&rig.target_entities) {
        let Ok((transform, global_transform)) = target_query.get(target_entity) else {
            warn!("ragdoll target bone entity {target_entity} is missing");
            return false;
        };

        // The root joint lives in world space, so its angular velocity is
        // estimated from the world rotation.
        let local_rotation = if pair.is_root() {
            global_transform.rotation()
        } else {
            transform.rotation
        };

        rig.poses.push(AnimatedPose {
            world_position: global_transform.translation(),
            world_rotation: global_transform.rotation(),
            local_rotation,
        });
    }

    for &body_entity in &rig.body_entities {
        let Ok((position, _, linear_velocity, _, mass)) = body_query.get(body_entity) else {
            warn!("ragdoll bone entity {body_entity} is missing");
            return false;
        };

        rig.bodies.push(BodyState {
            position: position.0,
            linear_velocity: linear_velocity.0,
            mass: mass.value(),
        });
    }

    true
}
