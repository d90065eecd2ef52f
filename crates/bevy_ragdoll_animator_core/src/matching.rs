//! Spring-damper math that converts matching parameters into forces and drives.

use bevy::{math::Vec3, reflect::Reflect};
use serde::{Deserialize, Serialize};

/// Rotational drive specification consumed by the joint of a simulated bone.
/// Consuming this through the physics engine's constraint solver is preferred
/// over computing torques directly, for stability on rotational coupling.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointDrive {
    pub spring: f32,
    pub damper: f32,
    pub max_force: f32,
}

impl JointDrive {
    /// Drive that applies no force at all; free rotation.
    pub const UNPOWERED: JointDrive = JointDrive {
        spring: 0.,
        damper: 0.,
        max_force: 0.,
    };
}

/// Alpha maps to the stiffness of a spring that would close the full position
/// error within one step at `alpha = 1` (within the linear model).
pub fn spring_stiffness(alpha: f32, mass: f32, dt: f32) -> f32 {
    mass * alpha / (dt * dt)
}

pub fn spring_damping(damping_ratio: f32, stiffness: f32, mass: f32) -> f32 {
    damping_ratio * 2. * (stiffness * mass).sqrt()
}

/// Acceleration of a spring pulling `current_pos` toward `target_pos` with
/// velocity matching, clamped in magnitude to `max_acceleration`.
///
/// Callers must guard `dt > 0`.
#[allow(clippy::too_many_arguments)]
pub fn position_spring_acceleration(
    current_pos: Vec3,
    target_pos: Vec3,
    current_vel: Vec3,
    target_vel: Vec3,
    alpha: f32,
    damping_ratio: f32,
    mass: f32,
    dt: f32,
    max_acceleration: f32,
) -> Vec3 {
    let k = spring_stiffness(alpha, mass, dt);
    let d = spring_damping(damping_ratio, k, mass);

    let position_difference = current_pos - target_pos;
    let velocity_difference = current_vel - target_vel;

    let acceleration = -k / mass * position_difference - d / mass * velocity_difference;
    acceleration.clamp_length_max(max_acceleration)
}

/// Drive specification for matching a target rotation through the bone's joint.
/// The maximum force is expressed as `max_acceleration * mass` so the limit
/// behaves consistently across bones of different mass.
pub fn rotation_matching_drive(
    alpha: f32,
    damping_ratio: f32,
    mass: f32,
    dt: f32,
    max_acceleration: f32,
) -> JointDrive {
    let k = spring_stiffness(alpha, mass, dt);
    let d = spring_damping(damping_ratio, k, mass);

    JointDrive {
        spring: k,
        damper: d,
        max_force: max_acceleration * mass,
    }
}
