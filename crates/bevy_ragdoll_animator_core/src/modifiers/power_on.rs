use bevy::platform::collections::HashMap;

use crate::{
    id::BoneName, modifiers::BoneProfileModifier, pairs::AnimatedPair, power::PowerSetting,
    profile::BoneProfile, transition::ValueTransitioner,
};

/// Ramps a bone's matching strength up from zero whenever it goes from
/// [`PowerSetting::Unpowered`] to [`PowerSetting::Powered`], so a freshly
/// repowered limb eases back onto the animation instead of snapping.
pub struct PowerOnTransitioner {
    transition_length: f32,
    do_starting_transition: bool,
    transitioners: HashMap<BoneName, ValueTransitioner>,
}

impl Default for PowerOnTransitioner {
    fn default() -> Self {
        Self {
            transition_length: 0.5,
            do_starting_transition: true,
            transitioners: HashMap::default(),
        }
    }
}

impl PowerOnTransitioner {
    pub fn new(transition_length: f32, do_starting_transition: bool) -> Self {
        Self {
            transition_length: transition_length.max(0.),
            do_starting_transition,
            transitioners: HashMap::default(),
        }
    }

    pub fn transition_length(&self) -> f32 {
        self.transition_length
    }

    pub fn set_transition_length(&mut self, value: f32) {
        self.transition_length = value.max(0.);
    }

    fn start(&mut self, bone: &BoneName) {
        if let Some(transitioner) = self.transitioners.get_mut(bone) {
            // The length is clamped non-negative, so starting cannot fail.
            let _ = transitioner.start_transition(self.transition_length);
        }
    }
}

impl BoneProfileModifier for PowerOnTransitioner {
    fn initialize(&mut self, pairs: &[AnimatedPair]) {
        self.transitioners.clear();
        for pair in pairs {
            let mut transitioner = ValueTransitioner::with_easing(0., 1., |t| t * t);
            transitioner.end_transition();
            self.transitioners.insert(pair.bone().clone(), transitioner);
        }

        if self.do_starting_transition {
            for pair in pairs {
                self.start(pair.bone());
            }
        }
    }

    fn modify(&mut self, profile: &mut BoneProfile, pair: &AnimatedPair, dt: f32) {
        let Some(transitioner) = self.transitioners.get_mut(pair.bone()) else {
            return;
        };

        transitioner.update(dt);
        let strength = transitioner.value();
        profile.position_alpha *= strength;
        profile.rotation_alpha *= strength;
    }

    fn power_setting_changed(
        &mut self,
        pair: &AnimatedPair,
        previous: PowerSetting,
        new: PowerSetting,
    ) {
        if previous == PowerSetting::Unpowered && new == PowerSetting::Powered {
            self.start(pair.bone());
        } else if let Some(transitioner) = self.transitioners.get_mut(pair.bone()) {
            transitioner.end_transition();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target_skeleton::TargetSkeleton;
    use bevy::math::Quat;

    fn pair(name: &str) -> AnimatedPair {
        let target = TargetSkeleton::new("root").root();
        AnimatedPair::new(name.into(), false, target, Quat::IDENTITY)
    }

    fn full_profile() -> BoneProfile {
        BoneProfile {
            position_alpha: 1.,
            position_damping_ratio: 0.7,
            max_linear_acceleration: f32::INFINITY,
            rotation_alpha: 1.,
            rotation_damping_ratio: 0.7,
            max_angular_acceleration: f32::INFINITY,
        }
    }

    #[test]
    fn starting_transition_ramps_strength_from_zero() {
        let mut modifier = PowerOnTransitioner::new(1., true);
        let pairs = vec![pair("arm")];
        modifier.initialize(&pairs);

        let mut profile = full_profile();
        modifier.modify(&mut profile, &pairs[0], 0.5);
        // Quadratic ease-in: halfway through, strength is a quarter.
        assert!((profile.position_alpha - 0.25).abs() < 1e-6);
        assert!((profile.rotation_alpha - 0.25).abs() < 1e-6);

        let mut profile = full_profile();
        modifier.modify(&mut profile, &pairs[0], 1.);
        assert_eq!(profile.position_alpha, 1.);
    }

    #[test]
    fn starting_transition_can_be_skipped() {
        let mut modifier = PowerOnTransitioner::new(1., false);
        let pairs = vec![pair("arm")];
        modifier.initialize(&pairs);

        let mut profile = full_profile();
        modifier.modify(&mut profile, &pairs[0], 0.01);
        assert_eq!(profile.position_alpha, 1.);
    }

    #[test]
    fn repowering_restarts_the_ramp() {
        let mut modifier = PowerOnTransitioner::new(1., false);
        let pairs = vec![pair("arm")];
        modifier.initialize(&pairs);

        modifier.power_setting_changed(
            &pairs[0],
            PowerSetting::Unpowered,
            PowerSetting::Powered,
        );

        let mut profile = full_profile();
        modifier.modify(&mut profile, &pairs[0], 0.25);
        assert!(profile.position_alpha < 0.1);
    }

    #[test]
    fn other_power_changes_end_the_ramp() {
        let mut modifier = PowerOnTransitioner::new(1., true);
        let pairs = vec![pair("arm")];
        modifier.initialize(&pairs);

        modifier.power_setting_changed(
            &pairs[0],
            PowerSetting::Powered,
            PowerSetting::Kinematic,
        );

        let mut profile = full_profile();
        modifier.modify(&mut profile, &pairs[0], 0.01);
        assert_eq!(profile.position_alpha, 1.);
    }
}
