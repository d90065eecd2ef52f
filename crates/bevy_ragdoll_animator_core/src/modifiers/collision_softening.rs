use bevy::platform::collections::HashMap;

use crate::{
    id::BoneName, modifiers::BoneProfileModifier, pairs::AnimatedPair,
    profile::BoneProfile, transition::ValueTransitioner,
};

/// Weakens a bone's matching when it collides with the environment, then
/// recovers full strength over a recovery window. The caller reports
/// collisions explicitly via [`Self::report_collision`]; a stiffly driven
/// bone would otherwise fight its way through obstacles.
pub struct CollisionSoftening {
    soften_position: bool,
    soften_rotation: bool,
    softening_amount: f32,
    recovery_time: f32,
    transitioners: HashMap<BoneName, ValueTransitioner>,
}

impl Default for CollisionSoftening {
    fn default() -> Self {
        Self {
            soften_position: true,
            soften_rotation: false,
            softening_amount: 1.,
            recovery_time: 0.5,
            transitioners: HashMap::default(),
        }
    }
}

impl CollisionSoftening {
    pub fn new(soften_position: bool, soften_rotation: bool) -> Self {
        Self {
            soften_position,
            soften_rotation,
            ..Default::default()
        }
    }

    pub fn softening_amount(&self) -> f32 {
        self.softening_amount
    }

    pub fn set_softening_amount(&mut self, value: f32) {
        self.softening_amount = value.clamp(0., 1.);
    }

    pub fn recovery_time(&self) -> f32 {
        self.recovery_time
    }

    pub fn set_recovery_time(&mut self, value: f32) {
        self.recovery_time = value.max(0.);
    }

    /// Marks a bone as having just collided. Unknown bones are ignored.
    pub fn report_collision(&mut self, bone: &BoneName) {
        if let Some(transitioner) = self.transitioners.get_mut(bone) {
            // The recovery time is clamped non-negative, so this cannot fail.
            let _ = transitioner.start_transition(self.recovery_time);
        }
    }
}

impl BoneProfileModifier for CollisionSoftening {
    fn initialize(&mut self, pairs: &[AnimatedPair]) {
        self.transitioners.clear();
        for pair in pairs {
            let mut transitioner = ValueTransitioner::with_easing(0., 1., |t| t * t);
            transitioner.end_transition();
            self.transitioners.insert(pair.bone().clone(), transitioner);
        }
    }

    fn modify(&mut self, profile: &mut BoneProfile, pair: &AnimatedPair, dt: f32) {
        let Some(transitioner) = self.transitioners.get_mut(pair.bone()) else {
            return;
        };

        transitioner.update(dt);
        // Recovered fraction 0 -> weakest, 1 -> full strength.
        let strength = 1. - self.softening_amount * (1. - transitioner.value());

        if self.soften_position {
            profile.position_alpha *= strength;
        }
        if self.soften_rotation {
            profile.rotation_alpha *= strength;
        }
    }
}
