use crate::errors::RagdollError;

/// Shape of a transition curve. Takes the linear elapsed fraction in `[0, 1]`
/// and returns the eased fraction. Assumed monotonic.
pub type Easing = fn(f32) -> f32;

/// A time-driven scalar interpolation state machine, used to smooth parameter
/// changes (profile switches, per-bone power-on ramps).
///
/// While idle the value is pinned to the end value. Starting a transition
/// resets progress to zero; the transitioner then eases towards the end value
/// over the configured length and deactivates itself once it gets there.
pub struct ValueTransitioner {
    start_value: f32,
    end_value: f32,
    easing: Easing,
    t: f32,
    length: f32,
    transitioning: bool,
}

impl ValueTransitioner {
    pub fn new(start_value: f32, end_value: f32) -> Self {
        Self::with_easing(start_value, end_value, |t| t)
    }

    pub fn with_easing(start_value: f32, end_value: f32, easing: Easing) -> Self {
        Self {
            start_value,
            end_value,
            easing,
            t: 1.,
            length: 0.,
            transitioning: false,
        }
    }

    pub fn value(&self) -> f32 {
        let eased = (self.easing)(self.t);
        self.start_value + (self.end_value - self.start_value) * eased
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Starts a transition from the start value. A zero length completes on
    /// the very next update. Negative lengths are a configuration error and
    /// leave the transitioner untouched.
    pub fn start_transition(&mut self, length: f32) -> Result<(), RagdollError> {
        if length < 0. {
            return Err(RagdollError::NegativeTransitionLength(length));
        }

        self.length = length;
        self.t = 0.;
        self.transitioning = true;
        Ok(())
    }

    /// Forces the transitioner to idle, pinned at the end value.
    pub fn end_transition(&mut self) {
        self.t = 1.;
        self.transitioning = false;
    }

    pub fn update(&mut self, dt: f32) {
        if !self.transitioning {
            return;
        }

        if self.length <= 0. {
            self.end_transition();
            return;
        }

        self.t += dt / self.length;
        if self.t >= 1. {
            self.end_transition();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_by_default_at_end_value() {
        let transitioner = ValueTransitioner::new(0., 1.);
        assert!(!transitioner.is_transitioning());
        assert_eq!(transitioner.value(), 1.);
    }

    #[test]
    fn advances_linearly_and_terminates() {
        let mut transitioner = ValueTransitioner::new(0., 1.);
        transitioner.start_transition(2.).unwrap();
        assert_eq!(transitioner.value(), 0.);

        transitioner.update(1.);
        assert_eq!(transitioner.value(), 0.5);
        assert!(transitioner.is_transitioning());

        transitioner.update(1.);
        assert_eq!(transitioner.value(), 1.);
        assert!(!transitioner.is_transitioning());
    }

    #[test]
    fn landing_exactly_on_the_length_goes_idle() {
        let mut transitioner = ValueTransitioner::new(0., 1.);
        transitioner.start_transition(0.5).unwrap();

        transitioner.update(0.5);
        assert_eq!(transitioner.value(), 1.);
        assert!(!transitioner.is_transitioning());
    }

    #[test]
    fn zero_length_completes_on_next_update() {
        let mut transitioner = ValueTransitioner::new(0., 1.);
        transitioner.start_transition(0.).unwrap();
        assert_eq!(transitioner.value(), 0.);

        transitioner.update(0.02);
        assert_eq!(transitioner.value(), 1.);
        assert!(!transitioner.is_transitioning());
    }

    #[test]
    fn negative_length_is_rejected_without_state_change() {
        let mut transitioner = ValueTransitioner::new(0., 1.);
        assert!(matches!(
            transitioner.start_transition(-1.),
            Err(RagdollError::NegativeTransitionLength(_))
        ));
        assert!(!transitioner.is_transitioning());
        assert_eq!(transitioner.value(), 1.);
    }

    #[test]
    fn easing_shapes_the_value() {
        let mut transitioner = ValueTransitioner::with_easing(0., 1., |t| t * t);
        transitioner.start_transition(1.).unwrap();
        transitioner.update(0.5);
        assert_eq!(transitioner.value(), 0.25);
    }

    #[test]
    fn end_transition_pins_to_end_value() {
        let mut transitioner = ValueTransitioner::new(2., 6.);
        transitioner.start_transition(10.).unwrap();
        transitioner.end_transition();
        assert_eq!(transitioner.value(), 6.);
        assert!(!transitioner.is_transitioning());
    }
}
