use thiserror::Error;

use crate::id::BoneName;

/// Precondition violations raised at construction or assignment boundaries.
/// These represent configuration errors and are never retried; per-step numeric
/// degeneracies (such as `dt <= 0`) are absorbed locally instead.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RagdollError {
    #[error("bone {0:?} is part of the ragdoll definition but has no binding")]
    MissingBoneBinding(BoneName),
    #[error("profile overrides bone {bone:?}, which is not part of the ragdoll definition")]
    IncompatibleProfile { bone: BoneName },
    #[error("root bone {0:?} was not found in the target hierarchy")]
    RootBoneNotMatched(BoneName),
    #[error("root bone {0:?} is not part of the definition's bone list")]
    RootNotInDefinition(BoneName),
    #[error("parameter {parameter} is out of range: {value}")]
    ParameterOutOfRange { parameter: &'static str, value: f32 },
    #[error("tried to perform a transition with negative length ({0})")]
    NegativeTransitionLength(f32),
    #[error("step input covers {got} bones, but the animator drives {expected}")]
    PairCountMismatch { expected: usize, got: usize },
}
