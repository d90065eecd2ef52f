use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};

/// Name of a bone within one ragdoll definition. Equality is name equality;
/// used as the key of every per-bone table.
#[derive(
    Reflect, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[reflect(Default)]
pub struct BoneName(String);

impl BoneName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BoneName {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BoneName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for BoneName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for BoneName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
