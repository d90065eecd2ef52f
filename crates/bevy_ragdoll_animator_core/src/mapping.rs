//! One-time structural matching between the target animated hierarchy and the
//! simulated skeleton's bone set.

use bevy::platform::collections::HashSet;

use crate::{
    definition::{RagdollBindings, RagdollDefinition},
    errors::RagdollError,
    id::BoneName,
    target_skeleton::{TargetNodeId, TargetSkeleton},
};

/// One emitted correspondence: a simulated bone and the target node that
/// animates it. Read-only after construction.
#[derive(Debug, Clone)]
pub struct BonePairing {
    pub bone: BoneName,
    pub is_root: bool,
    pub target: TargetNodeId,
}

/// Builds the ordered correspondence list by walking the target hierarchy
/// depth-first from the node matching the definition's root bone.
///
/// Matching is name-equality based, case-sensitive and first-match-wins: every
/// emitted pairing names a distinct simulated bone. Target nodes without a
/// bound bone (visual-only helpers) are descended through but emit nothing,
/// and simulated bones absent from the target hierarchy are silently omitted;
/// they receive no animated-pose forcing.
pub fn map_target_to_ragdoll(
    definition: &RagdollDefinition,
    bindings: &RagdollBindings,
    target: &TargetSkeleton,
) -> Result<Vec<BonePairing>, RagdollError> {
    bindings.validate_against(definition)?;

    let root = target
        .find_by_name(definition.root().as_str())
        .ok_or_else(|| RagdollError::RootBoneNotMatched(definition.root().clone()))?;

    let mut pairings = Vec::with_capacity(definition.bone_count());
    let mut claimed: HashSet<BoneName> = HashSet::default();

    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        let bone = BoneName::from(target.name(node));

        if definition.contains(&bone) && !claimed.contains(&bone) {
            pairings.push(BonePairing {
                is_root: definition.is_root(&bone),
                target: node,
                bone: bone.clone(),
            });
            claimed.insert(bone);
        }

        // Descend regardless of match, to support intermediate non-bone nodes.
        pending.extend(target.children(node).iter().rev());
    }

    Ok(pairings)
}
