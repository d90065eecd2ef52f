use bevy::reflect::Reflect;

/// Index of a node within one [`TargetSkeleton`].
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetNodeId(usize);

impl TargetNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Reflect, Debug, Clone)]
struct TargetNode {
    name: String,
    parent: Option<TargetNodeId>,
    children: Vec<TargetNodeId>,
}

/// Structural snapshot of the target animated transform hierarchy, taken once
/// at initialization. Only names and parent/child structure are captured;
/// poses are sampled separately every step.
#[derive(Reflect, Debug, Clone)]
pub struct TargetSkeleton {
    nodes: Vec<TargetNode>,
    root: TargetNodeId,
}

impl TargetSkeleton {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![TargetNode {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
            }],
            root: TargetNodeId(0),
        }
    }

    pub fn add_node(&mut self, parent: TargetNodeId, name: impl Into<String>) -> TargetNodeId {
        let id = TargetNodeId(self.nodes.len());
        self.nodes.push(TargetNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> TargetNodeId {
        self.root
    }

    pub fn name(&self, id: TargetNodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: TargetNodeId) -> Option<TargetNodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: TargetNodeId) -> &[TargetNodeId] {
        &self.nodes[id.0].children
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth-first preorder search for the first node with the given name.
    /// Matching is case-sensitive.
    pub fn find_by_name(&self, name: &str) -> Option<TargetNodeId> {
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            if self.name(id) == name {
                return Some(id);
            }
            // Reverse keeps preorder (first child visited first).
            pending.extend(self.children(id).iter().rev());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_name_is_first_match_preorder() {
        let mut skeleton = TargetSkeleton::new("root");
        let left = skeleton.add_node(skeleton.root(), "left");
        let twin_a = skeleton.add_node(left, "twin");
        let right = skeleton.add_node(skeleton.root(), "right");
        let _twin_b = skeleton.add_node(right, "twin");

        assert_eq!(skeleton.find_by_name("twin"), Some(twin_a));
        assert_eq!(skeleton.find_by_name("missing"), None);
        assert_eq!(skeleton.parent(twin_a), Some(left));
    }
}
