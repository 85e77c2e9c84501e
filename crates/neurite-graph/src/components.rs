//! Connected components seeded from parentless nodes.
//!
//! Each root, in input order, claims every node reachable through its child
//! links. Nodes no root reaches (parent loops detached from any root, or
//! nodes whose parent is missing) are reported as orphans.

use std::collections::HashMap;

use neurite_core::{Morphology, MorphologyError, Node, NodeId, NodeType};
use serde::Serialize;
use tracing::{debug, instrument};

/// One tree of the forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// 0-based, in root input order.
    pub ordinal: usize,
    pub root: NodeId,
    pub size: usize,
}

/// Component membership for every node of a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentReport {
    pub components: Vec<Component>,
    /// Nodes no root reaches, input order.
    pub orphans: Vec<NodeId>,
    #[serde(skip)]
    membership: HashMap<NodeId, usize>,
}

impl ComponentReport {
    /// Ordinal of the component containing `id`; `None` for orphans.
    #[must_use]
    pub fn component_of(&self, id: NodeId) -> Option<usize> {
        self.membership.get(&id).copied()
    }

    #[must_use]
    pub fn is_single_tree(&self) -> bool {
        self.components.len() == 1 && self.orphans.is_empty()
    }
}

/// Label every node with the component of the root that reaches it.
#[must_use]
#[instrument(skip_all, fields(nodes = morphology.len()))]
pub fn components(morphology: &Morphology) -> ComponentReport {
    let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for node in morphology {
        if let Some(parent) = node.parent.filter(|&p| p != node.id) {
            children.entry(parent).or_default().push(node.id);
        }
    }

    let mut membership: HashMap<NodeId, usize> = HashMap::with_capacity(morphology.len());
    let mut found = Vec::new();

    for (ordinal, root) in morphology.roots().into_iter().enumerate() {
        let mut size = 0;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if membership.contains_key(&current) {
                continue;
            }
            membership.insert(current, ordinal);
            size += 1;
            if let Some(kids) = children.get(&current) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        found.push(Component {
            ordinal,
            root,
            size,
        });
    }

    let orphans: Vec<NodeId> = morphology
        .ids()
        .filter(|id| !membership.contains_key(id))
        .collect();

    debug!(components = found.len(), orphans = orphans.len(), "labeled components");
    ComponentReport {
        components: found,
        orphans,
        membership,
    }
}

/// Copy of `morphology` with each node's type replaced by its component
/// ordinal. Orphans are left out.
///
/// A node reached from a root has a parent reached from the same root, so
/// dropping orphans never leaves a dangling parent reference.
///
/// # Errors
///
/// Propagates [`MorphologyError::Validation`] from rebuilding the store;
/// ids are untouched, so this only fails on an already-invalid set.
pub fn recolor(
    morphology: &Morphology,
    report: &ComponentReport,
) -> Result<Morphology, MorphologyError> {
    morphology.filter_map_nodes(|node| {
        let ordinal = u32::try_from(report.component_of(node.id)?).ok()?;
        Some(Node {
            node_type: NodeType::from_code(ordinal),
            ..*node
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::morphology;

    #[test]
    fn forest_components_follow_root_order() {
        let m = morphology(&[(1, -1), (2, 1), (10, -1), (11, 10), (12, 11), (3, 2)]);
        let report = components(&m);

        assert_eq!(
            report.components,
            vec![
                Component { ordinal: 0, root: NodeId(1), size: 3 },
                Component { ordinal: 1, root: NodeId(10), size: 3 },
            ]
        );
        assert_eq!(report.component_of(NodeId(3)), Some(0));
        assert_eq!(report.component_of(NodeId(12)), Some(1));
        assert!(report.orphans.is_empty());
        assert!(!report.is_single_tree());
    }

    #[test]
    fn detached_loops_are_orphans() {
        let m = morphology(&[(1, -1), (2, 1), (3, 4), (4, 3), (5, 4)]);
        let report = components(&m);
        assert_eq!(report.components.len(), 1);
        assert_eq!(report.orphans, vec![NodeId(3), NodeId(4), NodeId(5)]);
        assert_eq!(report.component_of(NodeId(5)), None);
    }

    #[test]
    fn single_tree_is_recognized() {
        let report = components(&morphology(&[(1, -1), (2, 1), (3, 1)]));
        assert!(report.is_single_tree());
    }

    #[test]
    fn recolor_writes_ordinals_into_type() {
        let m = morphology(&[(1, -1), (2, 1), (5, -1), (6, 6)]);
        let report = components(&m);
        let colored = recolor(&m, &report).expect("recolor");

        let types: Vec<u32> = colored.iter().map(|n| n.node_type.code()).collect();
        assert_eq!(types, vec![0, 0, 1]);
        // 6 is self-parented: neither a root nor reachable.
        assert!(!colored.contains(NodeId(6)));
    }

    #[test]
    fn recolor_drops_detached_loops() {
        let m = morphology(&[(1, -1), (2, 1), (3, 4), (4, 3), (5, 4)]);
        let colored = recolor(&m, &components(&m)).expect("recolor");
        assert_eq!(colored.ids().collect::<Vec<_>>(), vec![NodeId(1), NodeId(2)]);
        assert_eq!(colored.roots(), vec![NodeId(1)]);
    }
}
