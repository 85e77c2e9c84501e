//! Dense renumbering: ids become `1..=n` in input order.

use std::collections::HashMap;

use neurite_core::{Morphology, MorphologyError, Node, NodeId};
use tracing::{debug, instrument, warn};

/// A renumbered node set plus the old → new id table.
#[derive(Debug, Clone, PartialEq)]
pub struct Renumbering {
    pub morphology: Morphology,
    mapping: HashMap<NodeId, NodeId>,
}

impl Renumbering {
    /// New id assigned to `old`.
    #[must_use]
    pub fn new_id(&self, old: NodeId) -> Option<NodeId> {
        self.mapping.get(&old).copied()
    }

    /// Returns `true` when no id changed.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.mapping.iter().all(|(old, new)| old == new)
    }
}

/// Assign ids `1..=n` in input order and remap parent references.
///
/// A node naming itself as parent becomes a root (with a warning).
///
/// # Errors
///
/// Returns [`MorphologyError::MalformedGraph`] for a parent id that does not
/// exist in the set.
#[instrument(skip_all, fields(nodes = morphology.len()))]
pub fn renumber(morphology: &Morphology) -> Result<Renumbering, MorphologyError> {
    let mapping: HashMap<NodeId, NodeId> = morphology
        .ids()
        .zip(1_u64..)
        .map(|(old, new)| (old, NodeId(new)))
        .collect();

    let mut nodes = Vec::with_capacity(morphology.len());
    for node in morphology {
        let parent = match node.parent {
            None => None,
            Some(parent) if parent == node.id => {
                warn!(id = %node.id, "self-referential parent cleared during renumbering");
                None
            }
            Some(parent) => Some(*mapping.get(&parent).ok_or(MorphologyError::MalformedGraph {
                id: node.id,
                parent,
            })?),
        };
        let id = mapping.get(&node.id).copied().unwrap_or(node.id);
        nodes.push(Node {
            id,
            parent,
            ..*node
        });
    }

    let renumbered = Morphology::from_nodes(nodes)?;
    let result = Renumbering {
        morphology: renumbered,
        mapping,
    };
    debug!(identity = result.is_identity(), "renumbered");
    Ok(result)
}
