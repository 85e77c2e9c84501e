//! Re-rooting a tree by reversing one ancestor chain.
//!
//! # Algorithm
//!
//! Walk upward from the target. At each step remember the node's old parent,
//! point the node at the previously visited node (nothing, for the target),
//! then continue with the old parent. The walk ends at the old root. Every
//! subtree hanging off the reversed path keeps its parent links, so the work
//! is O(path length) plus one copy of the node set.
//!
//! # Edge Cases
//!
//! - Target already the root: output equals input.
//! - A loop on the walked path: [`MorphologyError::CycleDetected`] instead
//!   of walking forever.

use std::collections::HashMap;

use neurite_core::{Morphology, MorphologyError, NodeId, RootQuery};
use tracing::{debug, instrument};

/// Return a copy of `morphology` rooted at `target`.
///
/// The input must already be a single rooted tree; use
/// [`crate::cycles::break_cycles`] for anything else.
///
/// # Errors
///
/// - [`MorphologyError::RootNotFound`] if `target` is not in the set.
/// - [`MorphologyError::MultipleRoots`] if more than one node is parentless.
/// - [`MorphologyError::MalformedGraph`] if the walk meets a missing parent.
/// - [`MorphologyError::CycleDetected`] if the walk revisits a node.
#[instrument(skip(morphology), fields(nodes = morphology.len()))]
pub fn reparent(morphology: &Morphology, target: NodeId) -> Result<Morphology, MorphologyError> {
    if !morphology.contains(target) {
        return Err(MorphologyError::RootNotFound(RootQuery::Id(target)));
    }

    let roots = morphology.roots();
    if roots.len() > 1 {
        return Err(MorphologyError::MultipleRoots { ids: roots });
    }

    let mut rewired: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut path: Vec<NodeId> = Vec::new();
    let mut previous: Option<NodeId> = None;
    let mut current = Some(target);

    while let Some(id) = current {
        let Some(node) = morphology.get(id) else {
            return Err(match previous {
                Some(child) => MorphologyError::MalformedGraph { id: child, parent: id },
                None => MorphologyError::RootNotFound(RootQuery::Id(id)),
            });
        };
        if rewired.insert(id, previous).is_some() {
            let start = path.iter().position(|&seen| seen == id).unwrap_or(0);
            let mut ids = path[start..].to_vec();
            ids.sort_unstable();
            return Err(MorphologyError::CycleDetected { ids });
        }
        path.push(id);
        previous = Some(id);
        current = node.parent;
    }

    debug!(target = %target, reversed = path.len().saturating_sub(1), "reparented");
    Ok(morphology.map_parents(|node| rewired.get(&node.id).copied().unwrap_or(node.parent)))
}
