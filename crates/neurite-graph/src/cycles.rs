//! Rebuilding a rooted tree from inconsistent parent links.
//!
//! # Algorithm
//!
//! Every declared parent/child pair becomes one undirected edge (duplicates
//! and opposite declarations collapse into the same edge; self-loops are
//! dropped). An iterative DFS from the chosen root marks nodes discovered on
//! push and records the discovering node as the new parent. Edges leading to
//! an already-discovered node are never followed, which is exactly what
//! breaks the cycles: only edges used by the traversal survive.
//!
//! Anything the traversal cannot reach fails the run with
//! [`MorphologyError::Disconnected`]; a morphology missing part of its
//! attachment is not safe to interpret.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use neurite_core::{Morphology, MorphologyError, NodeId, RootQuery};
use petgraph::graphmap::UnGraphMap;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Result of a successful rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleBreak {
    /// Corrected node set, input order preserved.
    pub morphology: Morphology,
    /// Declared `(parent, child)` links that did not survive.
    pub dropped: Vec<DroppedLink>,
    /// Nodes that named themselves as parent.
    pub self_loops: Vec<NodeId>,
}

/// A declared parent link discarded by the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DroppedLink {
    pub parent: NodeId,
    pub child: NodeId,
}

/// Rebuild `morphology` as a tree rooted at `root`.
///
/// # Errors
///
/// - [`MorphologyError::RootNotFound`] if `root` is not in the set.
/// - [`MorphologyError::MalformedGraph`] if a parent id does not exist.
/// - [`MorphologyError::Disconnected`] listing every node (input order) the
///   traversal could not reach.
#[instrument(skip(morphology), fields(nodes = morphology.len()))]
pub fn break_cycles(morphology: &Morphology, root: NodeId) -> Result<CycleBreak, MorphologyError> {
    if !morphology.contains(root) {
        return Err(MorphologyError::RootNotFound(RootQuery::Id(root)));
    }

    let mut graph: UnGraphMap<NodeId, ()> =
        UnGraphMap::with_capacity(morphology.len(), morphology.len());
    let mut self_loops = Vec::new();

    for node in morphology {
        graph.add_node(node.id);
    }
    for node in morphology {
        let Some(parent) = node.parent else { continue };
        if parent == node.id {
            warn!(id = %node.id, "dropping self-loop; node becomes a root candidate");
            self_loops.push(node.id);
            continue;
        }
        if !morphology.contains(parent) {
            return Err(MorphologyError::MalformedGraph {
                id: node.id,
                parent,
            });
        }
        graph.add_edge(parent, node.id, ());
    }

    let mut new_parent: HashMap<NodeId, Option<NodeId>> = HashMap::with_capacity(morphology.len());
    let mut discovered: HashSet<NodeId> = HashSet::with_capacity(morphology.len());
    let mut stack = vec![root];
    discovered.insert(root);
    new_parent.insert(root, None);

    while let Some(current) = stack.pop() {
        for neighbor in graph.neighbors(current) {
            if discovered.insert(neighbor) {
                new_parent.insert(neighbor, Some(current));
                stack.push(neighbor);
            }
        }
    }

    let unreachable: Vec<NodeId> = morphology
        .ids()
        .filter(|id| !discovered.contains(id))
        .collect();
    if !unreachable.is_empty() {
        return Err(MorphologyError::Disconnected {
            root,
            ids: unreachable,
        });
    }

    let dropped: Vec<DroppedLink> = morphology
        .iter()
        .filter_map(|node| {
            let parent = node.parent.filter(|&p| p != node.id)?;
            let kept = new_parent.get(&node.id) == Some(&Some(parent))
                || new_parent.get(&parent) == Some(&Some(node.id));
            (!kept).then_some(DroppedLink {
                parent,
                child: node.id,
            })
        })
        .collect();

    debug!(root = %root, dropped = dropped.len(), "rebuilt tree");

    let corrected = morphology.map_parents(|node| new_parent.get(&node.id).copied().flatten());
    Ok(CycleBreak {
        morphology: corrected,
        dropped,
        self_loops,
    })
}
