//! Root / branch / interior / leaf labeling from out-degree.

use std::collections::HashMap;

use neurite_core::{MorphologyError, NodeId, RootQuery};
use serde::Serialize;

use crate::connectivity::ConnectivityIndex;

/// Structural role of a node in a rooted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Branch,
    Interior,
    Leaf,
}

/// Per-node roles plus the out-degrees they were derived from.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    root: Option<NodeId>,
    kinds: HashMap<NodeId, NodeKind>,
    degrees: HashMap<NodeId, usize>,
    order: Vec<NodeId>,
}

/// Classify every indexed node.
///
/// The parentless node is `Root` whatever its degree; other nodes are
/// `Leaf` (0 children), `Interior` (1) or `Branch` (2+).
///
/// # Errors
///
/// On a non-empty index: [`MorphologyError::RootNotFound`] when no node is
/// parentless, [`MorphologyError::MultipleRoots`] when several are.
pub fn classify(index: &ConnectivityIndex) -> Result<Classification, MorphologyError> {
    if index.is_empty() {
        return Ok(Classification::default());
    }

    let root = match index.roots() {
        [] => return Err(MorphologyError::RootNotFound(RootQuery::Parentless)),
        [root] => *root,
        many => {
            return Err(MorphologyError::MultipleRoots {
                ids: many.to_vec(),
            });
        }
    };

    let degrees = index.degree_map();
    let kinds = index
        .node_ids()
        .iter()
        .map(|&id| {
            let kind = if id == root {
                NodeKind::Root
            } else {
                match degrees.get(&id).copied().unwrap_or(0) {
                    0 => NodeKind::Leaf,
                    1 => NodeKind::Interior,
                    _ => NodeKind::Branch,
                }
            };
            (id, kind)
        })
        .collect();

    Ok(Classification {
        root: Some(root),
        kinds,
        degrees,
        order: index.node_ids().to_vec(),
    })
}

impl Classification {
    /// The tree's root; `None` only for an empty node set.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.kinds.get(&id).copied()
    }

    /// Number of nodes classified as `kind`.
    #[must_use]
    pub fn count(&self, kind: NodeKind) -> usize {
        self.order
            .iter()
            .filter(|&&id| self.kind(id) == Some(kind))
            .count()
    }

    #[must_use]
    pub fn out_degree(&self, id: NodeId) -> usize {
        self.degrees.get(&id).copied().unwrap_or(0)
    }

    /// A node closes a section unless it has exactly one child.
    ///
    /// This holds for the root too: a root with one child only starts a
    /// section, a branching or childless root also ends one.
    #[must_use]
    pub fn ends_section(&self, id: NodeId) -> bool {
        self.out_degree(id) != 1
    }

    /// Nodes with two or more children (the root included), input order.
    #[must_use]
    pub fn branch_points(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.out_degree(id) >= 2)
            .collect()
    }

    /// Childless nodes (a lone root included), input order.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.out_degree(id) == 0)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
