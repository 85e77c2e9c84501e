//! Parent → children adjacency built from declared parent links.
//!
//! Child lists keep input order so every traversal built on top of the
//! index visits siblings deterministically.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use neurite_core::{Morphology, MorphologyError, NodeId};
use tracing::instrument;

/// Child lists, out-degrees and parent lookup for a node set.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityIndex {
    children: HashMap<NodeId, Vec<NodeId>>,
    parents: HashMap<NodeId, NodeId>,
    roots: Vec<NodeId>,
    order: Vec<NodeId>,
}

impl ConnectivityIndex {
    /// Index every declared parent link in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`MorphologyError::MalformedGraph`] for the first node whose
    /// parent id is not in the set.
    #[instrument(skip_all, fields(nodes = morphology.len()))]
    pub fn build(morphology: &Morphology) -> Result<Self, MorphologyError> {
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::with_capacity(morphology.len());
        let mut parents = HashMap::with_capacity(morphology.len());
        let mut roots = Vec::new();
        let mut order = Vec::with_capacity(morphology.len());

        for node in morphology {
            order.push(node.id);
            match node.parent {
                None => roots.push(node.id),
                Some(parent) => {
                    if !morphology.contains(parent) {
                        return Err(MorphologyError::MalformedGraph {
                            id: node.id,
                            parent,
                        });
                    }
                    children.entry(parent).or_default().push(node.id);
                    parents.insert(node.id, parent);
                }
            }
        }

        Ok(Self {
            children,
            parents,
            roots,
            order,
        })
    }

    /// Children of `id` in input order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn out_degree(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Parentless nodes in input order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All indexed ids in input order.
    #[must_use]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// id → out-degree for every indexed node.
    #[must_use]
    pub fn degree_map(&self) -> HashMap<NodeId, usize> {
        self.order
            .iter()
            .map(|&id| (id, self.out_degree(id)))
            .collect()
    }
}
