//! Point-level morphology model.
//!
//! # Overview
//!
//! A morphology is a flat store of [`Node`] records keyed by [`NodeId`]. The
//! store remembers input order, which downstream stages use as their
//! deterministic tie-break (child lists, anchor lookup, renumbering).
//!
//! Nodes are never edited in place: every correction step builds a new
//! [`Morphology`] through [`Morphology::map_parents`] or
//! [`Morphology::filter_map_nodes`], so the original stays
//! available for diffing via [`Morphology::content_hash`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MorphologyError;

// ---------------------------------------------------------------------------
// Identifiers and tags
// ---------------------------------------------------------------------------

/// Identifier of a skeleton point. Always positive once validated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structure type tag carried by each point (SWC type column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum NodeType {
    Undefined,
    Soma,
    Axon,
    Dendrite,
    Apical,
    Custom(u32),
}

impl NodeType {
    /// Decode a numeric type tag.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Undefined,
            1 => Self::Soma,
            2 => Self::Axon,
            3 => Self::Dendrite,
            4 => Self::Apical,
            other => Self::Custom(other),
        }
    }

    /// Numeric type tag as written in point-list files.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Soma => 1,
            Self::Axon => 2,
            Self::Dendrite => 3,
            Self::Apical => 4,
            Self::Custom(code) => code,
        }
    }
}

impl From<u32> for NodeType {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl From<NodeType> for u32 {
    fn from(node_type: NodeType) -> Self {
        node_type.code()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Soma => write!(f, "soma"),
            Self::Axon => write!(f, "axon"),
            Self::Dendrite => write!(f, "dendrite"),
            Self::Apical => write!(f, "apical"),
            Self::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

/// A position in 3-D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns `true` when every coordinate is finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single skeleton point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub position: Point3,
    pub radius: f64,
    /// `None` marks the root (the `-1` sentinel in point-list files).
    pub parent: Option<NodeId>,
}

impl Node {
    #[must_use]
    pub const fn new(
        id: NodeId,
        node_type: NodeType,
        position: Point3,
        radius: f64,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            id,
            node_type,
            position,
            radius,
            parent,
        }
    }

    /// Copy of this node with a different parent.
    #[must_use]
    pub const fn with_parent(self, parent: Option<NodeId>) -> Self {
        Self { parent, ..self }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` when the node names itself as its parent.
    #[must_use]
    pub fn is_self_parented(&self) -> bool {
        self.parent == Some(self.id)
    }
}

// ---------------------------------------------------------------------------
// Morphology
// ---------------------------------------------------------------------------

/// Ordered id → node store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Morphology {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

impl Morphology {
    /// Build a store from nodes in input order.
    ///
    /// # Errors
    ///
    /// Returns [`MorphologyError::Validation`] naming the first id that
    /// appears twice.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, MorphologyError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            if index.insert(node.id, pos).is_some() {
                return Err(MorphologyError::Validation {
                    id: node.id,
                    reason: "duplicate node id".to_string(),
                });
            }
        }
        Ok(Self { nodes, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    /// Parentless nodes, in input order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.is_root())
            .map(|node| node.id)
            .collect()
    }

    /// Number of declared parent links.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_root()).count()
    }

    /// Build a new store from the nodes `f` keeps, transformed. Ids must
    /// stay unique.
    ///
    /// # Errors
    ///
    /// Returns [`MorphologyError::Validation`] if the mapping produces a
    /// duplicate id.
    pub fn filter_map_nodes(
        &self,
        f: impl FnMut(&Node) -> Option<Node>,
    ) -> Result<Self, MorphologyError> {
        Self::from_nodes(self.nodes.iter().filter_map(f).collect())
    }

    /// Build a new store with only the parent column replaced.
    #[must_use]
    pub fn map_parents(&self, mut f: impl FnMut(&Node) -> Option<NodeId>) -> Self {
        let nodes = self
            .nodes
            .iter()
            .map(|node| node.with_parent(f(node)))
            .collect();
        Self {
            nodes,
            index: self.index.clone(),
        }
    }

    /// BLAKE3 fingerprint of the node records, formatted `blake3:<hex>`.
    ///
    /// Input order is part of the fingerprint.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for node in &self.nodes {
            hasher.update(&node.id.0.to_le_bytes());
            hasher.update(&node.node_type.code().to_le_bytes());
            hasher.update(&node.position.x.to_le_bytes());
            hasher.update(&node.position.y.to_le_bytes());
            hasher.update(&node.position.z.to_le_bytes());
            hasher.update(&node.radius.to_le_bytes());
            hasher.update(&node.parent.map_or(0, |p| p.0).to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize())
    }

    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

impl<'a> IntoIterator for &'a Morphology {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
