//! Typed failures for the morphology engine.
//!
//! Every variant names the node id(s) at fault so a caller can point a human
//! at the offending rows. [`ErrorCode`] gives each kind a stable `E####`
//! identifier plus a remediation hint for terminal and JSON output.

use std::fmt;

use crate::model::{NodeId, NodeType};

/// What the engine was looking for when it failed to find a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootQuery {
    /// An explicit node id (reparent target).
    Id(NodeId),
    /// The first node carrying this type tag (anchor lookup).
    Type(NodeType),
    /// A parentless node in a graph that should already be rooted.
    Parentless,
}

impl fmt::Display for RootQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "no node with id {id}"),
            Self::Type(node_type) => {
                write!(f, "no node of type {} ({node_type})", node_type.code())
            }
            Self::Parentless => write!(f, "no node without a parent"),
        }
    }
}

/// Errors raised while loading, repairing, or segmenting a morphology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MorphologyError {
    /// A text row could not be decoded into a node record.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A node violates a field constraint (radius, id, position, uniqueness).
    #[error("node {id}: {reason}")]
    Validation { id: NodeId, reason: String },

    /// A node's parent reference points at a node that does not exist.
    #[error("node {id} references missing parent {parent}")]
    MalformedGraph { id: NodeId, parent: NodeId },

    /// The requested root or anchor could not be located.
    #[error("root not found: {0}")]
    RootNotFound(RootQuery),

    /// Nodes left undiscovered after traversing from the chosen root.
    #[error("{} node(s) unreachable from root {root}: {}", .ids.len(), join_ids(.ids))]
    Disconnected { root: NodeId, ids: Vec<NodeId> },

    /// More than one parentless node in an input that must already be a tree.
    #[error("multiple root nodes: {}", join_ids(.ids))]
    MultipleRoots { ids: Vec<NodeId> },

    /// Parent links loop back on themselves where a tree was required.
    #[error("parent cycle through nodes: {}", join_ids(.ids))]
    CycleDetected { ids: Vec<NodeId> },
}

impl MorphologyError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ParseFailed,
            Self::Validation { .. } => ErrorCode::InvalidNode,
            Self::MalformedGraph { .. } => ErrorCode::MissingParent,
            Self::RootNotFound(_) => ErrorCode::RootNotFound,
            Self::Disconnected { .. } => ErrorCode::Disconnected,
            Self::MultipleRoots { .. } => ErrorCode::MultipleRoots,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }

    /// Node ids named by this error, in the order they were reported.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        match self {
            Self::Parse { .. } => Vec::new(),
            Self::Validation { id, .. } => vec![*id],
            Self::MalformedGraph { id, parent } => vec![*id, *parent],
            Self::RootNotFound(RootQuery::Id(id)) => vec![*id],
            Self::RootNotFound(_) => Vec::new(),
            Self::Disconnected { ids, .. }
            | Self::MultipleRoots { ids }
            | Self::CycleDetected { ids } => ids.clone(),
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseFailed,
    ConfigParseError,
    InvalidNode,
    MissingParent,
    RootNotFound,
    Disconnected,
    MultipleRoots,
    CycleDetected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ParseFailed => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidNode => "E2001",
            Self::MissingParent => "E2002",
            Self::RootNotFound => "E2003",
            Self::Disconnected => "E3001",
            Self::MultipleRoots => "E3002",
            Self::CycleDetected => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ParseFailed => "Malformed point row",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidNode => "Node violates a field constraint",
            Self::MissingParent => "Parent reference to a missing node",
            Self::RootNotFound => "Root or anchor not found",
            Self::Disconnected => "Nodes unreachable from the root",
            Self::MultipleRoots => "More than one root node",
            Self::CycleDetected => "Parent links form a cycle",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ParseFailed => {
                Some("Each row needs 7 fields: id type x y z radius parent (-1 for none).")
            }
            Self::ConfigParseError => Some("Fix syntax in .neurite/config.toml and retry."),
            Self::InvalidNode => Some("Radii must be positive and ids unique and non-zero."),
            Self::MissingParent => Some("Fix the parent column or run `neurite renumber` on the source."),
            Self::RootNotFound => Some("Pass --anchor ID or set [anchor] node_type in the config."),
            Self::Disconnected => {
                Some("Attach or delete the listed nodes; run `neurite components` to inspect.")
            }
            Self::MultipleRoots => Some("Run `neurite repair` to rebuild the tree from one anchor."),
            Self::CycleDetected => Some("Run `neurite repair` to break parent cycles."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
