//! Field-level validation and unambiguous auto-corrections.
//!
//! Structural checks (roots, cycles, reachability) live in the graph crate;
//! this module only looks at one node at a time.

use tracing::warn;

use crate::error::MorphologyError;
use crate::model::{Morphology, NodeId};

/// Reject nodes whose fields break the point constraints.
///
/// Checks, in input order: id is non-zero, position is finite, radius is
/// finite and strictly positive. Id uniqueness is already enforced by
/// [`Morphology::from_nodes`].
///
/// # Errors
///
/// Returns [`MorphologyError::Validation`] for the first offending node.
pub fn validate_fields(morphology: &Morphology) -> Result<(), MorphologyError> {
    for node in morphology {
        if node.id.0 == 0 {
            return Err(invalid(node.id, "node id must be positive"));
        }
        if !node.position.is_finite() {
            return Err(invalid(node.id, "position is not finite"));
        }
        if !node.radius.is_finite() || node.radius <= 0.0 {
            return Err(invalid(
                node.id,
                &format!("radius must be positive, got {}", node.radius),
            ));
        }
    }
    Ok(())
}

/// Replace self-referential parents with "no parent".
///
/// A node naming itself as parent is a common encoding slip, so it is
/// corrected with a warning instead of failing the run. Returns the new
/// store and the ids that were rewritten.
#[must_use]
pub fn correct_self_parents(morphology: &Morphology) -> (Morphology, Vec<NodeId>) {
    let mut corrected = Vec::new();
    let fixed = morphology.map_parents(|node| {
        if node.is_self_parented() {
            warn!(id = %node.id, "node lists itself as parent; treating it as a root");
            corrected.push(node.id);
            None
        } else {
            node.parent
        }
    });
    (fixed, corrected)
}

fn invalid(id: NodeId, reason: &str) -> MorphologyError {
    MorphologyError::Validation {
        id,
        reason: reason.to_string(),
    }
}
