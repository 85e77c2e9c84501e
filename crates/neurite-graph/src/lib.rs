#![forbid(unsafe_code)]
//! neurite-graph library.
//!
//! Turns a validated point set into a single rooted tree and decomposes that
//! tree into labeled sections.
//!
//! # Stages
//!
//! - [`diagnostics`]: pre-check deciding between the two repair paths.
//! - [`reparent`]: re-root a valid tree by reversing one ancestor chain.
//! - [`cycles`]: rebuild a tree from arbitrary links by undirected DFS.
//! - [`renumber`]: dense `1..=n` ids.
//! - [`connectivity`], [`classify`], [`segment`], [`reorder`], [`emit`]: the
//!   structural description.
//! - [`pipeline`]: all of the above, in order, under stage timing.
//!
//! # Conventions
//!
//! - **Errors**: every stage returns `Result<_, MorphologyError>`.
//! - **Traversal**: explicit stacks only; chains of tens of thousands of
//!   nodes must not grow the call stack.
//! - **Determinism**: ties break on input order or on node id, never on hash
//!   iteration order.

pub mod classify;
pub mod components;
pub mod connectivity;
pub mod cycles;
pub mod diagnostics;
pub mod emit;
pub mod pipeline;
pub mod renumber;
pub mod reorder;
pub mod reparent;
pub mod segment;
pub mod stats;

pub use classify::{Classification, NodeKind, classify};
pub use components::{ComponentReport, components, recolor};
pub use connectivity::ConnectivityIndex;
pub use cycles::{CycleBreak, DroppedLink, break_cycles};
pub use diagnostics::{GraphDiagnostics, diagnose};
pub use emit::{SectionPoint, SiblingCounters, StructureRecord, assign_labels, emit};
pub use pipeline::{Pipeline, PipelineOutput, RepairOutcome, RepairPath, resolve_anchor};
pub use renumber::{Renumbering, renumber};
pub use reorder::reorder;
pub use reparent::reparent;
pub use segment::{Section, SectionId, segment};
pub use stats::MorphologyStats;

#[cfg(test)]
pub(crate) mod test_support {
    use neurite_core::{Morphology, Node, NodeId, NodeType, Point3};

    /// Dendrite points from `(id, parent)` rows; `-1` means no parent.
    /// Each point sits at `x = id` with radius 1.
    pub fn morphology(rows: &[(u64, i64)]) -> Morphology {
        let nodes = rows
            .iter()
            .map(|&(id, parent)| {
                #[allow(clippy::cast_precision_loss)]
                let x = id as f64;
                Node::new(
                    NodeId(id),
                    NodeType::Dendrite,
                    Point3::new(x, 0.0, 0.0),
                    1.0,
                    u64::try_from(parent).ok().map(NodeId),
                )
            })
            .collect();
        Morphology::from_nodes(nodes).expect("test rows have unique ids")
    }

    pub fn parent_of(morphology: &Morphology, id: u64) -> Option<u64> {
        morphology
            .get(NodeId(id))
            .and_then(|node| node.parent)
            .map(|parent| parent.0)
    }
}
