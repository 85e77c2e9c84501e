//! Structural pre-check: is this node set already a valid rooted tree?
//!
//! The answer decides which repair path the pipeline takes. A set that
//! passes every check can be re-rooted by pointer reversal; anything else
//! has to be rebuilt by the cycle breaker.
//!
//! Cycles are found with Tarjan's SCC over the child → parent digraph. Each
//! node has at most one outgoing edge there, so every non-trivial SCC is a
//! simple parent loop.

use std::collections::{HashMap, HashSet};

use neurite_core::{Morphology, MorphologyError, NodeId, RootQuery};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::{debug, instrument};

/// Everything that keeps a node set from being a valid tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiagnostics {
    pub node_count: usize,
    /// Parentless nodes, input order.
    pub roots: Vec<NodeId>,
    /// `(child, missing parent)` pairs.
    pub missing_parents: Vec<(NodeId, NodeId)>,
    pub self_parented: Vec<NodeId>,
    /// Parent loops of two or more nodes, each sorted.
    pub cycles: Vec<Vec<NodeId>>,
    /// Nodes no root reaches by following children, input order.
    pub unreachable: Vec<NodeId>,
}

impl GraphDiagnostics {
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.roots.len() == 1
            && self.missing_parents.is_empty()
            && self.self_parented.is_empty()
            && self.cycles.is_empty()
            && self.unreachable.is_empty()
    }

    /// Convert the first blocking problem into a typed error.
    ///
    /// Returns the single root when the set is a tree.
    ///
    /// # Errors
    ///
    /// Checks in order: missing parents, self-parents and cycles, multiple
    /// roots, no root, unreachable nodes.
    pub fn require_tree(&self) -> Result<NodeId, MorphologyError> {
        if let Some(&(id, parent)) = self.missing_parents.first() {
            return Err(MorphologyError::MalformedGraph { id, parent });
        }
        if let Some(&id) = self.self_parented.first() {
            return Err(MorphologyError::CycleDetected { ids: vec![id] });
        }
        if let Some(cycle) = self.cycles.first() {
            return Err(MorphologyError::CycleDetected { ids: cycle.clone() });
        }
        match self.roots.as_slice() {
            [] => Err(MorphologyError::RootNotFound(RootQuery::Parentless)),
            [root] => {
                if self.unreachable.is_empty() {
                    Ok(*root)
                } else {
                    Err(MorphologyError::Disconnected {
                        root: *root,
                        ids: self.unreachable.clone(),
                    })
                }
            }
            many => Err(MorphologyError::MultipleRoots {
                ids: many.to_vec(),
            }),
        }
    }
}

/// Inspect a node set without modifying it.
#[must_use]
#[instrument(skip_all, fields(nodes = morphology.len()))]
pub fn diagnose(morphology: &Morphology) -> GraphDiagnostics {
    let mut report = GraphDiagnostics {
        node_count: morphology.len(),
        ..GraphDiagnostics::default()
    };

    let mut links: DiGraphMap<NodeId, ()> = DiGraphMap::with_capacity(morphology.len(), morphology.len());
    let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for node in morphology {
        links.add_node(node.id);
        match node.parent {
            None => report.roots.push(node.id),
            Some(parent) if parent == node.id => report.self_parented.push(node.id),
            Some(parent) if !morphology.contains(parent) => {
                report.missing_parents.push((node.id, parent));
            }
            Some(parent) => {
                links.add_edge(node.id, parent, ());
                children.entry(parent).or_default().push(node.id);
            }
        }
    }

    let mut cycles: Vec<Vec<NodeId>> = tarjan_scc(&links)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|mut component| {
            component.sort_unstable();
            component
        })
        .collect();
    cycles.sort_unstable();
    report.cycles = cycles;

    let mut reached: HashSet<NodeId> = HashSet::with_capacity(morphology.len());
    let mut stack: Vec<NodeId> = report.roots.clone();
    while let Some(current) = stack.pop() {
        if !reached.insert(current) {
            continue;
        }
        if let Some(kids) = children.get(&current) {
            stack.extend(kids.iter().copied());
        }
    }
    report.unreachable = morphology
        .ids()
        .filter(|id| !reached.contains(id))
        .collect();

    debug!(
        roots = report.roots.len(),
        cycles = report.cycles.len(),
        unreachable = report.unreachable.len(),
        "diagnosed node set"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::morphology;

    #[test]
    fn clean_tree_passes() {
        let m = morphology(&[(1, -1), (2, 1), (3, 2), (4, 2)]);
        let diag = diagnose(&m);
        assert!(diag.is_tree());
        assert_eq!(diag.require_tree(), Ok(NodeId(1)));
    }

    #[test]
    fn parent_loop_is_reported_with_hanging_nodes_unreachable() {
        // 2 <-> 3 loop, 4 hangs off the loop.
        let m = morphology(&[(1, -1), (2, 3), (3, 2), (4, 3)]);
        let diag = diagnose(&m);

        assert!(!diag.is_tree());
        assert_eq!(diag.cycles, vec![vec![NodeId(2), NodeId(3)]]);
        assert_eq!(diag.unreachable, vec![NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(
            diag.require_tree(),
            Err(MorphologyError::CycleDetected {
                ids: vec![NodeId(2), NodeId(3)]
            })
        );
    }

    #[test]
    fn multiple_roots_are_reported() {
        let m = morphology(&[(1, -1), (2, 1), (5, -1)]);
        let diag = diagnose(&m);
        assert_eq!(diag.roots, vec![NodeId(1), NodeId(5)]);
        assert_eq!(
            diag.require_tree(),
            Err(MorphologyError::MultipleRoots {
                ids: vec![NodeId(1), NodeId(5)]
            })
        );
    }

    #[test]
    fn self_parent_and_missing_parent_are_separate_findings() {
        let m = morphology(&[(1, -1), (2, 2), (3, 42)]);
        let diag = diagnose(&m);
        assert_eq!(diag.self_parented, vec![NodeId(2)]);
        assert_eq!(diag.missing_parents, vec![(NodeId(3), NodeId(42))]);
        assert!(matches!(
            diag.require_tree(),
            Err(MorphologyError::MalformedGraph { .. })
        ));
    }

    #[test]
    fn rootless_set_has_no_root() {
        let m = morphology(&[(1, 2), (2, 1)]);
        let diag = diagnose(&m);
        assert!(diag.roots.is_empty());
        assert!(!diag.is_tree());
    }
}
