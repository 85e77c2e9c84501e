//! Decomposition of a rooted tree into sections.
//!
//! # Overview
//!
//! A section is a maximal chain of nodes with no branching in its interior.
//! Its two endpoints are structural boundaries: the root, a branch point, or
//! a leaf. Every node whose out-degree is not 1 ends exactly one section and
//! starts one section per child; the root starts the section containing it.
//!
//! # Algorithm
//!
//! Iterative DFS over `(current, section_start)` pairs seeded with
//! `(root, root)`:
//!
//! ```text
//! pop (n, s)
//!   out-degree(n) == 1  → push (child, s)            carry the open section
//!   otherwise           → close {s..n}; push (c, n)  for every child c
//! ```
//!
//! An explicit stack keeps chains of thousands of nodes off the call stack.
//! Paths are recovered afterwards by walking parent links from `end` back to
//! `start`, since ids need not increase along a path after re-rooting.
//!
//! # Ordering
//!
//! Sections are sorted by `end` id ascending and numbered in that order.
//! Ends are unique, so the order is total and independent of stack order.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};
use std::fmt;

use neurite_core::{MorphologyError, NodeId};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::classify::Classification;
use crate::connectivity::ConnectivityIndex;

/// Position of a section in end-id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A maximal unbranched chain `start ..= end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub start: NodeId,
    pub end: NodeId,
    /// Node ids from `start` to `end`, both included.
    pub path: Vec<NodeId>,
    /// Section whose `end` is this section's `start`; `None` for the section
    /// containing the root.
    pub attachment: Option<SectionId>,
}

impl Section {
    /// Number of nodes on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    #[must_use]
    pub const fn is_root_section(&self) -> bool {
        self.attachment.is_none()
    }

    /// Nodes strictly between `start` and `end`.
    #[must_use]
    pub fn interior(&self) -> &[NodeId] {
        if self.path.len() <= 2 {
            return &[];
        }
        &self.path[1..self.path.len() - 1]
    }
}

/// Split the classified tree into sections sorted by end id.
///
/// An empty classification yields no sections.
///
/// # Errors
///
/// Returns [`MorphologyError::Disconnected`] if the index holds nodes the
/// root cannot reach (the input was not a single tree).
#[instrument(skip_all, fields(nodes = index.len()))]
pub fn segment(
    index: &ConnectivityIndex,
    classes: &Classification,
) -> Result<Vec<Section>, MorphologyError> {
    let Some(root) = classes.root() else {
        return Ok(Vec::new());
    };

    let mut bounds: Vec<(NodeId, NodeId)> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(index.len());
    let mut stack: Vec<(NodeId, NodeId)> = vec![(root, root)];

    while let Some((current, start)) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        match index.children(current) {
            [only] if !classes.ends_section(current) => stack.push((*only, start)),
            children => {
                bounds.push((start, current));
                stack.extend(children.iter().rev().map(|&child| (child, current)));
            }
        }
    }

    if visited.len() != index.len() {
        let ids = index
            .node_ids()
            .iter()
            .copied()
            .filter(|id| !visited.contains(id))
            .collect();
        return Err(MorphologyError::Disconnected { root, ids });
    }

    bounds.sort_unstable_by_key(|&(_, end)| end);
    let by_end: HashMap<NodeId, SectionId> = bounds
        .iter()
        .enumerate()
        .map(|(pos, &(_, end))| (end, SectionId(pos)))
        .collect();

    let sections: Vec<Section> = bounds
        .into_iter()
        .enumerate()
        .map(|(pos, (start, end))| {
            let id = SectionId(pos);
            Section {
                id,
                start,
                end,
                path: trace_path(index, start, end),
                attachment: by_end.get(&start).copied().filter(|&owner| owner != id),
            }
        })
        .collect();

    debug!(sections = sections.len(), "segmented tree");
    Ok(sections)
}

/// Walk parents from `end` up to `start`, then flip to start-first order.
fn trace_path(index: &ConnectivityIndex, start: NodeId, end: NodeId) -> Vec<NodeId> {
    let mut path = vec![end];
    let mut cursor = end;
    while cursor != start {
        let Some(parent) = index.parent(cursor) else {
            break;
        };
        path.push(parent);
        cursor = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::test_support::morphology;

    fn sections_of(rows: &[(u64, i64)]) -> Vec<Section> {
        let index = ConnectivityIndex::build(&morphology(rows)).expect("index");
        let classes = classify(&index).expect("classify");
        segment(&index, &classes).expect("segment")
    }

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn seven_node_tree_yields_three_sections() {
        // 1 -> 2 -> 3, 3 -> 4 -> 6, 3 -> 5 -> 7
        let sections = sections_of(&[(1, -1), (2, 1), (3, 2), (4, 3), (5, 3), (6, 4), (7, 5)]);

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].path, ids(&[1, 2, 3]));
        assert_eq!(sections[1].path, ids(&[3, 4, 6]));
        assert_eq!(sections[2].path, ids(&[3, 5, 7]));
        assert_eq!(sections[0].attachment, None);
        assert_eq!(sections[1].attachment, Some(SectionId(0)));
        assert_eq!(sections[2].attachment, Some(SectionId(0)));
    }

    #[test]
    fn branching_root_gets_single_node_section() {
        let sections = sections_of(&[(1, -1), (2, 1), (3, 1)]);

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].path, ids(&[1]));
        assert_eq!(sections[0].attachment, None);
        assert_eq!(sections[1].path, ids(&[1, 2]));
        assert_eq!(sections[1].attachment, Some(SectionId(0)));
        assert_eq!(sections[2].attachment, Some(SectionId(0)));
    }

    #[test]
    fn lone_root_is_one_section() {
        let sections = sections_of(&[(4, -1)]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start, NodeId(4));
        assert_eq!(sections[0].end, NodeId(4));
        assert!(sections[0].is_root_section());
    }

    #[test]
    fn non_monotonic_ids_keep_path_order() {
        // Root 9 -> 2 -> 7 -> 1 (leaf): one section, path follows the tree.
        let sections = sections_of(&[(1, 7), (2, 9), (7, 2), (9, -1)]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].path, ids(&[9, 2, 7, 1]));
        assert_eq!(sections[0].interior(), ids(&[2, 7]).as_slice());
    }

    #[test]
    fn attachment_can_point_to_a_larger_section_id() {
        // Root 1 -> 50 (branch) -> {3, 4}: the stem ends at 50, so it sorts
        // after the children.
        let sections = sections_of(&[(1, -1), (50, 1), (3, 50), (4, 50)]);
        assert_eq!(sections.iter().map(|s| s.end).collect::<Vec<_>>(), ids(&[3, 4, 50]));
        assert_eq!(sections[0].attachment, Some(SectionId(2)));
        assert_eq!(sections[2].attachment, None);
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let mut rows = vec![(1, -1)];
        rows.extend((2..=50_000_u64).map(|id| (id, i64::try_from(id - 1).expect("fits"))));
        let sections = sections_of(&rows);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].len(), 50_000);
    }

    #[test]
    fn unreachable_nodes_are_reported() {
        let m = morphology(&[(1, -1), (2, 1), (3, 4), (4, 3)]);
        let index = ConnectivityIndex::build(&m).expect("index");
        let classes = classify(&index).expect("one root");
        assert_eq!(
            segment(&index, &classes),
            Err(MorphologyError::Disconnected {
                root: NodeId(1),
                ids: ids(&[3, 4])
            })
        );
    }

    #[test]
    fn empty_tree_has_no_sections() {
        let classes = classify(&ConnectivityIndex::default()).expect("classify");
        let sections = segment(&ConnectivityIndex::default(), &classes).expect("segment");
        assert!(sections.is_empty());
    }
}
