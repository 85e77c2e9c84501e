//! Size summary reported alongside the section list.

use serde::Serialize;

use crate::classify::{Classification, NodeKind};
use crate::segment::Section;

/// Size summary of a segmented tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MorphologyStats {
    pub nodes: usize,
    pub sections: usize,
    pub branch_points: usize,
    pub leaves: usize,
    /// Non-root nodes with exactly one child.
    pub interior: usize,
    /// Longest section path, in nodes.
    pub max_section_len: usize,
}

impl MorphologyStats {
    #[must_use]
    pub fn collect(classes: &Classification, sections: &[Section]) -> Self {
        Self {
            nodes: classes.len(),
            sections: sections.len(),
            branch_points: classes.branch_points().len(),
            leaves: classes.leaves().len(),
            interior: classes.count(NodeKind::Interior),
            max_section_len: sections.iter().map(Section::len).max().unwrap_or(0),
        }
    }
}
