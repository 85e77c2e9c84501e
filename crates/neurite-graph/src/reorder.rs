//! Presentation order for sections.
//!
//! Both strategies guarantee that a section appears after the section it
//! attaches to, and that siblings keep end-id order. They differ only in how
//! subtrees interleave.

use std::collections::HashMap;

use neurite_core::config::OrderStrategy;
use tracing::instrument;

use crate::segment::{Section, SectionId};

/// Order `sections` (as returned by [`crate::segment::segment`]) for
/// emission.
///
/// Sections whose attachment is missing from the slice are treated as
/// top-level, so a filtered slice still comes back complete.
#[must_use]
#[instrument(skip(sections), fields(sections = sections.len()))]
pub fn reorder(sections: &[Section], strategy: OrderStrategy) -> Vec<&Section> {
    let known: HashMap<SectionId, &Section> = sections.iter().map(|s| (s.id, s)).collect();
    let mut sorted: Vec<&Section> = sections.iter().collect();
    sorted.sort_by_key(|s| s.end);

    match strategy {
        OrderStrategy::DepthFirst => depth_first(&sorted, &known),
        OrderStrategy::BreadthFirst => breadth_first(sorted, &known),
    }
}

fn is_top_level(section: &Section, known: &HashMap<SectionId, &Section>) -> bool {
    section.attachment.is_none_or(|owner| !known.contains_key(&owner))
}

fn depth_first<'a>(
    sorted: &[&'a Section],
    known: &HashMap<SectionId, &'a Section>,
) -> Vec<&'a Section> {
    let mut attached: HashMap<SectionId, Vec<&Section>> = HashMap::new();
    let mut tops: Vec<&Section> = Vec::new();
    for &section in sorted {
        match section.attachment {
            Some(owner) if known.contains_key(&owner) => {
                attached.entry(owner).or_default().push(section);
            }
            _ => tops.push(section),
        }
    }

    let mut out = Vec::with_capacity(sorted.len());
    let mut stack: Vec<&Section> = tops.into_iter().rev().collect();
    while let Some(section) = stack.pop() {
        out.push(section);
        if let Some(kids) = attached.get(&section.id) {
            stack.extend(kids.iter().rev().copied());
        }
    }
    out
}

fn breadth_first<'a>(
    mut sorted: Vec<&'a Section>,
    known: &HashMap<SectionId, &'a Section>,
) -> Vec<&'a Section> {
    let mut depths: HashMap<SectionId, usize> = HashMap::with_capacity(sorted.len());
    for &section in &sorted {
        let mut depth = 0;
        let mut cursor = section;
        while !is_top_level(cursor, known) && depth <= known.len() {
            let Some(owner) = cursor.attachment.and_then(|id| known.get(&id)) else {
                break;
            };
            depth += 1;
            cursor = owner;
        }
        depths.insert(section.id, depth);
    }
    // `sort_by_key` is stable, so equal depths keep end-id order.
    sorted.sort_by_key(|s| depths.get(&s.id).copied().unwrap_or(0));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::connectivity::ConnectivityIndex;
    use crate::segment::segment;
    use crate::test_support::morphology;
    use neurite_core::NodeId;

    fn sections_of(rows: &[(u64, i64)]) -> Vec<Section> {
        let index = ConnectivityIndex::build(&morphology(rows)).expect("index");
        let classes = classify(&index).expect("classify");
        segment(&index, &classes).expect("segment")
    }

    fn ends(ordered: &[&Section]) -> Vec<u64> {
        ordered.iter().map(|s| s.end.0).collect()
    }

    // 1 -> 2 (branch) -> {3 (branch) -> {5, 6}, 4}
    const TWO_LEVELS: &[(u64, i64)] = &[(1, -1), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3)];

    #[test]
    fn depth_first_keeps_subtrees_together() {
        let sections = sections_of(TWO_LEVELS);
        let ordered = reorder(&sections, OrderStrategy::DepthFirst);
        assert_eq!(ends(&ordered), vec![2, 3, 5, 6, 4]);
    }

    #[test]
    fn breadth_first_groups_by_depth() {
        let sections = sections_of(TWO_LEVELS);
        let ordered = reorder(&sections, OrderStrategy::BreadthFirst);
        assert_eq!(ends(&ordered), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn every_section_follows_its_attachment() {
        let sections = sections_of(&[(9, -1), (3, 9), (1, 3), (7, 3), (2, 7), (8, 7)]);
        for strategy in [OrderStrategy::DepthFirst, OrderStrategy::BreadthFirst] {
            let ordered = reorder(&sections, strategy);
            assert_eq!(ordered.len(), sections.len());
            for (pos, section) in ordered.iter().enumerate() {
                if let Some(owner) = section.attachment {
                    let owner_pos = ordered
                        .iter()
                        .position(|s| s.id == owner)
                        .expect("owner present");
                    assert!(owner_pos < pos, "{strategy:?}: {} before owner", section.end);
                }
            }
        }
    }

    #[test]
    fn orphaned_slice_entries_become_top_level() {
        let sections = sections_of(TWO_LEVELS);
        let tail: Vec<Section> = sections
            .into_iter()
            .filter(|s| s.end != NodeId(2))
            .collect();
        let ordered = reorder(&tail, OrderStrategy::DepthFirst);
        assert_eq!(ends(&ordered), vec![3, 5, 6, 4]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(reorder(&[], OrderStrategy::DepthFirst).is_empty());
    }
}
