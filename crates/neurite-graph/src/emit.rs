//! Lineage labels and the final structure records.
//!
//! # Labels
//!
//! The root section takes the configured root label (`soma`). A section
//! attached to the root section is `<child_prefix><n>` (`d1`, `d2`, …); any
//! deeper section is `<owner label><separator><n>` (`d1,1`, `d1,2`, …). `n`
//! counts siblings under the same owner in emission order, starting at 1.
//!
//! The sibling counters live in [`SiblingCounters`], passed in and handed
//! back by [`assign_labels`] so a caller labeling several trees in sequence
//! decides whether numbering continues or restarts.

use std::collections::HashMap;

use neurite_core::config::LabelConfig;
use neurite_core::{Morphology, MorphologyError, NodeId};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::segment::{Section, SectionId};

/// Per-owner sibling counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingCounters(HashMap<SectionId, u32>);

impl SiblingCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the counter for `owner` and return the new value.
    fn next(&mut self, owner: SectionId) -> u32 {
        let counter = self.0.entry(owner).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Children numbered so far under `owner`.
    #[must_use]
    pub fn count(&self, owner: SectionId) -> u32 {
        self.0.get(&owner).copied().unwrap_or(0)
    }
}

/// One output point. `diameter` is twice the node radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub diameter: f64,
}

/// One emitted section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureRecord {
    pub label: String,
    /// Section id (end-id order).
    pub index: usize,
    /// Index of the section this one attaches to.
    pub attachment: Option<usize>,
    pub start: NodeId,
    pub end: NodeId,
    pub points: Vec<SectionPoint>,
}

/// Assign a label to every section of `ordered`, in order.
///
/// Owners must precede their children in `ordered` (which
/// [`crate::reorder::reorder`] guarantees); a section whose owner has not
/// been labeled yet is treated as a root section.
#[must_use]
pub fn assign_labels(
    ordered: &[&Section],
    labels: &LabelConfig,
    mut counters: SiblingCounters,
) -> (Vec<String>, SiblingCounters) {
    let mut assigned: HashMap<SectionId, (String, bool)> = HashMap::with_capacity(ordered.len());
    let mut out = Vec::with_capacity(ordered.len());

    for section in ordered {
        let owner = section
            .attachment
            .and_then(|owner| assigned.get(&owner).map(|(label, is_root)| (owner, label, *is_root)));
        let (label, is_root) = match owner {
            None => (labels.root.clone(), true),
            Some((owner, _, true)) => (
                format!("{}{}", labels.child_prefix, counters.next(owner)),
                false,
            ),
            Some((owner, owner_label, false)) => (
                format!("{owner_label}{}{}", labels.separator, counters.next(owner)),
                false,
            ),
        };
        assigned.insert(section.id, (label.clone(), is_root));
        out.push(label);
    }

    (out, counters)
}

/// Build structure records for `ordered`, reading point data from
/// `morphology`.
///
/// # Errors
///
/// Returns [`MorphologyError::Validation`] if a section path names a node
/// missing from `morphology` (the sections came from a different node set).
#[instrument(skip_all, fields(sections = ordered.len()))]
pub fn emit(
    ordered: &[&Section],
    morphology: &Morphology,
    labels: &LabelConfig,
) -> Result<Vec<StructureRecord>, MorphologyError> {
    let (names, _) = assign_labels(ordered, labels, SiblingCounters::new());

    let records = ordered
        .iter()
        .zip(names)
        .map(|(section, label)| {
            let points = section
                .path
                .iter()
                .map(|&id| {
                    let node = morphology.get(id).ok_or_else(|| MorphologyError::Validation {
                        id,
                        reason: "section references a node outside the point set".to_string(),
                    })?;
                    Ok(SectionPoint {
                        x: node.position.x,
                        y: node.position.y,
                        z: node.position.z,
                        diameter: 2.0 * node.radius,
                    })
                })
                .collect::<Result<Vec<_>, MorphologyError>>()?;
            Ok(StructureRecord {
                label,
                index: section.id.0,
                attachment: section.attachment.map(|owner| owner.0),
                start: section.start,
                end: section.end,
                points,
            })
        })
        .collect::<Result<Vec<_>, MorphologyError>>()?;

    debug!(records = records.len(), "emitted structure");
    Ok(records)
}
