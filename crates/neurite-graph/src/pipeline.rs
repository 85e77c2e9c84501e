//! End-to-end driver: raw node set in, labeled sections out.
//!
//! # Stages
//!
//! ```text
//! validate fields → reject extra roots → clear self-parents → resolve anchor → diagnose
//!   → reparent | break cycles → renumber (optional)
//!   → index → classify → segment → reorder → emit
//! ```
//!
//! Each stage runs under [`timing::timed`] with the stage name shown above,
//! so `--timing` reports read in pipeline order. Every stage consumes a
//! value and produces a new one; the caller's input is never mutated.

use neurite_core::config::{NeuriteConfig, RepairMode};
use neurite_core::timing;
use neurite_core::validate::{correct_self_parents, validate_fields};
use neurite_core::{Morphology, MorphologyError, NodeId, NodeType, RootQuery};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::classify::classify;
use crate::connectivity::ConnectivityIndex;
use crate::cycles::{DroppedLink, break_cycles};
use crate::diagnostics::diagnose;
use crate::emit::{StructureRecord, emit};
use crate::renumber::renumber;
use crate::reorder::reorder;
use crate::reparent::reparent;
use crate::segment::segment;
use crate::stats::MorphologyStats;

/// Correction path taken for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepairPath {
    Reparent,
    CycleBreak,
}

impl RepairPath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reparent => "reparent",
            Self::CycleBreak => "cycle-break",
        }
    }
}

/// A node set that is now a single tree rooted at `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub morphology: Morphology,
    /// Root id in the final numbering.
    pub root: NodeId,
    /// Anchor id as it appeared in the input.
    pub anchor: NodeId,
    pub path: RepairPath,
    /// Nodes whose self-referential parent was cleared.
    pub self_parents: Vec<NodeId>,
    /// Declared links discarded by the cycle breaker (input ids).
    pub dropped: Vec<DroppedLink>,
    pub renumbered: bool,
}

/// Everything a full run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub repair: RepairOutcome,
    pub records: Vec<StructureRecord>,
    pub stats: MorphologyStats,
    pub input_hash: String,
    pub output_hash: String,
}

/// Pick the node that should become the root.
///
/// An explicit id wins; otherwise the first node (input order) whose type
/// equals `anchor_type`.
///
/// # Errors
///
/// [`MorphologyError::RootNotFound`] when the explicit id is absent or no
/// node carries `anchor_type`.
pub fn resolve_anchor(
    morphology: &Morphology,
    explicit: Option<NodeId>,
    anchor_type: NodeType,
) -> Result<NodeId, MorphologyError> {
    if let Some(id) = explicit {
        return if morphology.contains(id) {
            Ok(id)
        } else {
            Err(MorphologyError::RootNotFound(RootQuery::Id(id)))
        };
    }
    morphology
        .iter()
        .find(|node| node.node_type == anchor_type)
        .map(|node| node.id)
        .ok_or(MorphologyError::RootNotFound(RootQuery::Type(anchor_type)))
}

/// Configured pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: NeuriteConfig,
}

impl Pipeline {
    #[must_use]
    pub const fn new(config: NeuriteConfig) -> Self {
        Self { config }
    }

    /// Turn `morphology` into a single tree rooted at the anchor.
    ///
    /// # Errors
    ///
    /// [`MorphologyError::MultipleRoots`] when more than one node declares no
    /// parent; otherwise any [`MorphologyError`] raised by validation, anchor
    /// resolution or the selected repair path.
    #[instrument(skip(self, morphology), fields(nodes = morphology.len()))]
    pub fn repair(
        &self,
        morphology: &Morphology,
        anchor: Option<NodeId>,
    ) -> Result<RepairOutcome, MorphologyError> {
        timing::timed("validate", || validate_fields(morphology))?;
        // Counted before self-parents are cleared: those become roots only
        // as a correction.
        let declared = morphology.roots();
        if declared.len() > 1 {
            return Err(MorphologyError::MultipleRoots { ids: declared });
        }
        let (cleaned, self_parents) = timing::timed("self-parents", || correct_self_parents(morphology));
        let anchor = timing::timed("anchor", || {
            resolve_anchor(&cleaned, anchor, self.config.anchor.anchor_type())
        })?;
        let diagnostics = timing::timed("diagnose", || diagnose(&cleaned));

        let path = match self.config.repair.mode {
            RepairMode::Auto if diagnostics.is_tree() => RepairPath::Reparent,
            RepairMode::Auto | RepairMode::CycleBreak => RepairPath::CycleBreak,
            RepairMode::Reparent => {
                diagnostics.require_tree()?;
                RepairPath::Reparent
            }
        };
        debug!(?path, anchor = %anchor, "selected repair path");

        let (rooted, dropped) = match path {
            RepairPath::Reparent => (timing::timed("reparent", || reparent(&cleaned, anchor))?, Vec::new()),
            RepairPath::CycleBreak => {
                let rebuilt = timing::timed("break-cycles", || break_cycles(&cleaned, anchor))?;
                (rebuilt.morphology, rebuilt.dropped)
            }
        };

        let (morphology, root) = if self.config.repair.renumber {
            let renumbered = timing::timed("renumber", || renumber(&rooted))?;
            let root = renumbered.new_id(anchor).unwrap_or(anchor);
            (renumbered.morphology, root)
        } else {
            (rooted, anchor)
        };

        Ok(RepairOutcome {
            morphology,
            root,
            anchor,
            path,
            self_parents,
            dropped,
            renumbered: self.config.repair.renumber,
        })
    }

    /// Segment, order and label an already repaired tree.
    ///
    /// # Errors
    ///
    /// [`MorphologyError`] from indexing, classification or segmentation;
    /// none are expected for a [`RepairOutcome`] produced by
    /// [`Pipeline::repair`].
    #[instrument(skip_all, fields(nodes = tree.len()))]
    pub fn structure(
        &self,
        tree: &Morphology,
    ) -> Result<(Vec<StructureRecord>, MorphologyStats), MorphologyError> {
        let index = timing::timed("index", || ConnectivityIndex::build(tree))?;
        let classes = timing::timed("classify", || classify(&index))?;
        let sections = timing::timed("segment", || segment(&index, &classes))?;
        let ordered = timing::timed("reorder", || reorder(&sections, self.config.order.strategy));
        let records = timing::timed("emit", || emit(&ordered, tree, &self.config.labels))?;
        Ok((records, MorphologyStats::collect(&classes, &sections)))
    }

    /// Full run.
    ///
    /// # Errors
    ///
    /// The first [`MorphologyError`] raised by any stage.
    pub fn run(
        &self,
        morphology: &Morphology,
        anchor: Option<NodeId>,
    ) -> Result<PipelineOutput, MorphologyError> {
        let input_hash = morphology.content_hash();
        let repair = self.repair(morphology, anchor)?;
        let (records, stats) = self.structure(&repair.morphology)?;
        let output_hash = repair.morphology.content_hash();

        info!(
            sections = stats.sections,
            path = ?repair.path,
            "pipeline finished"
        );
        Ok(PipelineOutput {
            repair,
            records,
            stats,
            input_hash,
            output_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{morphology, parent_of};
    use neurite_core::config::RepairConfig;
    use neurite_core::{Node, Point3};

    fn typed(rows: &[(u64, u32, i64)]) -> Morphology {
        let nodes = rows
            .iter()
            .map(|&(id, code, parent)| {
                Node::new(
                    NodeId(id),
                    NodeType::from_code(code),
                    Point3::new(0.0, 0.0, 0.0),
                    1.0,
                    u64::try_from(parent).ok().map(NodeId),
                )
            })
            .collect();
        Morphology::from_nodes(nodes).expect("valid")
    }

    fn with_mode(mode: RepairMode, renumber: bool) -> Pipeline {
        Pipeline::new(NeuriteConfig {
            repair: RepairConfig { mode, renumber },
            ..NeuriteConfig::default()
        })
    }

    #[test]
    fn anchor_prefers_explicit_then_first_soma() {
        let m = typed(&[(1, 3, -1), (2, 1, 1), (3, 1, 2)]);
        assert_eq!(resolve_anchor(&m, None, NodeType::Soma), Ok(NodeId(2)));
        assert_eq!(resolve_anchor(&m, Some(NodeId(3)), NodeType::Soma), Ok(NodeId(3)));
        assert_eq!(
            resolve_anchor(&m, Some(NodeId(9)), NodeType::Soma),
            Err(MorphologyError::RootNotFound(RootQuery::Id(NodeId(9))))
        );
        assert_eq!(
            resolve_anchor(&m, None, NodeType::Axon),
            Err(MorphologyError::RootNotFound(RootQuery::Type(NodeType::Axon)))
        );
    }

    #[test]
    fn tree_input_takes_reparent_path() {
        // Declared root is a dendrite tip; the soma sits in the middle.
        let m = typed(&[(1, 3, -1), (2, 1, 1), (3, 3, 2)]);
        let out = with_mode(RepairMode::Auto, false).repair(&m, None).expect("repair");

        assert_eq!(out.path, RepairPath::Reparent);
        assert_eq!(out.root, NodeId(2));
        assert_eq!(parent_of(&out.morphology, 1), Some(2));
        assert_eq!(parent_of(&out.morphology, 3), Some(2));
    }

    #[test]
    fn looped_input_takes_cycle_break_path() {
        let m = morphology(&[(1, 3), (2, 1), (3, 2)]);
        let out = with_mode(RepairMode::Auto, false)
            .repair(&m, Some(NodeId(1)))
            .expect("repair");
        assert_eq!(out.path, RepairPath::CycleBreak);
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.morphology.roots(), vec![NodeId(1)]);
    }

    #[test]
    fn forced_reparent_rejects_non_trees() {
        let m = morphology(&[(1, -1), (2, 3), (3, 2)]);
        let err = with_mode(RepairMode::Reparent, false)
            .repair(&m, Some(NodeId(1)))
            .expect_err("loop");
        assert_eq!(
            err,
            MorphologyError::CycleDetected {
                ids: vec![NodeId(2), NodeId(3)]
            }
        );
    }

    #[test]
    fn renumbering_remaps_root() {
        let m = morphology(&[(10, -1), (20, 10), (30, 20)]);
        let out = with_mode(RepairMode::Auto, true)
            .repair(&m, Some(NodeId(30)))
            .expect("repair");
        assert_eq!(out.anchor, NodeId(30));
        assert_eq!(out.root, NodeId(3));
        assert_eq!(out.morphology.roots(), vec![NodeId(3)]);
        assert_eq!(parent_of(&out.morphology, 2), Some(3));
    }

    #[test]
    fn invalid_radius_stops_the_run() {
        let mut nodes = morphology(&[(1, -1), (2, 1)]).into_nodes();
        nodes[1].radius = 0.0;
        let m = Morphology::from_nodes(nodes).expect("unique ids");
        let err = Pipeline::default().run(&m, Some(NodeId(1))).expect_err("radius");
        assert!(matches!(err, MorphologyError::Validation { id: NodeId(2), .. }));
    }

    #[test]
    fn several_declared_roots_are_rejected() {
        let m = morphology(&[(1, -1), (2, 1), (3, -1), (4, 3)]);
        for mode in [RepairMode::Auto, RepairMode::CycleBreak] {
            let err = with_mode(mode, true).run(&m, Some(NodeId(1))).expect_err("two roots");
            assert_eq!(
                err,
                MorphologyError::MultipleRoots {
                    ids: vec![NodeId(1), NodeId(3)]
                }
            );
        }
    }

    #[test]
    fn default_order_is_breadth_first() {
        // 1 -> 2 (branch) -> {3 (branch) -> {5, 6}, 4}
        let m = morphology(&[(1, -1), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3)]);
        let out = Pipeline::default().run(&m, Some(NodeId(1))).expect("run");
        let ends: Vec<u64> = out.records.iter().map(|r| r.end.0).collect();
        assert_eq!(ends, vec![2, 3, 4, 5, 6]);
        let labels: Vec<&str> = out.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["soma", "d1", "d2", "d1,1", "d1,2"]);
    }

    #[test]
    fn isolated_self_parent_is_disconnected() {
        let m = morphology(&[(1, -1), (2, 1), (7, 7)]);
        let err = Pipeline::default().run(&m, Some(NodeId(1))).expect_err("7 floats");
        assert_eq!(
            err,
            MorphologyError::Disconnected {
                root: NodeId(1),
                ids: vec![NodeId(7)]
            }
        );
    }

    #[test]
    fn full_run_reports_hashes_and_stats() {
        let m = morphology(&[(1, -1), (2, 1), (3, 2), (4, 3), (5, 3)]);
        let out = Pipeline::default().run(&m, Some(NodeId(1))).expect("run");

        assert_eq!(out.stats.sections, 3);
        assert_eq!(out.records[0].label, "soma");
        assert_eq!(out.input_hash, out.output_hash, "already a dense tree at 1");
    }

    #[test]
    fn rerun_on_output_is_stable() {
        let m = morphology(&[(4, 2), (2, -1), (9, 4), (3, 4)]);
        let pipeline = Pipeline::default();
        let first = pipeline.run(&m, Some(NodeId(9))).expect("first");
        let again = pipeline
            .run(&first.repair.morphology, Some(first.repair.root))
            .expect("second");
        assert_eq!(first.output_hash, again.output_hash);
        assert_eq!(first.records, again.records);
    }
}
