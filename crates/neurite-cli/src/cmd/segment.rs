//! `neurite segment`: repair, segment and label in one run.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use neurite_core::NodeId;
use neurite_graph::{DroppedLink, MorphologyStats, Pipeline, RepairPath, StructureRecord};
use serde::Serialize;
use tracing::info;

use crate::cmd::{fail, id_list, load};
use crate::hoc::write_section_script;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `neurite segment`.
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// SWC point list to process.
    pub input: PathBuf,

    /// Node id to use as root instead of the first soma node.
    #[arg(long)]
    pub anchor: Option<u64>,

    /// Also write a section script to this path.
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,
}

/// Payload for `neurite segment`.
#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub input: String,
    pub repair_path: RepairPath,
    pub anchor: NodeId,
    pub root: NodeId,
    pub self_parents: Vec<NodeId>,
    pub dropped: Vec<DroppedLink>,
    pub input_hash: String,
    pub output_hash: String,
    pub stats: MorphologyStats,
    pub sections: Vec<StructureRecord>,
}

/// Execute `neurite segment`.
pub fn run_segment(args: &SegmentArgs, pipeline: &Pipeline, output: OutputMode) -> Result<()> {
    let morphology = load(&args.input, output)?;
    let run = match pipeline.run(&morphology, args.anchor.map(NodeId)) {
        Ok(run) => run,
        Err(err) => return fail(output, &args.input, err),
    };

    if let Some(path) = &args.script {
        let mut buf = Vec::new();
        write_section_script(&run.records, &mut buf)?;
        fs::write(path, buf).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote section script");
    }

    let report = SegmentReport {
        input: args.input.display().to_string(),
        repair_path: run.repair.path,
        anchor: run.repair.anchor,
        root: run.repair.root,
        self_parents: run.repair.self_parents,
        dropped: run.repair.dropped,
        input_hash: run.input_hash,
        output_hash: run.output_hash,
        stats: run.stats,
        sections: run.records,
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn attachment_cell(record: &StructureRecord) -> String {
    record
        .attachment
        .map_or_else(|| "-".to_string(), |owner| owner.to_string())
}

fn render_text(report: &SegmentReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "label\tindex\tattachment\tstart\tend\tpoints")?;
    for record in &report.sections {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            record.label,
            record.index,
            attachment_cell(record),
            record.start,
            record.end,
            record.points.len()
        )?;
    }
    Ok(())
}

fn render_pretty(report: &SegmentReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Segmented {}", report.input))?;
    pretty_kv(w, "Repair", report.repair_path.as_str())?;
    pretty_kv(w, "Anchor", format!("{} (now {})", report.anchor, report.root))?;
    pretty_kv(w, "Self-parents", id_list(&report.self_parents))?;
    pretty_kv(w, "Dropped", report.dropped.len().to_string())?;
    pretty_kv(w, "Nodes", report.stats.nodes.to_string())?;
    pretty_kv(w, "Sections", report.stats.sections.to_string())?;
    pretty_kv(w, "Branch pts", report.stats.branch_points.to_string())?;
    pretty_kv(w, "Leaves", report.stats.leaves.to_string())?;
    pretty_kv(w, "Interior", report.stats.interior.to_string())?;
    pretty_kv(w, "Longest", report.stats.max_section_len.to_string())?;
    pretty_kv(w, "Input hash", &report.input_hash)?;
    pretty_kv(w, "Output hash", &report.output_hash)?;
    writeln!(w)?;

    pretty_section(w, "Sections")?;
    writeln!(w, "{:<16} {:>6} {:>6} {:>8} {:>8} {:>7}", "LABEL", "INDEX", "PARENT", "START", "END", "POINTS")?;
    for record in &report.sections {
        writeln!(
            w,
            "{:<16} {:>6} {:>6} {:>8} {:>8} {:>7}",
            record.label,
            record.index,
            attachment_cell(record),
            record.start.to_string(),
            record.end.to_string(),
            record.points.len()
        )?;
    }
    Ok(())
}
