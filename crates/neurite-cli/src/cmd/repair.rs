//! `neurite repair`: re-root (or rebuild) a point list and write it back.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use neurite_core::NodeId;
use neurite_graph::{DroppedLink, Pipeline, RepairPath};
use serde::Serialize;

use crate::cmd::{fail, id_list, load, write_points};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `neurite repair`.
#[derive(Args, Debug)]
pub struct RepairArgs {
    /// SWC point list to repair.
    pub input: PathBuf,

    /// Node id to use as root instead of the first soma node.
    #[arg(long)]
    pub anchor: Option<u64>,

    /// Write the corrected SWC here. Without it the SWC goes to stdout and
    /// no summary is printed.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct RepairReport {
    pub input: String,
    pub output: String,
    pub repair_path: RepairPath,
    pub anchor: NodeId,
    pub root: NodeId,
    pub renumbered: bool,
    pub nodes: usize,
    pub self_parents: Vec<NodeId>,
    pub dropped: Vec<DroppedLink>,
    pub input_hash: String,
    pub output_hash: String,
}

/// Execute `neurite repair`.
pub fn run_repair(args: &RepairArgs, pipeline: &Pipeline, output: OutputMode) -> Result<()> {
    let morphology = load(&args.input, output)?;
    let repaired = match pipeline.repair(&morphology, args.anchor.map(NodeId)) {
        Ok(repaired) => repaired,
        Err(err) => return fail(output, &args.input, err),
    };

    write_points(&repaired.morphology, args.output.as_deref())?;
    let Some(dest) = &args.output else {
        return Ok(());
    };

    let report = RepairReport {
        input: args.input.display().to_string(),
        output: dest.display().to_string(),
        repair_path: repaired.path,
        anchor: repaired.anchor,
        root: repaired.root,
        renumbered: repaired.renumbered,
        nodes: repaired.morphology.len(),
        self_parents: repaired.self_parents,
        dropped: repaired.dropped,
        input_hash: morphology.content_hash(),
        output_hash: repaired.morphology.content_hash(),
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn dropped_cell(dropped: &[DroppedLink]) -> String {
    let pairs: Vec<String> = dropped
        .iter()
        .map(|link| format!("{}->{}", link.parent, link.child))
        .collect();
    id_list(&pairs)
}

fn render_text(report: &RepairReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\t{}\troot={}\tnodes={}\tdropped={}",
        report.output,
        report.repair_path.as_str(),
        report.root,
        report.nodes,
        dropped_cell(&report.dropped)
    )
}

fn render_pretty(report: &RepairReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Repaired {}", report.input))?;
    pretty_kv(w, "Written to", &report.output)?;
    pretty_kv(w, "Repair", report.repair_path.as_str())?;
    pretty_kv(w, "Anchor", format!("{} (now {})", report.anchor, report.root))?;
    pretty_kv(w, "Renumbered", if report.renumbered { "yes" } else { "no" })?;
    pretty_kv(w, "Nodes", report.nodes.to_string())?;
    pretty_kv(w, "Self-parents", id_list(&report.self_parents))?;
    pretty_kv(w, "Dropped", dropped_cell(&report.dropped))?;
    pretty_kv(w, "Input hash", &report.input_hash)?;
    pretty_kv(w, "Output hash", &report.output_hash)
}
