//! `neurite renumber`: dense `1..=n` ids in input order.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use neurite_graph::renumber;
use serde::Serialize;

use crate::cmd::{fail, load, write_points};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `neurite renumber`.
#[derive(Args, Debug)]
pub struct RenumberArgs {
    /// SWC point list to renumber.
    pub input: PathBuf,

    /// Write the renumbered SWC here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct RenumberReport {
    pub input: String,
    pub output: String,
    pub nodes: usize,
    pub changed: bool,
}

/// Execute `neurite renumber`.
pub fn run_renumber(args: &RenumberArgs, output: OutputMode) -> Result<()> {
    let morphology = load(&args.input, output)?;
    let renumbered = match renumber(&morphology) {
        Ok(renumbered) => renumbered,
        Err(err) => return fail(output, &args.input, err),
    };

    write_points(&renumbered.morphology, args.output.as_deref())?;
    let Some(dest) = &args.output else {
        return Ok(());
    };

    let report = RenumberReport {
        input: args.input.display().to_string(),
        output: dest.display().to_string(),
        nodes: renumbered.morphology.len(),
        changed: !renumbered.is_identity(),
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &RenumberReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\tnodes={}\tchanged={}",
        report.output, report.nodes, report.changed
    )
}

fn render_pretty(report: &RenumberReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Renumbered {}", report.input))?;
    pretty_kv(w, "Written to", &report.output)?;
    pretty_kv(w, "Nodes", report.nodes.to_string())?;
    pretty_kv(w, "Ids changed", if report.changed { "yes" } else { "no" })
}
