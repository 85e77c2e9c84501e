//! `neurite check`: report whether a point list is already a valid tree.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use neurite_graph::{GraphDiagnostics, diagnose};
use serde::Serialize;

use crate::cmd::{id_list, load};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};

/// Arguments for `neurite check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// SWC point list to check.
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckPayload<'a> {
    input: String,
    is_tree: bool,
    #[serde(flatten)]
    diagnostics: &'a GraphDiagnostics,
}

/// Execute `neurite check`. Exits non-zero when the set is not a tree.
pub fn run_check(args: &CheckArgs, output: OutputMode) -> Result<()> {
    let morphology = load(&args.input, output)?;
    let diagnostics = diagnose(&morphology);
    let payload = CheckPayload {
        input: args.input.display().to_string(),
        is_tree: diagnostics.is_tree(),
        diagnostics: &diagnostics,
    };
    render_mode(output, &payload, render_text, render_pretty)?;

    if let Err(err) = diagnostics.require_tree() {
        // JSON callers already have the full payload on stdout.
        if !output.is_json() {
            render_error(output, &CliError::from(&err))?;
        }
        bail!("{} is not a single tree: {err}", args.input.display());
    }
    Ok(())
}

fn cycle_cell(cycles: &[Vec<neurite_core::NodeId>]) -> String {
    let loops: Vec<String> = cycles.iter().map(|ids| id_list(ids)).collect();
    if loops.is_empty() {
        "-".to_string()
    } else {
        loops.join(" | ")
    }
}

fn render_text(payload: &CheckPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let d = payload.diagnostics;
    let missing: Vec<String> = d
        .missing_parents
        .iter()
        .map(|(child, parent)| format!("{child}->{parent}"))
        .collect();
    writeln!(w, "tree\t{}", payload.is_tree)?;
    writeln!(w, "nodes\t{}", d.node_count)?;
    writeln!(w, "roots\t{}", id_list(&d.roots))?;
    writeln!(w, "missing_parents\t{}", id_list(&missing))?;
    writeln!(w, "self_parented\t{}", id_list(&d.self_parented))?;
    writeln!(w, "cycles\t{}", cycle_cell(&d.cycles))?;
    writeln!(w, "unreachable\t{}", id_list(&d.unreachable))
}

fn render_pretty(payload: &CheckPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let d = payload.diagnostics;
    pretty_section(w, &format!("Check {}", payload.input))?;
    pretty_kv(w, "Tree", if payload.is_tree { "yes" } else { "no" })?;
    pretty_kv(w, "Nodes", d.node_count.to_string())?;
    pretty_kv(w, "Roots", id_list(&d.roots))?;
    pretty_kv(w, "Self-parents", id_list(&d.self_parented))?;
    pretty_kv(w, "Cycles", cycle_cell(&d.cycles))?;
    pretty_kv(w, "Unreachable", id_list(&d.unreachable))
}
