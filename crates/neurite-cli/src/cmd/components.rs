//! `neurite components`: list the trees of a forest.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use neurite_graph::{ComponentReport, components, recolor};
use serde::Serialize;
use tracing::info;

use crate::cmd::{fail, id_list, load, write_points};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `neurite components`.
#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// SWC point list to inspect.
    pub input: PathBuf,

    /// Also write a copy with each node's type set to its component ordinal.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ComponentsPayload<'a> {
    input: String,
    single_tree: bool,
    #[serde(flatten)]
    report: &'a ComponentReport,
}

/// Execute `neurite components`.
pub fn run_components(args: &ComponentsArgs, output: OutputMode) -> Result<()> {
    let morphology = load(&args.input, output)?;
    let report = components(&morphology);

    if let Some(dest) = &args.output {
        let recolored = match recolor(&morphology, &report) {
            Ok(recolored) => recolored,
            Err(err) => return fail(output, &args.input, err),
        };
        write_points(&recolored, Some(dest))?;
        info!(path = %dest.display(), "wrote recolored point list");
    }

    let payload = ComponentsPayload {
        input: args.input.display().to_string(),
        single_tree: report.is_single_tree(),
        report: &report,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(payload: &ComponentsPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "ordinal\troot\tsize")?;
    for component in &payload.report.components {
        writeln!(w, "{}\t{}\t{}", component.ordinal, component.root, component.size)?;
    }
    if !payload.report.orphans.is_empty() {
        writeln!(w, "orphans\t{}", id_list(&payload.report.orphans))?;
    }
    Ok(())
}

fn render_pretty(payload: &ComponentsPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Components of {}", payload.input))?;
    pretty_kv(w, "Trees", payload.report.components.len().to_string())?;
    pretty_kv(w, "Single tree", if payload.single_tree { "yes" } else { "no" })?;
    pretty_kv(w, "Orphans", id_list(&payload.report.orphans))?;
    writeln!(w)?;
    writeln!(w, "{:>7} {:>10} {:>8}", "ORDINAL", "ROOT", "SIZE")?;
    for component in &payload.report.components {
        writeln!(
            w,
            "{:>7} {:>10} {:>8}",
            component.ordinal,
            component.root.to_string(),
            component.size
        )?;
    }
    Ok(())
}
