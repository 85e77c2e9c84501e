#![forbid(unsafe_code)]

mod cmd;
mod hoc;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use neurite_core::ErrorCode;
use neurite_core::config::resolve_config;
use neurite_core::timing;
use neurite_graph::Pipeline;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "neurite: repair and segment neuron morphologies",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format (defaults to pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read settings from this TOML file instead of the usual locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Pipeline",
        about = "Repair, segment and label a morphology",
        long_about = "Re-root the point list at its anchor (repairing loops and \
                      self-parents on the way), split it into unbranched sections \
                      and print the labeled section list.",
        after_help = "EXAMPLES:\n    # Section table for a reconstruction\n    neurite segment cell.swc\n\n    # Root at node 42 and write a section script\n    neurite segment cell.swc --anchor 42 --script cell.hoc\n\n    # Machine-readable output\n    neurite segment cell.swc --format json"
    )]
    Segment(cmd::segment::SegmentArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Re-root a morphology and write the corrected SWC",
        after_help = "EXAMPLES:\n    # Corrected point list on stdout\n    neurite repair cell.swc > fixed.swc\n\n    # Write to a file and print a summary\n    neurite repair cell.swc -o fixed.swc"
    )]
    Repair(cmd::repair::RepairArgs),

    #[command(
        next_help_heading = "Tools",
        about = "Renumber node ids densely in input order",
        after_help = "EXAMPLES:\n    neurite renumber cell.swc -o dense.swc"
    )]
    Renumber(cmd::renumber::RenumberArgs),

    #[command(
        next_help_heading = "Tools",
        about = "List the connected trees of a point list",
        after_help = "EXAMPLES:\n    # Component table\n    neurite components forest.swc\n\n    # Also write a copy typed by component\n    neurite components forest.swc -o colored.swc"
    )]
    Components(cmd::components::ComponentsArgs),

    #[command(
        next_help_heading = "Tools",
        about = "Check whether a point list is already a single tree",
        after_help = "EXAMPLES:\n    neurite check cell.swc && echo ok"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    neurite completions bash > ~/.local/share/bash-completion/completions/neurite"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NEURITE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "neurite=debug,info"
        } else {
            "neurite=info,warn"
        })
    });

    let format = env::var("NEURITE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries SWC and report payloads.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let root = env::current_dir()?;
    let config = match resolve_config(cli.config.as_deref(), &root) {
        Ok(config) => config,
        Err(err) => {
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(err);
        }
    };
    let pipeline = Pipeline::new(config);

    let command_result = match cli.command {
        Commands::Segment(ref args) => timing::timed("cmd.segment", || {
            cmd::segment::run_segment(args, &pipeline, output)
        }),
        Commands::Repair(ref args) => timing::timed("cmd.repair", || {
            cmd::repair::run_repair(args, &pipeline, output)
        }),
        Commands::Renumber(ref args) => {
            timing::timed("cmd.renumber", || cmd::renumber::run_renumber(args, output))
        }
        Commands::Components(ref args) => timing::timed("cmd.components", || {
            cmd::components::run_components(args, output)
        }),
        Commands::Check(ref args) => {
            timing::timed("cmd.check", || cmd::check::run_check(args, output))
        }
        Commands::Completions(ref args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    command_result
}
