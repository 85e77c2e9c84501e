pub mod check;
pub mod completions;
pub mod components;
pub mod renumber;
pub mod repair;
pub mod segment;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use neurite_core::swc::{read_swc, write_swc};
use neurite_core::{Morphology, MorphologyError};

use crate::output::{CliError, OutputMode, render_error};

/// Read an SWC file, rendering parse failures before propagating them.
pub fn load(path: &Path, output: OutputMode) -> Result<Morphology> {
    read_swc(path).or_else(|err| {
        render_error(output, &CliError::from_anyhow(&err))?;
        Err(err)
    })
}

/// Render a domain failure, then return it with file context attached.
pub fn fail<T>(output: OutputMode, path: &Path, err: MorphologyError) -> Result<T> {
    render_error(output, &CliError::from(&err))?;
    Err(err).with_context(|| format!("Failed to process {}", path.display()))
}

/// Write `morphology` as SWC to `dest`, or to stdout when `dest` is `None`.
pub fn write_points(morphology: &Morphology, dest: Option<&Path>) -> Result<()> {
    match dest {
        Some(path) => {
            let mut buf = Vec::new();
            write_swc(morphology, &mut buf)?;
            fs::write(path, buf).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_swc(morphology, &mut out)?;
            out.flush()?;
            Ok(())
        }
    }
}

/// Comma-joined ids for human output; `-` when empty.
pub fn id_list<T: ToString>(ids: &[T]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}
