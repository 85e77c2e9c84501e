//! Minimal SWC point-list reader and writer.
//!
//! One node per line: `id type x y z radius parent`, whitespace separated,
//! parent `-1` for the root. Blank lines and lines starting with `#` are
//! skipped. Only the seven columns are understood; anything richer belongs
//! to a dedicated format crate.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::error::MorphologyError;
use crate::model::{Morphology, Node, NodeId, NodeType, Point3};

const FIELD_COUNT: usize = 7;

/// Parse SWC text into a [`Morphology`].
///
/// # Errors
///
/// Returns [`MorphologyError::Parse`] with the 1-based line number for rows
/// with the wrong field count, unparsable numbers, or a negative parent
/// other than `-1`, and [`MorphologyError::Validation`] for duplicate ids.
pub fn parse_swc(text: &str) -> Result<Morphology, MorphologyError> {
    let mut nodes = Vec::new();
    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        nodes.push(parse_row(line, line_no + 1)?);
    }
    Morphology::from_nodes(nodes)
}

/// Read and parse an SWC file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to parse.
#[instrument]
pub fn read_swc(path: &Path) -> Result<Morphology> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let morphology =
        parse_swc(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(nodes = morphology.len(), "loaded point list");
    Ok(morphology)
}

/// Write nodes in stored order.
///
/// # Errors
///
/// Propagates I/O errors from `w`.
pub fn write_swc(morphology: &Morphology, w: &mut dyn Write) -> io::Result<()> {
    for node in morphology {
        writeln!(w, "{}", format_row(node))?;
    }
    Ok(())
}

/// Render nodes as SWC text.
#[must_use]
pub fn to_swc_string(morphology: &Morphology) -> String {
    let mut out = String::new();
    for node in morphology {
        let _ = writeln!(out, "{}", format_row(node));
    }
    out
}

fn format_row(node: &Node) -> String {
    let parent = node
        .parent
        .map_or_else(|| "-1".to_string(), |p| p.to_string());
    format!(
        "{} {} {} {} {} {} {}",
        node.id,
        node.node_type.code(),
        node.position.x,
        node.position.y,
        node.position.z,
        node.radius,
        parent
    )
}

fn parse_row(line: &str, line_no: usize) -> Result<Node, MorphologyError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(parse_error(
            line_no,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    let id = fields[0]
        .parse::<u64>()
        .map_err(|e| parse_error(line_no, format!("bad id '{}': {e}", fields[0])))?;
    let code = fields[1]
        .parse::<u32>()
        .map_err(|e| parse_error(line_no, format!("bad type '{}': {e}", fields[1])))?;
    let x = parse_float(fields[2], "x", line_no)?;
    let y = parse_float(fields[3], "y", line_no)?;
    let z = parse_float(fields[4], "z", line_no)?;
    let radius = parse_float(fields[5], "radius", line_no)?;
    let parent_raw = fields[6]
        .parse::<i64>()
        .map_err(|e| parse_error(line_no, format!("bad parent '{}': {e}", fields[6])))?;

    let parent = match parent_raw {
        -1 => None,
        p if p < 0 => {
            return Err(parse_error(
                line_no,
                format!("parent must be -1 or a node id, got {p}"),
            ));
        }
        p => Some(NodeId(p.unsigned_abs())),
    };

    Ok(Node::new(
        NodeId(id),
        NodeType::from_code(code),
        Point3::new(x, y, z),
        radius,
        parent,
    ))
}

fn parse_float(field: &str, name: &str, line_no: usize) -> Result<f64, MorphologyError> {
    field
        .parse::<f64>()
        .map_err(|e| parse_error(line_no, format!("bad {name} '{field}': {e}")))
}

fn parse_error(line: usize, message: String) -> MorphologyError {
    MorphologyError::Parse { line, message }
}
