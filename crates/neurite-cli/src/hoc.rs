//! Section-script writer for labeled structure records.
//!
//! Layout:
//!
//! ```text
//! objref soma
//! soma = new SectionList()
//! objref dendrite
//! dendrite = new SectionList()
//!
//! create sections[N]
//! // soma
//! access sections[0]
//! soma.append()
//! sections[0] {
//!   pt3dadd(x, y, z, diam)
//! }
//!
//! // d1
//! access sections[1]
//! dendrite.append()
//! connect sections[1](0), sections[0](1)
//! sections[1] {
//!   pt3dadd(...)
//! }
//! ```
//!
//! Script positions follow record order, so `connect` lines refer to the
//! position of the owner record, not its section id.

use std::collections::HashMap;
use std::io::{self, Write};

use neurite_graph::StructureRecord;

/// Write `records` (emission order, root first) as a section script.
///
/// # Errors
///
/// Propagates I/O errors from `w`.
pub fn write_section_script(records: &[StructureRecord], w: &mut dyn Write) -> io::Result<()> {
    let position: HashMap<usize, usize> = records
        .iter()
        .enumerate()
        .map(|(pos, record)| (record.index, pos))
        .collect();

    writeln!(w, "objref soma")?;
    writeln!(w, "soma = new SectionList()")?;
    writeln!(w, "objref dendrite")?;
    writeln!(w, "dendrite = new SectionList()")?;
    writeln!(w)?;
    writeln!(w, "create sections[{}]", records.len())?;

    for (pos, record) in records.iter().enumerate() {
        let owner = record.attachment.and_then(|id| position.get(&id).copied());
        writeln!(w, "// {}", record.label)?;
        writeln!(w, "access sections[{pos}]")?;
        match owner {
            None => writeln!(w, "soma.append()")?,
            Some(parent) => {
                writeln!(w, "dendrite.append()")?;
                writeln!(w, "connect sections[{pos}](0), sections[{parent}](1)")?;
            }
        }
        writeln!(w, "sections[{pos}] {{")?;
        for point in &record.points {
            writeln!(
                w,
                "  pt3dadd({}, {}, {}, {})",
                point.x, point.y, point.z, point.diameter
            )?;
        }
        writeln!(w, "}}")?;
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurite_core::NodeId;
    use neurite_graph::SectionPoint;

    fn record(label: &str, index: usize, attachment: Option<usize>, xs: &[f64]) -> StructureRecord {
        StructureRecord {
            label: label.to_string(),
            index,
            attachment,
            start: NodeId(1),
            end: NodeId(1),
            points: xs
                .iter()
                .map(|&x| SectionPoint {
                    x,
                    y: 0.0,
                    z: 0.0,
                    diameter: 2.0,
                })
                .collect(),
        }
    }

    #[test]
    fn connects_use_script_positions() {
        // Owner has section id 2 but is emitted first.
        let records = vec![
            record("soma", 2, None, &[0.0, 1.0]),
            record("d1", 0, Some(2), &[1.0, 2.5]),
        ];
        let mut buf = Vec::new();
        write_section_script(&records, &mut buf).expect("write");
        let script = String::from_utf8(buf).expect("utf8");

        assert!(script.contains("create sections[2]\n"));
        assert!(script.contains("// soma\naccess sections[0]\nsoma.append()\n"));
        assert!(script.contains("// d1\naccess sections[1]\ndendrite.append()\n"));
        assert!(script.contains("connect sections[1](0), sections[0](1)\n"));
        assert!(script.contains("  pt3dadd(2.5, 0, 0, 2)\n"));
    }

    #[test]
    fn empty_record_list_still_declares_lists() {
        let mut buf = Vec::new();
        write_section_script(&[], &mut buf).expect("write");
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.starts_with("objref soma\n"));
        assert!(script.contains("create sections[0]\n"));
    }
}
