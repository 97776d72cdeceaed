//! SDF data items between `M  END` and the `$$$$` record delimiter.

use std::io::{BufRead, Write};

use crate::mol::Molecule;

use super::error::{DiagnosticKind, Diagnostics, Result};
use super::source::LineSource;

pub(crate) const DELIMITER: &str = "$$$$";

/// Name of a `> <NAME>` header. Registry and `DT` numbers around the name
/// are dropped; a header without angle brackets names the item by its
/// remaining text.
fn item_name(header: &str) -> String {
    let rest = header.strip_prefix('>').unwrap_or(header);
    match rest.find('<') {
        Some(open) => {
            let tail = &rest[open + 1..];
            match tail.find('>') {
                Some(close) => tail[..close].to_string(),
                None => tail.trim().to_string(),
            }
        }
        None => rest.trim().to_string(),
    }
}

/// Reads data items up to and including the delimiter, storing them on the
/// molecule in file order. Multi-line values are joined with `\n`.
pub(crate) fn read_data_items<R: BufRead>(
    src: &mut LineSource<R>,
    diags: &mut Diagnostics,
    mol: &mut Molecule,
) -> Result<()> {
    let mut item: Option<(String, Vec<String>)> = None;
    while let Some(line) = src.next_line()? {
        let text = line.trim_end();
        if text == DELIMITER {
            break;
        }
        if item.is_none() {
            if text.starts_with('>') {
                item = Some((item_name(text), Vec::new()));
            } else if !text.is_empty() {
                diags.warn(DiagnosticKind::Format, src.number(), "text outside a data item");
            }
        } else if text.is_empty() {
            if let Some((name, values)) = item.take() {
                mol.set_property(name, values.join("\n"));
            }
        } else if let Some((_, values)) = item.as_mut() {
            values.push(text.to_string());
        }
    }
    if let Some((name, values)) = item {
        mol.set_property(name, values.join("\n"));
    }
    Ok(())
}

pub(crate) fn write_data_items<W: Write>(out: &mut W, mol: &Molecule) -> std::io::Result<()> {
    for (name, value) in mol.properties() {
        writeln!(out, "> <{name}>")?;
        for line in value.lines().filter(|l| !l.trim().is_empty()) {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
