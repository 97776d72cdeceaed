//! The fixed-column V2000 connection table.

mod properties;
mod reader;
mod writer;

pub(crate) use reader::{read_counts, read_ctab, Counts};
pub(crate) use writer::write_ctab;
