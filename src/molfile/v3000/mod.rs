//! The tagged V3000 connection table.

mod reader;
mod writer;

pub(crate) use reader::read_ctab;
pub(crate) use writer::write_ctab;
