//! MDL molfile and SD file reading and writing, V2000 and V3000.
//!
//! ```
//! use molcrab::molfile::{from_molfile, to_molfile};
//! use molcrab::{Atom, Bond, BondOrder, Element, Molecule};
//!
//! let mut mol = Molecule::new();
//! let c = mol.add_atom(Atom::new(Element::C));
//! let o = mol.add_atom(Atom::new(Element::O));
//! mol.add_bond(c, o, Bond::new(BondOrder::Single));
//!
//! let text = to_molfile(&mol).unwrap();
//! let back = from_molfile(&text).unwrap();
//! assert_eq!(back.atom_count(), 2);
//! assert_eq!(back.atom(o).implicit_hydrogens, Some(1));
//! ```

mod common;
pub mod error;
pub mod field;
pub mod options;
mod sdf;
mod source;
mod tagged;
mod v2000;
mod v3000;

use std::io::{BufRead, Write};

use crate::mol::Molecule;

use common::{BlockEnd, Plan};
use error::Diagnostics;
use field::Columns;
use source::LineSource;

pub use error::{Diagnostic, DiagnosticKind, MolfileError, Result, Severity, WriteError};
pub use options::{Mode, ReaderOptions, Version, VersionPolicy, WriterOptions};

/// Reads molfile records one after another, as found in SD files.
///
/// Errors other than I/O failures and truncated input leave the reader
/// positioned after the broken record, so iteration can go on.
#[derive(Debug)]
pub struct MolfileReader<R> {
    src: LineSource<R>,
    options: ReaderOptions,
    diags: Diagnostics,
    last: Vec<Diagnostic>,
    done: bool,
}

impl<R: BufRead> MolfileReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        Self {
            src: LineSource::new(reader),
            diags: Diagnostics::new(options.mode),
            options,
            last: Vec::new(),
            done: false,
        }
    }

    /// Diagnostics of the record returned by the last call to
    /// [`MolfileReader::read`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.last
    }

    /// Reads the next record; `None` once the input is exhausted.
    pub fn read(&mut self) -> Result<Option<Molecule>> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_record();
        self.last = self.diags.take();
        match result {
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Ok(Some(mol)) => Ok(Some(mol)),
            Err(err @ (MolfileError::Io(_) | MolfileError::UnexpectedEof { .. })) => {
                self.done = true;
                Err(err)
            }
            Err(err) => {
                log::debug!("skipping to the next record after: {err}");
                if common::skip_record(&mut self.src).is_err() {
                    self.done = true;
                }
                Err(err)
            }
        }
    }

    fn read_record(&mut self) -> Result<Option<Molecule>> {
        let Some(title) = self.src.next_line()? else {
            return Ok(None);
        };
        let mut mol = Molecule::new();
        if title.trim_end() == sdf::DELIMITER {
            return Ok(Some(mol));
        }
        common::read_header(&mut self.src, &mut mol, &title)?;

        let counts_line = self.src.expect_line()?;
        let line = self.src.number();
        let found = if counts_line.contains("V3000") {
            Version::V3000
        } else {
            if !counts_line.contains("V2000") {
                self.diags.warn(
                    DiagnosticKind::Format,
                    line,
                    "counts line has no version tag; reading it as V2000",
                );
            }
            Version::V2000
        };
        let expected = match self.options.version {
            VersionPolicy::Auto => found,
            VersionPolicy::V2000 => Version::V2000,
            VersionPolicy::V3000 => Version::V3000,
        };
        if expected != found {
            return Err(MolfileError::WrongVersion {
                line,
                expected,
                found,
            });
        }

        let end = match found {
            Version::V2000 => {
                let counts = v2000::read_counts(&Columns::new(&counts_line, line), &mut self.diags)?;
                v2000::read_ctab(&mut self.src, &mut self.diags, &self.options, &mut mol, counts)?
            }
            Version::V3000 => {
                v3000::read_ctab(&mut self.src, &mut self.diags, &self.options, &mut mol)?
            }
        };
        common::finish_molecule(&mut mol, &self.options);
        if end == BlockEnd::End {
            sdf::read_data_items(&mut self.src, &mut self.diags, &mut mol)?;
        }
        log::debug!(
            "read {found} record with {} atoms and {} bonds",
            mol.atom_count(),
            mol.bond_count()
        );
        Ok(Some(mol))
    }
}

impl<R: BufRead> Iterator for MolfileReader<R> {
    type Item = Result<Molecule>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Reads the first record of a molfile.
pub fn from_molfile(text: &str) -> Result<Molecule> {
    from_molfile_with(text, ReaderOptions::default())
}

pub fn from_molfile_with(text: &str, options: ReaderOptions) -> Result<Molecule> {
    MolfileReader::with_options(text.as_bytes(), options)
        .read()?
        .ok_or(MolfileError::UnexpectedEof { line: 1 })
}

/// Writes one molfile record, header through `M  END`.
pub fn write_molfile<W: Write>(out: &mut W, mol: &Molecule, options: &WriterOptions) -> Result<()> {
    let plan = Plan::new(mol, options)?;
    common::write_header(out, mol, options, plan.three_d)?;
    match plan.version {
        Version::V2000 => v2000::write_ctab(out, mol, &plan, options),
        Version::V3000 => v3000::write_ctab(out, mol, &plan, options),
    }
}

pub fn to_molfile(mol: &Molecule) -> Result<String> {
    to_molfile_with(mol, &WriterOptions::default())
}

pub fn to_molfile_with(mol: &Molecule, options: &WriterOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_molfile(&mut buf, mol, options)?;
    String::from_utf8(buf)
        .map_err(|err| MolfileError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

/// Writes SD files: each molecule as a molfile followed by its data items
/// and the `$$$$` delimiter.
#[derive(Debug)]
pub struct SdfWriter<W> {
    out: W,
    options: WriterOptions,
}

impl<W: Write> SdfWriter<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriterOptions::default())
    }

    pub fn with_options(out: W, options: WriterOptions) -> Self {
        Self { out, options }
    }

    pub fn write(&mut self, mol: &Molecule) -> Result<()> {
        write_molfile(&mut self.out, mol, &self.options)?;
        sdf::write_data_items(&mut self.out, mol)?;
        writeln!(self.out, "{}", sdf::DELIMITER)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
