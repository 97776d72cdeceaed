use std::fmt;
use std::ops::Range;

use thiserror::Error;

use super::options::{Mode, Version};

/// Errors that abort reading or writing a record.
#[derive(Debug, Error)]
pub enum MolfileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record is structurally broken: short lines, bad counts, an
    /// unknown element in strict mode, dangling atom references.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A malformed field, escalated because the reader is strict.
    #[error("line {line}, columns {}-{}: {message}", columns.start + 1, columns.end)]
    Field {
        line: usize,
        columns: Range<usize>,
        message: String,
    },

    /// The counts line announces a different version than the reader was
    /// configured for.
    #[error("line {line}: expected a {expected} record, found {found}")]
    WrongVersion {
        line: usize,
        expected: Version,
        found: Version,
    },

    #[error("line {line}: unexpected end of input inside a record")]
    UnexpectedEof { line: usize },

    #[error("cannot write molecule: {0}")]
    Unsupported(#[from] WriteError),
}

impl MolfileError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Molecule states that cannot be expressed in the requested format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("bond {bond} has an order with no molfile code")]
    UnrepresentableBondOrder { bond: usize },

    #[error("bond {bond} is aromatic; enable aromatic bond output to write it as type 4")]
    AromaticBond { bond: usize },

    #[error("sgroup {sgroup} has {count} parents; V3000 allows one")]
    MultipleParents { sgroup: usize, count: usize },

    #[error("{atoms} atoms and {bonds} bonds exceed the V2000 limit of 999")]
    TooManyAtoms { atoms: usize, bonds: usize },

    #[error("sgroup parent links form a cycle")]
    SgroupCycle,

    #[error("bond {bond} is a positional variation bond, which V2000 cannot hold")]
    MulticenterBond { bond: usize },

    #[error("atom {atom} has a coordinate outside the V2000 field width")]
    CoordinateOutOfRange { atom: usize },
}

pub type Result<T> = std::result::Result<T, MolfileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed or missing field, replaced by a default.
    Field,
    /// Line layout problems such as a missing version tag.
    Format,
    UnrecognizedCommand,
    /// An Sgroup referenced before its type was declared, or a dropped
    /// parent link.
    SgroupOrder,
    HydrogenIsotope,
    Stereo,
}

/// A recoverable problem found while reading a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub columns: Option<Range<usize>>,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.columns {
            Some(cols) => write!(
                f,
                "{level}: line {}, columns {}-{}: {}",
                self.line,
                cols.start + 1,
                cols.end,
                self.message
            ),
            None => write!(f, "{level}: line {}: {}", self.line, self.message),
        }
    }
}

/// Collects diagnostics for one record and decides, from the reader mode,
/// which field problems are fatal.
#[derive(Debug)]
pub(crate) struct Diagnostics {
    mode: Mode,
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            items: Vec::new(),
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub(crate) fn warn(&mut self, kind: DiagnosticKind, line: usize, message: impl Into<String>) {
        self.push(Diagnostic {
            line,
            columns: None,
            severity: Severity::Warning,
            kind,
            message: message.into(),
        });
    }

    /// Records a problem at error severity (strict mode) or warning
    /// severity (relaxed mode) without failing the record.
    pub(crate) fn note(&mut self, kind: DiagnosticKind, line: usize, message: impl Into<String>) {
        let severity = match self.mode {
            Mode::Strict => Severity::Error,
            Mode::Relaxed => Severity::Warning,
        };
        self.push(Diagnostic {
            line,
            columns: None,
            severity,
            kind,
            message: message.into(),
        });
    }

    /// A malformed field: fatal in strict mode, otherwise recorded so the
    /// caller can substitute a default.
    pub(crate) fn field(
        &mut self,
        line: usize,
        columns: Range<usize>,
        message: impl Into<String>,
    ) -> Result<()> {
        let message = message.into();
        if self.mode == Mode::Strict {
            return Err(MolfileError::Field {
                line,
                columns,
                message,
            });
        }
        self.push(Diagnostic {
            line,
            columns: Some(columns),
            severity: Severity::Warning,
            kind: DiagnosticKind::Field,
            message,
        });
        Ok(())
    }

    /// Like [`Diagnostics::field`] for problems without a column range.
    pub(crate) fn recoverable(&mut self, line: usize, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        if self.mode == Mode::Strict {
            return Err(MolfileError::Parse { line, message });
        }
        self.warn(DiagnosticKind::Field, line, message);
        Ok(())
    }

    pub(crate) fn unrecognized(&mut self, line: usize, command: &str) {
        self.warn(
            DiagnosticKind::UnrecognizedCommand,
            line,
            format!("skipping unrecognized command '{command}'"),
        );
    }
}
