use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Connection table format version, as tagged on the counts line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Version {
    V2000,
    V3000,
}

impl Version {
    pub fn tag(self) -> &'static str {
        match self {
            Version::V2000 => "V2000",
            Version::V3000 => "V3000",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which version to read or write. `Auto` reads whatever the counts line
/// announces and writes V2000 unless the molecule exceeds its limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VersionPolicy {
    #[default]
    Auto,
    V2000,
    V3000,
}

/// How the reader treats malformed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Malformed fields fail the record.
    Strict,
    /// Malformed fields get a default value and a diagnostic.
    #[default]
    Relaxed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderOptions {
    pub mode: Mode,
    /// Read `D` and `T` as hydrogen with mass 2 and 3.
    pub interpret_hydrogen_isotopes: bool,
    /// Derive tetrahedral stereo from atom parities.
    pub add_stereo_elements: bool,
    pub version: VersionPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Relaxed,
            interpret_hydrogen_isotopes: true,
            add_stereo_elements: true,
            version: VersionPolicy::Auto,
        }
    }
}

impl ReaderOptions {
    pub fn strict() -> Self {
        Self::default().with_mode(Mode::Strict)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_hydrogen_isotopes(mut self, on: bool) -> Self {
        self.interpret_hydrogen_isotopes = on;
        self
    }

    pub fn with_stereo_elements(mut self, on: bool) -> Self {
        self.add_stereo_elements = on;
        self
    }

    pub fn with_version(mut self, version: VersionPolicy) -> Self {
        self.version = version;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterOptions {
    pub version: VersionPolicy,
    /// Write z coordinates and the `3D` header code even for flat molecules.
    pub force_3d: bool,
    /// Write `M  ISO` for isotopes equal to the element's major isotope.
    pub write_major_isotopes: bool,
    /// Write aromatic-flagged bonds as bond type 4 instead of their Kekulé
    /// order.
    pub write_aromatic_bond_types: bool,
    /// Pad atom and bond lines with their trailing zero fields.
    pub write_default_properties: bool,
    /// Program name for header line 2; cut to 8 characters.
    pub program_name: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            version: VersionPolicy::Auto,
            force_3d: false,
            write_major_isotopes: false,
            write_aromatic_bond_types: false,
            write_default_properties: true,
            program_name: "molcrab".to_string(),
        }
    }
}

impl WriterOptions {
    pub fn with_version(mut self, version: VersionPolicy) -> Self {
        self.version = version;
        self
    }

    pub fn with_force_3d(mut self, on: bool) -> Self {
        self.force_3d = on;
        self
    }

    pub fn with_major_isotopes(mut self, on: bool) -> Self {
        self.write_major_isotopes = on;
        self
    }

    pub fn with_aromatic_bond_types(mut self, on: bool) -> Self {
        self.write_aromatic_bond_types = on;
        self
    }

    pub fn with_default_properties(mut self, on: bool) -> Self {
        self.write_default_properties = on;
        self
    }

    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }
}
