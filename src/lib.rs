//! Reading and writing MDL connection tables: molfiles and SD files in
//! the V2000 and V3000 formats.
//!
//! The molecule model lives in [`mol`], [`atom`], [`bond`] and
//! [`sgroup`]; [`molfile`] holds the codec. Implicit hydrogens are filled
//! by the MDL valence model in [`valence`] and [`hydrogen`], and tetrahedral
//! centres are exchanged with atom parities through [`stereo`].

pub mod atom;
pub mod bond;
pub mod element;
pub mod hydrogen;
pub mod mol;
pub mod molfile;
pub mod sgroup;
pub mod stereo;
pub mod valence;

pub use atom::{Atom, AtomKind, Parity, QueryAtom};
pub use bond::{Bond, BondOrder, BondStereo};
pub use element::Element;
pub use mol::{Dimension, Molecule};
pub use molfile::{
    from_molfile, from_molfile_with, to_molfile, to_molfile_with, write_molfile, MolfileError,
    MolfileReader, ReaderOptions, SdfWriter, WriterOptions,
};
pub use sgroup::{
    AttachPoint, BracketStyle, Sgroup, SgroupBracket, SgroupError, SgroupId, SgroupKey,
    SgroupType, SgroupValue,
};
pub use stereo::{TetrahedralStereo, Winding};
