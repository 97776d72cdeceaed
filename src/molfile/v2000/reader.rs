use std::io::BufRead;
use std::ops::Range;

use crate::atom::{Atom, Parity};
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::mol::Molecule;

use super::properties;
use crate::molfile::common::{self, BlockEnd};
use crate::molfile::error::{Diagnostics, MolfileError, Result};
use crate::molfile::field::Columns;
use crate::molfile::options::ReaderOptions;
use crate::molfile::source::LineSource;

/// Integer fields after the atom symbol that the reader validates. Fields
/// other than mass difference, charge, parity, valence and map are read and
/// discarded.
const ATOM_FIELDS: [Range<usize>; 12] = [
    34..36,
    36..39,
    39..42,
    42..45,
    45..48,
    48..51,
    51..54,
    54..57,
    57..60,
    60..63,
    63..66,
    66..69,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Counts {
    pub(crate) atoms: usize,
    pub(crate) bonds: usize,
    pub(crate) chiral: bool,
}

/// Atom and bond counts from the fixed columns, falling back to the first
/// two whitespace tokens for misaligned lines.
pub(crate) fn read_counts(cols: &Columns, diags: &mut Diagnostics) -> Result<Counts> {
    let fixed = (cols.required_int(0..3), cols.required_int(3..6));
    let (atoms, bonds) = match fixed {
        (Some(a), Some(b)) if a >= 0 && b >= 0 => (a as usize, b as usize),
        _ => {
            let mut tokens = cols.line().split_whitespace().map(|t| t.parse::<usize>().ok());
            match (tokens.next().flatten(), tokens.next().flatten()) {
                (Some(a), Some(b)) => {
                    diags.recoverable(cols.number(), "counts line is not column aligned")?;
                    (a, b)
                }
                _ => {
                    return Err(MolfileError::parse(
                        cols.number(),
                        "counts line must start with the atom and bond counts",
                    ))
                }
            }
        }
    };
    let chiral = cols.int(12..15, 0, diags)? == 1;
    Ok(Counts {
        atoms,
        bonds,
        chiral,
    })
}

/// Reads the atom, bond and properties blocks that follow a V2000 counts
/// line.
pub(crate) fn read_ctab<R: BufRead>(
    src: &mut LineSource<R>,
    diags: &mut Diagnostics,
    options: &ReaderOptions,
    mol: &mut Molecule,
    counts: Counts,
) -> Result<BlockEnd> {
    mol.chiral = counts.chiral;

    let mut points = Vec::with_capacity(counts.atoms);
    for _ in 0..counts.atoms {
        let line = src.expect_line()?;
        let cols = Columns::new(&line, src.number());
        let (atom, point) = read_atom(&cols, diags, options)?;
        mol.add_atom(atom);
        points.push(point);
    }
    common::place_atoms(mol, &points);
    log::trace!("read {} atoms", counts.atoms);

    for _ in 0..counts.bonds {
        let line = src.expect_line()?;
        let cols = Columns::new(&line, src.number());
        read_bond(&cols, mol, diags)?;
    }
    log::trace!("read {} bonds", counts.bonds);

    properties::read_block(src, diags, mol)
}

fn read_atom(cols: &Columns, diags: &mut Diagnostics, options: &ReaderOptions) -> Result<(Atom, [f64; 3])> {
    let line = cols.number();
    if cols.len() <= 31 {
        return Err(MolfileError::parse(line, "atom line ends before the symbol"));
    }
    let point = [
        cols.coordinate(0..10, diags)?,
        cols.coordinate(10..20, diags)?,
        cols.coordinate(20..30, diags)?,
    ];
    let mut atom = common::atom_from_symbol(cols.text(31..34), line, diags, options)?;

    if let Some(cut) = ATOM_FIELDS.iter().find(|r| cols.cuts((*r).clone())) {
        diags.field(line, cut.clone(), "atom line ends inside a field")?;
    }
    let mut values = [0i64; 12];
    for (value, range) in values.iter_mut().zip(ATOM_FIELDS.iter()) {
        *value = cols.int(range.clone(), 0, diags)?;
    }
    let [mass_diff, charge, parity, _, _, valence, _, _, _, map, _, _] = values;

    if mass_diff != 0 {
        match atom.element() {
            Some(e) if (e.major_isotope() as i64 + mass_diff) > 0 => {
                atom.isotope = Some((e.major_isotope() as i64 + mass_diff) as u16);
            }
            _ => diags.field(line, 34..36, format!("mass difference {mass_diff} does not apply"))?,
        }
    }

    match charge {
        0 => {}
        4 => atom.unpaired_electrons = 1,
        1..=7 => atom.formal_charge = 4 - charge as i8,
        _ => diags.field(line, 36..39, format!("invalid charge code {charge}"))?,
    }

    match Parity::from_code(parity as u32).filter(|_| parity >= 0) {
        Some(p) => atom.parity = p,
        None => diags.field(line, 39..42, format!("invalid parity {parity}"))?,
    }

    match valence {
        0 => {}
        1..=15 => {
            let v = if valence == 15 { 0 } else { valence as u8 };
            if !atom.set_valence(v) {
                log::debug!("line {line}: valence ignored on non-element atom");
            }
        }
        _ => diags.field(line, 48..51, format!("invalid valence {valence}"))?,
    }

    if map > 0 {
        atom.atom_map = map as u32;
    } else if map < 0 {
        diags.field(line, 60..63, format!("invalid atom map {map}"))?;
    }

    Ok((atom, point))
}

fn read_bond(cols: &Columns, mol: &mut Molecule, diags: &mut Diagnostics) -> Result<()> {
    let line = cols.number();
    if cols.len() < 9 {
        return Err(MolfileError::parse(line, "bond line is too short"));
    }
    let mut ends = [None; 2];
    for (end, range) in ends.iter_mut().zip([0..3, 3..6]) {
        let position = cols
            .required_int(range)
            .ok_or_else(|| MolfileError::parse(line, "invalid atom number in bond line"))?;
        *end = usize::try_from(position).ok().and_then(|p| mol.atom_at(p));
        if end.is_none() {
            return Err(MolfileError::parse(
                line,
                format!(
                    "bond references atom {position}, but the record has {} atoms",
                    mol.atom_count()
                ),
            ));
        }
    }
    let [Some(begin), Some(end)] = ends else {
        return Err(MolfileError::parse(line, "invalid atom number in bond line"));
    };
    if begin == end {
        return Err(MolfileError::parse(line, "bond joins an atom to itself"));
    }

    let code = cols.int(6..9, 1, diags)?;
    let order = match u32::try_from(code).ok().and_then(BondOrder::from_code) {
        Some(order) => order,
        None => {
            diags.field(line, 6..9, format!("invalid bond type {code}"))?;
            BondOrder::Single
        }
    };

    let stereo_code = cols.int(9..12, 0, diags)?;
    let stereo = match (order, stereo_code) {
        (BondOrder::Double, 0) => BondStereo::EZByCoordinates,
        (BondOrder::Double, 3) => BondStereo::EOrZ,
        (_, 0) => BondStereo::None,
        (BondOrder::Single, 1) => BondStereo::Up,
        (BondOrder::Single, 4) => BondStereo::UpOrDown,
        (BondOrder::Single, 6) => BondStereo::Down,
        _ => {
            diags.field(line, 9..12, format!("stereo {stereo_code} does not apply to bond type {code}"))?;
            BondStereo::None
        }
    };
    for range in [12..15, 15..18, 18..21] {
        cols.int(range, 0, diags)?;
    }

    let mut bond = Bond::new(order);
    bond.stereo = stereo;
    if order == BondOrder::Aromatic {
        bond.is_aromatic = true;
        mol.atom_mut(begin).is_aromatic = true;
        mol.atom_mut(end).is_aromatic = true;
    }
    mol.add_bond(begin, end, bond);
    Ok(())
}
