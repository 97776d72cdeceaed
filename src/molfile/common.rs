//! Pieces shared by the V2000 and V3000 codecs.

use std::collections::HashMap;
use std::io::Write;

use petgraph::graph::NodeIndex;

use crate::atom::{Atom, AtomKind, Parity, QueryAtom};
use crate::bond::BondOrder;
use crate::element::{is_pseudo_label, Element};
use crate::hydrogen;
use crate::mol::{Dimension, Molecule};
use crate::sgroup::{Ensured, SgroupError, SgroupId, SgroupRegistry, SgroupType};
use crate::stereo;

use super::error::{DiagnosticKind, Diagnostics, MolfileError, Result, WriteError};
use super::field::clean_coordinate;
use super::options::{Mode, ReaderOptions, Version, VersionPolicy, WriterOptions};
use super::source::LineSource;

/// How a connection table block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockEnd {
    /// `M  END`; SDF data items may follow.
    End,
    /// The `$$$$` record delimiter, already consumed.
    Delimiter,
    Eof,
}

/// Builds an atom from an atom-block symbol.
pub(crate) fn atom_from_symbol(
    symbol: &str,
    line: usize,
    diags: &mut Diagnostics,
    options: &ReaderOptions,
) -> Result<Atom> {
    if let Some(element) = Element::from_symbol(symbol) {
        return Ok(Atom::new(element));
    }
    match symbol {
        "D" | "T" if options.interpret_hydrogen_isotopes => {
            let mass = if symbol == "D" { 2 } else { 3 };
            let mut atom = Atom::new(Element::H);
            atom.isotope = Some(mass);
            diags.note(
                DiagnosticKind::HydrogenIsotope,
                line,
                format!("'{symbol}' read as hydrogen with mass {mass}"),
            );
            return Ok(atom);
        }
        "A" => return Ok(Atom::query(QueryAtom::Any)),
        "Q" => return Ok(Atom::query(QueryAtom::Hetero)),
        "L" => {
            return Ok(Atom::query(QueryAtom::List {
                elements: Vec::new(),
                negated: false,
            }))
        }
        _ if is_pseudo_label(symbol) => return Ok(Atom::pseudo(symbol)),
        _ => {}
    }
    diags.recoverable(line, format!("unknown element symbol '{symbol}'"))?;
    Ok(Atom::pseudo(if symbol.is_empty() { "*" } else { symbol }))
}

/// Stores coordinates on the atoms: none when every coordinate is zero, 2D
/// when every z is zero, 3D otherwise.
pub(crate) fn place_atoms(mol: &mut Molecule, points: &[[f64; 3]]) {
    if points.iter().all(|p| p.iter().all(|&c| c == 0.0)) {
        return;
    }
    let flat = points.iter().all(|p| p[2] == 0.0);
    for (i, point) in points.iter().enumerate() {
        let atom = mol.atom_mut(NodeIndex::new(i));
        if flat {
            atom.point_2d = Some([point[0], point[1]]);
        } else {
            atom.point_3d = Some(*point);
        }
    }
}

/// Looks up an Sgroup by its file number, creating it when a command
/// refers to it before its type was declared.
pub(crate) fn ensure_sgroup(
    registry: &mut SgroupRegistry,
    mol: &mut Molecule,
    diags: &mut Diagnostics,
    line: usize,
    number: u32,
) -> SgroupId {
    let ensured = registry.ensure(mol.sgroups_mut(), number);
    if let Ensured::Created(_) = ensured {
        diags.note(
            DiagnosticKind::SgroupOrder,
            line,
            format!("sgroup {number} referenced before its type was declared"),
        );
    }
    ensured.id()
}

/// Links an Sgroup to its parent. A link that would close a cycle fails the
/// record in strict mode and is dropped otherwise.
pub(crate) fn link_parent(
    mol: &mut Molecule,
    diags: &mut Diagnostics,
    line: usize,
    child: SgroupId,
    parent: SgroupId,
) -> Result<()> {
    match mol.add_sgroup_parent(child, parent) {
        Ok(()) => Ok(()),
        Err(err @ SgroupError::Cycle { .. }) if diags.mode() == Mode::Strict => {
            Err(MolfileError::parse(line, err.to_string()))
        }
        Err(err) => {
            diags.warn(
                DiagnosticKind::SgroupOrder,
                line,
                format!("dropping parent link: {err}"),
            );
            Ok(())
        }
    }
}

/// Fills implicit hydrogens and tetrahedral stereo from the atom parities.
/// Stereo is skipped when disabled, for queries, and for molecules without
/// coordinates.
pub(crate) fn finish_molecule(mol: &mut Molecule, options: &ReaderOptions) {
    let explicit = hydrogen::explicit_valences(mol);
    hydrogen::assign_implicit_hydrogens(mol, &explicit);
    if options.add_stereo_elements && !mol.is_query() && mol.dimension() != Dimension::Zero {
        let added = stereo::assign_from_parities(mol);
        if added > 0 {
            log::debug!("derived {added} tetrahedral centers from parities");
        }
    }
}

/// Skips input up to and including the next `$$$$`, so a reader can resume
/// after a broken record.
pub(crate) fn skip_record<R: std::io::BufRead>(src: &mut LineSource<R>) -> Result<()> {
    while let Some(line) = src.next_line()? {
        if line.trim_end() == "$$$$" {
            break;
        }
    }
    Ok(())
}

/// Everything a writer derives from a molecule before emitting lines.
#[derive(Debug)]
pub(crate) struct Plan {
    pub(crate) version: Version,
    pub(crate) three_d: bool,
    pub(crate) parities: Vec<Parity>,
    pub(crate) explicit: Vec<Option<u32>>,
    /// Writable Sgroups, parents first.
    pub(crate) sgroups: Vec<SgroupId>,
    /// 1-based output number of each writable Sgroup.
    pub(crate) numbers: HashMap<SgroupId, usize>,
}

impl Plan {
    pub(crate) fn new(mol: &Molecule, options: &WriterOptions) -> std::result::Result<Self, WriteError> {
        let version = match options.version {
            VersionPolicy::V3000 => Version::V3000,
            VersionPolicy::Auto => match v2000_limit(mol) {
                Some(_) => Version::V3000,
                None => Version::V2000,
            },
            VersionPolicy::V2000 => match v2000_limit(mol) {
                Some(err) => return Err(err),
                None => Version::V2000,
            },
        };

        for (i, edge) in mol.bonds().enumerate() {
            match mol.bond(edge).order {
                BondOrder::Quadruple => return Err(WriteError::UnrepresentableBondOrder { bond: i + 1 }),
                BondOrder::Aromatic if !options.write_aromatic_bond_types => {
                    return Err(WriteError::AromaticBond { bond: i + 1 })
                }
                _ => {}
            }
        }

        let sgroups = mol
            .sgroup_emission_order()
            .map_err(|_| WriteError::SgroupCycle)?;
        if version == Version::V3000 {
            for (i, sgroup) in mol.sgroups().iter().enumerate() {
                if sgroup.parents().len() > 1 {
                    return Err(WriteError::MultipleParents {
                        sgroup: i + 1,
                        count: sgroup.parents().len(),
                    });
                }
            }
        }
        let numbers = sgroups
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i + 1))
            .collect();

        Ok(Self {
            version,
            three_d: options.force_3d || mol.dimension() == Dimension::Three,
            parities: stereo::atom_parities(mol),
            explicit: hydrogen::explicit_valences(mol),
            sgroups,
            numbers,
        })
    }

    pub(crate) fn sgroup_number(&self, id: SgroupId) -> Option<usize> {
        self.numbers.get(&id).copied()
    }
}

/// Widest values a `10.4` V2000 coordinate field holds.
const V2000_COORDINATES: std::ops::RangeInclusive<f64> = -9999.9999..=99999.9999;

/// First reason the molecule cannot be written as V2000, if any.
fn v2000_limit(mol: &Molecule) -> Option<WriteError> {
    if mol.atom_count() > 999 || mol.bond_count() > 999 {
        return Some(WriteError::TooManyAtoms {
            atoms: mol.atom_count(),
            bonds: mol.bond_count(),
        });
    }
    if let Some(sg) = mol
        .sgroups()
        .iter()
        .find(|sg| sg.kind == SgroupType::ExtMulticenter)
    {
        let bond = sg.bonds().first().map_or(0, |b| b.index() + 1);
        return Some(WriteError::MulticenterBond { bond });
    }
    mol.atoms()
        .find(|&idx| {
            atom_point(mol.atom(idx))
                .iter()
                .any(|&c| !V2000_COORDINATES.contains(&clean_coordinate(c)))
        })
        .map(|idx| WriteError::CoordinateOutOfRange { atom: idx.index() + 1 })
}

/// Coordinates to write for an atom; zeros when it has none.
pub(crate) fn atom_point(atom: &Atom) -> [f64; 3] {
    match (atom.point_3d, atom.point_2d) {
        (Some(p), _) => p,
        (None, Some([x, y])) => [x, y, 0.0],
        (None, None) => [0.0; 3],
    }
}

/// Bond type code, honouring aromatic output.
pub(crate) fn bond_code(order: BondOrder, is_aromatic: bool, options: &WriterOptions) -> u8 {
    if options.write_aromatic_bond_types && is_aromatic {
        return 4;
    }
    order.code().unwrap_or(1)
}

/// Mass number to write, if any: major isotopes are left out unless asked
/// for.
pub(crate) fn isotope_to_write(atom: &Atom, options: &WriterOptions) -> Option<u16> {
    let mass = atom.isotope?;
    match atom.kind {
        AtomKind::Element(e) if !options.write_major_isotopes && e.major_isotope() == mass => None,
        _ => Some(mass),
    }
}

/// Radical code for an unpaired-electron count. Two electrons are written
/// as singlet.
pub(crate) fn radical_code(unpaired: u8) -> u8 {
    match unpaired {
        1 => 2,
        2 => 1,
        _ => 0,
    }
}

pub(crate) fn unpaired_from_radical(code: i64) -> Option<u8> {
    match code {
        0 => Some(0),
        1 | 3 => Some(2),
        2 => Some(1),
        _ => None,
    }
}

/// Header lines: title, program/timestamp/dimension, comment.
pub(crate) fn write_header<W: Write>(
    out: &mut W,
    mol: &Molecule,
    options: &WriterOptions,
    three_d: bool,
) -> std::io::Result<()> {
    let program: String = options.program_name.chars().take(8).collect();
    let stamp = chrono::Utc::now().format("%m%d%y%H%M");
    writeln!(out, "{}", header_text(mol.title.as_deref()))?;
    writeln!(
        out,
        "  {program:<8}{stamp}{}",
        if three_d { "3D" } else { "2D" }
    )?;
    writeln!(out, "{}", header_text(mol.comment.as_deref()))
}

fn header_text(text: Option<&str>) -> String {
    text.and_then(|t| t.lines().next())
        .unwrap_or("")
        .chars()
        .take(80)
        .collect()
}

/// Reads the program line and comment that follow the title.
pub(crate) fn read_header<R: std::io::BufRead>(
    src: &mut LineSource<R>,
    mol: &mut Molecule,
    title: &str,
) -> Result<()> {
    let title = title.trim_end();
    if !title.is_empty() {
        mol.title = Some(title.to_string());
    }
    let program_line = src.expect_line()?;
    let program = program_line.get(2..10).unwrap_or("").trim();
    if !program.is_empty() {
        mol.program = Some(program.to_string());
    }
    let comment = src.expect_line()?;
    let comment = comment.trim_end();
    if !comment.is_empty() {
        mol.comment = Some(comment.to_string());
    }
    Ok(())
}
