use std::fmt::Display;
use std::io::Write;

use petgraph::graph::NodeIndex;

use crate::atom::{AtomKind, QueryAtom};
use crate::bond::BondStereo;
use crate::hydrogen;
use crate::mol::Molecule;
use crate::sgroup::{BracketStyle, Sgroup, SgroupKey};

use crate::molfile::common::{self, Plan};
use crate::molfile::error::Result;
use crate::molfile::field::format_coordinate;
use crate::molfile::options::WriterOptions;

/// Longest text per `M  SCD` / `M  SED` line.
const DATA_CHUNK: usize = 69;

pub(crate) fn write_ctab<W: Write>(
    out: &mut W,
    mol: &Molecule,
    plan: &Plan,
    options: &WriterOptions,
) -> Result<()> {
    writeln!(
        out,
        "{:>3}{:>3}  0  0{:>3}  0  0  0  0  0999 V2000",
        mol.atom_count(),
        mol.bond_count(),
        u8::from(mol.chiral)
    )?;
    for idx in mol.atoms() {
        writeln!(out, "{}", atom_line(mol, idx, plan, options))?;
    }
    for edge in mol.bonds() {
        let Some((begin, end)) = mol.bond_endpoints(edge) else {
            continue;
        };
        let bond = mol.bond(edge);
        let (a, b) = if bond.stereo.is_inverted() {
            (end, begin)
        } else {
            (begin, end)
        };
        let stereo = match bond.stereo {
            BondStereo::Up | BondStereo::UpInverted => 1,
            BondStereo::Down | BondStereo::DownInverted => 6,
            BondStereo::UpOrDown | BondStereo::UpOrDownInverted => 4,
            BondStereo::EOrZ => 3,
            BondStereo::None | BondStereo::EZByCoordinates => 0,
        };
        let mut line = format!(
            "{:>3}{:>3}{:>3}{:>3}",
            a.index() + 1,
            b.index() + 1,
            common::bond_code(bond.order, bond.is_aromatic, options),
            stereo
        );
        if options.write_default_properties {
            line.push_str("  0  0  0");
        }
        writeln!(out, "{line}")?;
    }
    write_atom_properties(out, mol, options)?;
    write_sgroups(out, mol, plan)?;
    writeln!(out, "M  END")?;
    Ok(())
}

/// Symbol column text and, for labels the column cannot hold, the alias to
/// write after it.
fn symbol(mol: &Molecule, idx: NodeIndex) -> (&str, Option<&str>) {
    match &mol.atom(idx).kind {
        AtomKind::Pseudo(label) if matches!(label.as_str(), "*" | "LP" | "R#") => (label, None),
        AtomKind::Pseudo(label) => ("*", Some(label)),
        _ => (mol.atom(idx).symbol(), None),
    }
}

fn atom_line(mol: &Molecule, idx: NodeIndex, plan: &Plan, options: &WriterOptions) -> String {
    let atom = mol.atom(idx);
    let [x, y, z] = common::atom_point(atom);
    let charge = match atom.formal_charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    };
    let valence = match hydrogen::valence_to_write(mol, idx, plan.explicit[idx.index()]) {
        Some(0) => 15,
        Some(v) if v < 15 => v as i64,
        Some(v) => {
            log::debug!("valence {v} on atom {} cannot be written", idx.index() + 1);
            0
        }
        None => 0,
    };
    let fields: [i64; 12] = [
        0,
        charge,
        plan.parities[idx.index()].code() as i64,
        0,
        0,
        valence,
        0,
        0,
        0,
        atom.atom_map as i64,
        0,
        0,
    ];
    let keep = if options.write_default_properties {
        fields.len()
    } else {
        fields.iter().rposition(|&v| v != 0).map_or(0, |i| i + 1)
    };

    let mut line = format!(
        "{}{}{} {:<3}",
        format_coordinate(x),
        format_coordinate(y),
        format_coordinate(z),
        symbol(mol, idx).0
    );
    for (i, value) in fields[..keep].iter().enumerate() {
        let width = if i == 0 { 2 } else { 3 };
        line.push_str(&format!("{value:>width$}"));
    }
    line.trim_end().to_string()
}

/// Entries of a count-prefixed command, `per_line` to a line.
/// Like [`write_entries`], with the text left-aligned in its three columns.
fn write_text_entries<W: Write>(
    out: &mut W,
    tag: &str,
    entries: &[(usize, String)],
    per_line: usize,
) -> std::io::Result<()> {
    for chunk in entries.chunks(per_line) {
        write!(out, "M  {tag}{:>3}", chunk.len())?;
        for (n, value) in chunk {
            write!(out, " {n:>3} {value:<3}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_entries<W: Write, T: Display>(
    out: &mut W,
    tag: &str,
    entries: &[(usize, T)],
    per_line: usize,
) -> std::io::Result<()> {
    for chunk in entries.chunks(per_line) {
        write!(out, "M  {tag}{:>3}", chunk.len())?;
        for (n, value) in chunk {
            write!(out, " {n:>3} {value:>3}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_atom_properties<W: Write>(
    out: &mut W,
    mol: &Molecule,
    options: &WriterOptions,
) -> std::io::Result<()> {
    let mut charges = Vec::new();
    let mut radicals = Vec::new();
    let mut isotopes = Vec::new();
    let mut rgroups = Vec::new();
    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        let n = idx.index() + 1;
        if atom.formal_charge != 0 {
            charges.push((n, atom.formal_charge as i64));
        }
        let radical = common::radical_code(atom.unpaired_electrons);
        if radical != 0 {
            radicals.push((n, radical as i64));
        }
        if let Some(mass) = common::isotope_to_write(atom, options) {
            isotopes.push((n, mass as i64));
        }
        if let Some(r) = atom.rgroup {
            rgroups.push((n, r as i64));
        }
    }
    write_entries(out, "CHG", &charges, 8)?;
    write_entries(out, "RAD", &radicals, 8)?;
    write_entries(out, "ISO", &isotopes, 8)?;
    write_entries(out, "RGP", &rgroups, 8)?;

    for idx in mol.atoms() {
        let n = idx.index() + 1;
        let atom = mol.atom(idx);
        if let AtomKind::Query(QueryAtom::List { elements, negated }) = &atom.kind {
            write!(
                out,
                "M  ALS {n:>3}{:>3} {} ",
                elements.len(),
                if *negated { 'T' } else { 'F' }
            )?;
            for e in elements {
                write!(out, "{:<4}", e.symbol())?;
            }
            writeln!(out)?;
        }
        if let (_, Some(alias)) = symbol(mol, idx) {
            writeln!(out, "A  {n:>3}")?;
            writeln!(out, "{alias}")?;
        }
        if let Some(value) = &atom.value {
            writeln!(out, "V  {n:>3} {value}")?;
        }
    }
    Ok(())
}

fn write_sgroups<W: Write>(out: &mut W, mol: &Molecule, plan: &Plan) -> std::io::Result<()> {
    if plan.sgroups.is_empty() {
        return Ok(());
    }
    let groups: Vec<(usize, &Sgroup)> = plan
        .sgroups
        .iter()
        .enumerate()
        .map(|(i, &id)| (i + 1, mol.sgroup(id)))
        .collect();

    let pairs = |f: &dyn Fn(&Sgroup) -> Option<String>| -> Vec<(usize, String)> {
        groups
            .iter()
            .filter_map(|(n, sg)| f(sg).map(|v| (*n, v)))
            .collect()
    };

    write_text_entries(out, "STY", &pairs(&|sg| sg.kind.code().map(str::to_string)), 8)?;
    write_text_entries(out, "SST", &pairs(&|sg| sg.text(SgroupKey::Subtype).map(str::to_string)), 8)?;
    let labels: Vec<(usize, usize)> = groups
        .iter()
        .map(|(n, sg)| (*n, sg.number(SgroupKey::Identifier).map_or(*n, |v| v as usize)))
        .collect();
    write_entries(out, "SLB", &labels, 8)?;
    write_text_entries(
        out,
        "SCN",
        &pairs(&|sg| sg.text(SgroupKey::Connectivity).map(str::to_string)),
        8,
    )?;

    for (n, sg) in &groups {
        let atoms: Vec<usize> = sg.atoms().iter().map(|a| a.index() + 1).collect();
        write_members(out, "SAL", *n, &atoms)?;
        let bonds: Vec<usize> = sg.bonds().iter().map(|b| b.index() + 1).collect();
        write_members(out, "SBL", *n, &bonds)?;
        let parent_atoms: Vec<usize> = sg.parent_atoms().iter().map(|a| a.index() + 1).collect();
        write_members(out, "SPA", *n, &parent_atoms)?;
        for bracket in sg.brackets() {
            writeln!(
                out,
                "M  SDI {n:>3}  4{}{}{}{}",
                format_coordinate(bracket.start[0]),
                format_coordinate(bracket.start[1]),
                format_coordinate(bracket.end[0]),
                format_coordinate(bracket.end[1])
            )?;
        }
    }

    write_entries(
        out,
        "SBT",
        &pairs(&|sg| match sg.bracket_style() {
            Some(BracketStyle::Round) => Some("1".to_string()),
            Some(BracketStyle::Square) => Some("0".to_string()),
            None => None,
        }),
        8,
    )?;

    for (n, sg) in &groups {
        if let Some(text) = sg.subscript() {
            writeln!(out, "M  SMT {n:>3} {text}")?;
        }
    }

    let mut links = Vec::new();
    for (n, sg) in &groups {
        for &parent in sg.parents() {
            if let Some(p) = plan.sgroup_number(parent) {
                links.push((*n, p));
            }
        }
    }
    write_entries(out, "SPL", &links, 8)?;
    write_entries(
        out,
        "SNC",
        &pairs(&|sg| sg.number(SgroupKey::ComponentNumber).map(|c| c.to_string())),
        8,
    )?;

    let expanded: Vec<usize> = groups
        .iter()
        .filter(|(_, sg)| sg.flag(SgroupKey::Expansion))
        .map(|(n, _)| *n)
        .collect();
    for chunk in expanded.chunks(15) {
        write!(out, "M  SDS EXP{:>3}", chunk.len())?;
        for n in chunk {
            write!(out, " {n:>3}")?;
        }
        writeln!(out)?;
    }

    for (n, sg) in &groups {
        if !sg.attach_points().is_empty() {
            for chunk in sg.attach_points().chunks(6) {
                write!(out, "M  SAP {n:>3}{:>3}", chunk.len())?;
                for point in chunk {
                    let leaving = point.leaving.map_or(0, |l| l.index() + 1);
                    let id = if point.id.is_empty() { "1" } else { point.id.as_str() };
                    write!(out, " {:>3} {:>3} {:<2}", point.atom.index() + 1, leaving, id)?;
                }
                writeln!(out)?;
            }
        }
        if let Some(class) = sg.text(SgroupKey::Class) {
            writeln!(out, "M  SCL {n:>3} {class}")?;
        }
        write_data(out, *n, sg)?;
    }
    Ok(())
}

fn write_members<W: Write>(out: &mut W, tag: &str, n: usize, items: &[usize]) -> std::io::Result<()> {
    for chunk in items.chunks(15) {
        write!(out, "M  {tag} {n:>3}{:>3}", chunk.len())?;
        for item in chunk {
            write!(out, " {item:>3}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `SDT`, `SDD` and the data text split over `SCD`/`SED` lines.
fn write_data<W: Write>(out: &mut W, n: usize, sg: &Sgroup) -> std::io::Result<()> {
    let name = sg.text(SgroupKey::FieldName);
    let format = sg.text(SgroupKey::FieldFormat);
    let units = sg.text(SgroupKey::FieldUnits);
    if name.is_some() || format.is_some() || units.is_some() {
        let line = format!(
            "M  SDT {n:>3} {:<30}{:<2}{:<20}",
            name.unwrap_or(""),
            format.unwrap_or(""),
            units.unwrap_or("")
        );
        writeln!(out, "{}", line.trim_end())?;
    }
    if let Some(display) = sg.text(SgroupKey::DataDisplay) {
        writeln!(out, "M  SDD {n:>3} {display}")?;
    }
    if let Some(data) = sg.text(SgroupKey::Data) {
        let chars: Vec<char> = data.chars().collect();
        let chunks: Vec<String> = chars
            .chunks(DATA_CHUNK)
            .map(|c| c.iter().collect())
            .collect();
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.iter().enumerate() {
            let tag = if i == last { "SED" } else { "SCD" };
            writeln!(out, "M  {tag} {n:>3} {chunk}")?;
        }
    }
    Ok(())
}
