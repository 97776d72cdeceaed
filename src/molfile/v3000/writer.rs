use std::borrow::Cow;
use std::io::Write;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{AtomKind, QueryAtom};
use crate::bond::BondStereo;
use crate::element::is_pseudo_label;
use crate::hydrogen;
use crate::mol::Molecule;
use crate::sgroup::{BracketStyle, Sgroup, SgroupKey, SgroupType};

use crate::molfile::common::{self, Plan};
use crate::molfile::error::Result;
use crate::molfile::field::clean_coordinate;
use crate::molfile::options::WriterOptions;
use crate::molfile::tagged::{self, format_list, quote};

/// Counts line of a V3000 record; the real counts follow in `COUNTS`.
const DUMMY_COUNTS: &str = "  0  0  0     0  0            999 V3000";

pub(crate) fn write_ctab<W: Write>(
    out: &mut W,
    mol: &Molecule,
    plan: &Plan,
    options: &WriterOptions,
) -> Result<()> {
    writeln!(out, "{DUMMY_COUNTS}")?;
    tagged::write_line(out, "BEGIN CTAB")?;
    tagged::write_line(
        out,
        &format!(
            "COUNTS {} {} {} 0 {}",
            mol.atom_count(),
            mol.bond_count(),
            plan.sgroups.len(),
            u8::from(mol.chiral)
        ),
    )?;

    tagged::write_line(out, "BEGIN ATOM")?;
    for idx in mol.atoms() {
        tagged::write_line(out, &atom_line(mol, idx, plan, options))?;
    }
    tagged::write_line(out, "END ATOM")?;

    if mol.bond_count() > 0 {
        tagged::write_line(out, "BEGIN BOND")?;
        for edge in mol.bonds() {
            if let Some(line) = bond_line(mol, edge, options) {
                tagged::write_line(out, &line)?;
            }
        }
        tagged::write_line(out, "END BOND")?;
    }

    if !plan.sgroups.is_empty() {
        tagged::write_line(out, "BEGIN SGROUP")?;
        for (i, &id) in plan.sgroups.iter().enumerate() {
            tagged::write_line(out, &sgroup_line(i + 1, mol.sgroup(id), plan))?;
        }
        tagged::write_line(out, "END SGROUP")?;
    }

    tagged::write_line(out, "END CTAB")?;
    writeln!(out, "M  END")?;
    Ok(())
}

fn coordinate(x: f64) -> String {
    format!("{:.4}", clean_coordinate(x))
}

fn atom_type(kind: &AtomKind) -> Cow<'_, str> {
    match kind {
        AtomKind::Element(e) => Cow::Borrowed(e.symbol()),
        AtomKind::Query(QueryAtom::Any) => Cow::Borrowed("A"),
        AtomKind::Query(QueryAtom::Hetero) => Cow::Borrowed("Q"),
        AtomKind::Query(QueryAtom::List { elements, negated }) => {
            let symbols: Vec<&str> = elements.iter().map(|e| e.symbol()).collect();
            let list = format!("[{}]", symbols.join(","));
            Cow::Owned(if *negated { format!("NOT {list}") } else { list })
        }
        AtomKind::Pseudo(label) if is_pseudo_label(label) => Cow::Borrowed(label),
        AtomKind::Pseudo(label) => Cow::Owned(format!("\"{}\"", label.replace('"', "\"\""))),
    }
}

fn atom_line(mol: &Molecule, idx: NodeIndex, plan: &Plan, options: &WriterOptions) -> String {
    let atom = mol.atom(idx);
    let [x, y, z] = common::atom_point(atom);
    let mut line = format!(
        "{} {} {} {} {} {}",
        idx.index() + 1,
        atom_type(&atom.kind),
        coordinate(x),
        coordinate(y),
        coordinate(z),
        atom.atom_map
    );
    if atom.formal_charge != 0 {
        line.push_str(&format!(" CHG={}", atom.formal_charge));
    }
    let radical = common::radical_code(atom.unpaired_electrons);
    if radical != 0 {
        line.push_str(&format!(" RAD={radical}"));
    }
    let parity = plan.parities[idx.index()].code();
    if parity != 0 {
        line.push_str(&format!(" CFG={parity}"));
    }
    if let Some(mass) = common::isotope_to_write(atom, options) {
        line.push_str(&format!(" MASS={mass}"));
    }
    match hydrogen::valence_to_write(mol, idx, plan.explicit[idx.index()]) {
        Some(0) => line.push_str(" VAL=-1"),
        Some(v) => line.push_str(&format!(" VAL={v}")),
        None => {}
    }
    if let Some(r) = atom.rgroup {
        line.push_str(&format!(" RGROUPS={}", format_list(&[r])));
    }
    line
}

fn bond_line(mol: &Molecule, edge: EdgeIndex, options: &WriterOptions) -> Option<String> {
    let (begin, end) = mol.bond_endpoints(edge)?;
    let bond = mol.bond(edge);
    let (a, b) = if bond.stereo.is_inverted() {
        (end, begin)
    } else {
        (begin, end)
    };
    let mut line = format!(
        "{} {} {} {}",
        edge.index() + 1,
        common::bond_code(bond.order, bond.is_aromatic, options),
        a.index() + 1,
        b.index() + 1
    );
    let cfg = match bond.stereo {
        BondStereo::Up | BondStereo::UpInverted => 1,
        BondStereo::UpOrDown | BondStereo::UpOrDownInverted | BondStereo::EOrZ => 2,
        BondStereo::Down | BondStereo::DownInverted => 3,
        BondStereo::None | BondStereo::EZByCoordinates => 0,
    };
    if cfg != 0 {
        line.push_str(&format!(" CFG={cfg}"));
    }
    let multicenter = mol
        .sgroups()
        .iter()
        .find(|sg| sg.kind == SgroupType::ExtMulticenter && sg.bonds().contains(&edge));
    if let Some(group) = multicenter {
        let atoms: Vec<usize> = group.atoms().iter().map(|a| a.index() + 1).collect();
        line.push_str(&format!(
            " ENDPTS={} ATTACH={}",
            format_list(&atoms),
            group.text(SgroupKey::Subtype).unwrap_or("ANY")
        ));
    }
    Some(line)
}

fn sgroup_line(n: usize, sg: &Sgroup, plan: &Plan) -> String {
    let external = sg.number(SgroupKey::Identifier).map_or(n, |v| v as usize);
    let mut line = format!("{n} {} {external}", sg.kind.code().unwrap_or("GEN"));
    let mut push = |key: &str, value: String| {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(&value);
    };

    if !sg.atoms().is_empty() {
        let atoms: Vec<usize> = sg.atoms().iter().map(|a| a.index() + 1).collect();
        push("ATOMS", format_list(&atoms));
    }
    if !sg.bonds().is_empty() {
        let bonds: Vec<usize> = sg.bonds().iter().map(|b| b.index() + 1).collect();
        let key = if sg.kind.lists_containment_bonds() { "CBONDS" } else { "XBONDS" };
        push(key, format_list(&bonds));
    }
    if !sg.parent_atoms().is_empty() {
        let atoms: Vec<usize> = sg.parent_atoms().iter().map(|a| a.index() + 1).collect();
        push("PATOMS", format_list(&atoms));
    }
    if let Some(subtype) = sg.text(SgroupKey::Subtype) {
        push("SUBTYPE", quote(subtype).into_owned());
    }
    if let Some(connect) = sg.text(SgroupKey::Connectivity) {
        push("CONNECT", quote(connect).into_owned());
    }
    if let Some(subscript) = sg.subscript() {
        let key = if sg.kind == SgroupType::MultipleGroup { "MULT" } else { "LABEL" };
        push(key, quote(subscript).into_owned());
    }
    if let Some(parent) = sg.parents().first().and_then(|&p| plan.sgroup_number(p)) {
        push("PARENT", parent.to_string());
    }
    if let Some(component) = sg.number(SgroupKey::ComponentNumber) {
        push("COMPNO", component.to_string());
    }
    for bracket in sg.brackets() {
        push(
            "BRKXYZ",
            format!(
                "(9 {} {} 0 {} {} 0 0 0 0)",
                coordinate(bracket.start[0]),
                coordinate(bracket.start[1]),
                coordinate(bracket.end[0]),
                coordinate(bracket.end[1])
            ),
        );
    }
    if sg.bracket_style() == Some(BracketStyle::Round) {
        push("BRKTYP", "PAREN".to_string());
    }
    if sg.flag(SgroupKey::Expansion) {
        push("ESTATE", "E".to_string());
    }
    if let Some(class) = sg.text(SgroupKey::Class) {
        push("CLASS", quote(class).into_owned());
    }
    for point in sg.attach_points() {
        let leaving = point.leaving.map_or(0, |l| l.index() + 1);
        let id = if point.id.is_empty() { "1" } else { point.id.as_str() };
        push(
            "SAP",
            format!("(3 {} {leaving} {})", point.atom.index() + 1, quote(id)),
        );
    }
    for (key, attr) in [
        ("FIELDNAME", SgroupKey::FieldName),
        ("FIELDINFO", SgroupKey::FieldUnits),
        ("FIELDDISP", SgroupKey::DataDisplay),
        ("FIELDDATA", SgroupKey::Data),
    ] {
        if let Some(text) = sg.text(attr) {
            push(key, quote(text).into_owned());
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::{Bond, BondOrder};
    use crate::element::Element;
    use crate::sgroup::SgroupBracket;

    fn write(mol: &Molecule) -> String {
        let options = WriterOptions::default();
        let plan = Plan::new(mol, &options).unwrap();
        let mut buf = Vec::new();
        write_ctab(&mut buf, mol, &plan, &options).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn block_layout() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(Element::C));
        let o = mol.add_atom(Atom::new(Element::O));
        mol.atom_mut(o).formal_charge = -1;
        mol.atom_mut(o).isotope = Some(18);
        mol.atom_mut(c).point_2d = Some([1.5, -0.25]);
        mol.add_bond(c, o, Bond::new(BondOrder::Single));
        let text = write(&mol);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                DUMMY_COUNTS,
                "M  V30 BEGIN CTAB",
                "M  V30 COUNTS 2 1 0 0 0",
                "M  V30 BEGIN ATOM",
                "M  V30 1 C 1.5000 -0.2500 0.0000 0",
                "M  V30 2 O 0.0000 0.0000 0.0000 0 CHG=-1 MASS=18",
                "M  V30 END ATOM",
                "M  V30 BEGIN BOND",
                "M  V30 1 1 1 2",
                "M  V30 END BOND",
                "M  V30 END CTAB",
                "M  END",
            ]
        );
    }

    #[test]
    fn atom_types() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::query(QueryAtom::List {
            elements: vec![Element::C, Element::N],
            negated: true,
        }));
        mol.add_atom(Atom::pseudo("R#"));
        mol.add_atom(Atom::pseudo("Ph"));
        let text = write(&mol);
        assert!(text.contains("M  V30 1 NOT [C,N] 0.0000"));
        assert!(text.contains("M  V30 2 R# 0.0000"));
        assert!(text.contains("M  V30 3 \"Ph\" 0.0000"));
    }

    #[test]
    fn long_lines_wrap() {
        let mut mol = Molecule::new();
        let atoms: Vec<NodeIndex> = (0..40).map(|_| mol.add_atom(Atom::new(Element::C))).collect();
        let mut group = Sgroup::new(SgroupType::Generic);
        for &a in &atoms {
            group.add_atom(a);
        }
        mol.add_sgroup(group);
        let text = write(&mol);
        assert!(text.lines().all(|l| l.len() <= 78));
        assert!(text.lines().any(|l| l.starts_with("M  V30 1 GEN 1 ATOMS=(40 1 2")));
    }

    #[test]
    fn multicenter_bond() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(Element::C));
        let b = mol.add_atom(Atom::new(Element::C));
        let star = mol.add_atom(Atom::pseudo("*"));
        let cl = mol.add_atom(Atom::new(Element::Cl));
        mol.add_bond(a, b, Bond::new(BondOrder::Single));
        let edge = mol.add_bond(star, cl, Bond::new(BondOrder::Single));
        let mut group = Sgroup::new(SgroupType::ExtMulticenter);
        group.add_atom(a);
        group.add_atom(b);
        group.add_bond(edge);
        group.put(SgroupKey::Subtype, "ANY");
        mol.add_sgroup(group);
        let text = write(&mol);
        assert!(text.contains("M  V30 2 1 3 4 ENDPTS=(2 1 2) ATTACH=ANY\n"));
        assert!(text.contains("COUNTS 4 2 0 0 0"));
        assert!(!text.contains("BEGIN SGROUP"));
    }

    #[test]
    fn sgroup_attributes() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(Element::C));
        let mut sup = Sgroup::new(SgroupType::Superatom);
        sup.add_atom(a);
        sup.put(SgroupKey::Subscript, "Me");
        sup.put(SgroupKey::Expansion, true);
        sup.add_bracket(SgroupBracket {
            start: [1.0, 2.0],
            end: [3.0, 4.0],
        });
        let sup = mol.add_sgroup(sup);
        let mut dat = Sgroup::new(SgroupType::Data);
        dat.put(SgroupKey::FieldName, "note");
        dat.put(SgroupKey::Data, "two words");
        let dat = mol.add_sgroup(dat);
        mol.add_sgroup_parent(dat, sup).unwrap();
        let text = write(&mol);
        assert!(text.contains(
            "M  V30 1 SUP 1 ATOMS=(1 1) LABEL=Me BRKXYZ=(9 1.0000 2.0000 0 3.0000 4.0000 0-\n\
             M  V30  0 0 0) ESTATE=E\n"
        ));
        assert!(text.contains("M  V30 2 DAT 2 PARENT=1 FIELDNAME=note FIELDDATA=\"two words\"\n"));
    }
}
