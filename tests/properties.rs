use petgraph::graph::NodeIndex;

use molcrab::molfile::{from_molfile, from_molfile_with, to_molfile, to_molfile_with};
use molcrab::molfile::{
    MolfileError, MolfileReader, ReaderOptions, VersionPolicy, WriteError, WriterOptions,
};
use molcrab::{
    Atom, Bond, BondOrder, Element, Molecule, Sgroup, SgroupKey, SgroupType, TetrahedralStereo,
    Winding,
};

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }
    out
}

/// A stereocenter bonded to `substituents` in the order given by
/// `bond_order`, laid out flat around the origin.
fn center(substituents: &[Element], bond_order: &[usize], winding: Winding) -> Molecule {
    const SPOKES: [[f64; 2]; 4] = [[0.0, 1.0], [1.0, 0.0], [0.0, -1.0], [-1.0, 0.0]];
    let mut mol = Molecule::new();
    let c = mol.add_atom(Atom::new(Element::C));
    mol.atom_mut(c).point_2d = Some([0.0, 0.0]);
    let others: Vec<NodeIndex> = substituents
        .iter()
        .zip(SPOKES)
        .map(|(&e, point)| {
            let idx = mol.add_atom(Atom::new(e));
            mol.atom_mut(idx).point_2d = Some(point);
            idx
        })
        .collect();
    for &i in bond_order {
        mol.add_bond(c, others[i], Bond::new(BondOrder::Single));
    }
    let mut neighbors = [c; 4];
    neighbors[..others.len()].copy_from_slice(&others);
    mol.add_tetrahedral_stereo(TetrahedralStereo {
        focus: c,
        neighbors,
        winding,
    });
    mol
}

fn assert_configuration_survives(mol: &Molecule, options: &WriterOptions, case: &str) {
    let original = mol.tetrahedral_stereo()[0];
    let text = to_molfile_with(mol, options).unwrap();
    let back = from_molfile(&text).unwrap();
    let read = back
        .tetrahedral_stereo_for(original.focus)
        .unwrap_or_else(|| panic!("{case}: no stereocenter after reading\n{text}"));
    assert!(original.same_configuration(read), "{case}: {original:?} became {read:?}\n{text}");
}

// ---------------------------------------------------------------------------
// Parity over every bond ordering
// ---------------------------------------------------------------------------

#[test]
fn parity_survives_any_bond_order() {
    let halogens = [Element::F, Element::Cl, Element::Br, Element::I];
    for version in [VersionPolicy::V2000, VersionPolicy::V3000] {
        let options = WriterOptions::default().with_version(version);
        for order in permutations(&[0, 1, 2, 3]) {
            for winding in [Winding::Clockwise, Winding::AntiClockwise] {
                let mol = center(&halogens, &order, winding);
                let case = format!("{version:?} {order:?} {winding:?}");
                assert_configuration_survives(&mol, &options, &case);
            }
        }
    }
}

#[test]
fn parity_with_implicit_hydrogen() {
    let substituents = [Element::F, Element::Cl, Element::Br];
    let options = WriterOptions::default();
    for order in permutations(&[0, 1, 2]) {
        for winding in [Winding::Clockwise, Winding::AntiClockwise] {
            let mol = center(&substituents, &order, winding);
            assert_configuration_survives(&mol, &options, &format!("{order:?} {winding:?}"));
        }
    }
}

#[test]
fn opposite_windings_write_opposite_parities() {
    let halogens = [Element::F, Element::Cl, Element::Br, Element::I];
    let parity = |winding| {
        let text = to_molfile(&center(&halogens, &[0, 1, 2, 3], winding)).unwrap();
        let atom_line = text.lines().nth(4).unwrap().to_string();
        atom_line[39..42].trim().to_string()
    };
    let cw = parity(Winding::Clockwise);
    let acw = parity(Winding::AntiClockwise);
    assert_ne!(cw, acw);
    assert!(["1", "2"].contains(&cw.as_str()));
    assert!(["1", "2"].contains(&acw.as_str()));
}

#[test]
fn parities_can_stay_atom_flags() {
    let halogens = [Element::F, Element::Cl, Element::Br, Element::I];
    let text = to_molfile(&center(&halogens, &[0, 1, 2, 3], Winding::Clockwise)).unwrap();
    let options = ReaderOptions::default().with_stereo_elements(false);
    let back = from_molfile_with(&text, options).unwrap();
    assert!(back.tetrahedral_stereo().is_empty());
    assert_ne!(back.atom(NodeIndex::new(0)).parity.code(), 0);
}

#[test]
fn parities_without_coordinates_stay_atom_flags() {
    let halogens = [Element::F, Element::Cl, Element::Br, Element::I];
    let mut mol = center(&halogens, &[0, 1, 2, 3], Winding::Clockwise);
    for idx in mol.atoms().collect::<Vec<_>>() {
        mol.atom_mut(idx).point_2d = None;
    }
    let text = to_molfile(&mol).unwrap();
    assert!(text.lines().nth(1).unwrap().ends_with("2D"));
    let back = from_molfile(&text).unwrap();
    assert!(back.tetrahedral_stereo().is_empty());
    assert_ne!(back.atom(NodeIndex::new(0)).parity.code(), 0);
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

#[test]
fn coordinates_round_to_four_places() {
    let mut mol = Molecule::new();
    let a = mol.add_atom(Atom::new(Element::C));
    let b = mol.add_atom(Atom::new(Element::O));
    mol.add_bond(a, b, Bond::new(BondOrder::Single));
    mol.atom_mut(a).point_2d = Some([1.23456, -0.00001]);
    mol.atom_mut(b).point_2d = Some([-2.5, 0.75]);

    let text = to_molfile(&mol).unwrap();
    assert!(text.lines().nth(4).unwrap().starts_with("    1.2346    0.0000    0.0000 C"));
    let back = from_molfile(&text).unwrap();
    assert_eq!(back.atom(a).point_2d, Some([1.2346, 0.0]));
    assert_eq!(back.atom(b).point_2d, Some([-2.5, 0.75]));
    assert_eq!(back.atom(a).point_3d, None);
}

#[test]
fn three_dimensional_coordinates() {
    let mut mol = Molecule::new();
    let a = mol.add_atom(Atom::new(Element::N));
    mol.atom_mut(a).point_3d = Some([1.0, 2.0, -3.5]);
    for version in [VersionPolicy::V2000, VersionPolicy::V3000] {
        let text = to_molfile_with(&mol, &WriterOptions::default().with_version(version)).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with("3D"));
        let back = from_molfile(&text).unwrap();
        assert_eq!(back.atom(a).point_3d, Some([1.0, 2.0, -3.5]));
    }
}

#[test]
fn far_coordinates_move_to_v3000() {
    let mut mol = Molecule::new();
    let a = mol.add_atom(Atom::new(Element::C));
    let b = mol.add_atom(Atom::new(Element::C));
    mol.add_bond(a, b, Bond::new(BondOrder::Single));
    mol.atom_mut(a).point_2d = Some([-12345.5, 1.0]);
    mol.atom_mut(b).point_2d = Some([0.0, 1.0]);

    let text = to_molfile(&mol).unwrap();
    assert!(text.lines().nth(3).is_some_and(|l| l.ends_with("V3000")));
    let back = from_molfile(&text).unwrap();
    assert_eq!(back.atom(a).point_2d, Some([-12345.5, 1.0]));

    let v2000 = WriterOptions::default().with_version(VersionPolicy::V2000);
    assert!(matches!(
        to_molfile_with(&mol, &v2000),
        Err(MolfileError::Unsupported(WriteError::CoordinateOutOfRange { atom: 1 }))
    ));
}

// ---------------------------------------------------------------------------
// Sgroups
// ---------------------------------------------------------------------------

#[test]
fn trailing_dash_values_survive_v3000() {
    let mut mol = Molecule::new();
    let a = mol.add_atom(Atom::new(Element::N));
    let mut dat = Sgroup::new(SgroupType::Data);
    dat.add_atom(a);
    dat.put(SgroupKey::FieldName, "charge");
    dat.put(SgroupKey::Data, "2-");
    mol.add_sgroup(dat);
    let mut sup = Sgroup::new(SgroupType::Superatom);
    sup.add_atom(a);
    sup.put(SgroupKey::Subscript, "CH2-");
    mol.add_sgroup(sup);

    let options = WriterOptions::default().with_version(VersionPolicy::V3000);
    let text = to_molfile_with(&mol, &options).unwrap();
    let back = from_molfile(&text).unwrap();
    assert_eq!(back.sgroups().len(), 2);
    assert_eq!(back.sgroups()[0].text(SgroupKey::Data), Some("2-"));
    assert_eq!(back.sgroups()[1].subscript(), Some("CH2-"));
}

#[test]
fn positional_variation_bonds_need_v3000() {
    let mut mol = Molecule::new();
    let a = mol.add_atom(Atom::new(Element::C));
    let b = mol.add_atom(Atom::new(Element::C));
    let n = mol.add_atom(Atom::new(Element::N));
    let star = mol.add_atom(Atom::pseudo("*"));
    mol.add_bond(a, b, Bond::new(BondOrder::Double));
    let e = mol.add_bond(n, star, Bond::new(BondOrder::Single));
    let mut group = Sgroup::new(SgroupType::ExtMulticenter);
    group.add_atom(a);
    group.add_atom(b);
    group.add_bond(e);
    group.put(SgroupKey::Subtype, "ANY");
    mol.add_sgroup(group);

    let text = to_molfile(&mol).unwrap();
    assert!(text.contains("ENDPTS=(2 1 2) ATTACH=ANY"), "{text}");
    let back = from_molfile(&text).unwrap();
    assert_eq!(back.sgroups().len(), 1);
    assert_eq!(back.sgroups()[0].kind, SgroupType::ExtMulticenter);
    assert_eq!(back.sgroups()[0].atoms(), &[a, b]);

    let v2000 = WriterOptions::default().with_version(VersionPolicy::V2000);
    assert!(matches!(
        to_molfile_with(&mol, &v2000),
        Err(MolfileError::Unsupported(WriteError::MulticenterBond { bond: 2 }))
    ));
}

const CYCLIC_PARENTS: &str = "\
cycle


  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
M  STY  2   1 GEN   2 GEN
M  SAL   1  1   1
M  SAL   2  1   1
M  SPL  2   1   2   2   1
M  END
";

#[test]
fn cyclic_parents_fail_strict_reads() {
    assert!(matches!(
        from_molfile_with(CYCLIC_PARENTS, ReaderOptions::strict()),
        Err(MolfileError::Parse { line: 9, .. })
    ));
}

#[test]
fn cyclic_parents_are_dropped_when_relaxed() {
    let mut reader = MolfileReader::new(CYCLIC_PARENTS.as_bytes());
    let mol = reader.read().unwrap().unwrap();
    assert_eq!(mol.sgroups().len(), 2);
    let links: usize = mol.sgroups().iter().map(|sg| sg.parents().len()).sum();
    assert_eq!(links, 1);
    assert!(!reader.diagnostics().is_empty());

    let text = to_molfile(&mol).unwrap();
    assert!(text.contains("M  SPL  1"));
    assert_eq!(from_molfile(&text).unwrap().sgroups().len(), 2);
}

// ---------------------------------------------------------------------------
// SD files
// ---------------------------------------------------------------------------

#[test]
fn multi_record_sdf() {
    let mut sdf = String::new();
    for (i, element) in [Element::C, Element::N, Element::O].into_iter().enumerate() {
        let mut mol = Molecule::new();
        mol.title = Some(format!("record {i}"));
        mol.add_atom(Atom::new(element));
        sdf.push_str(&to_molfile(&mol).unwrap());
        sdf.push_str(&format!("> <INDEX>\n{i}\n\n$$$$\n"));
    }

    let records: Vec<Molecule> = MolfileReader::new(sdf.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 3);
    for (i, mol) in records.iter().enumerate() {
        assert_eq!(mol.title.as_deref(), Some(format!("record {i}").as_str()));
        assert_eq!(mol.property("INDEX"), Some(i.to_string().as_str()));
    }
    let hs: Vec<Option<u8>> = records
        .iter()
        .map(|m| m.atom(NodeIndex::new(0)).implicit_hydrogens)
        .collect();
    assert_eq!(hs, [Some(4), Some(3), Some(2)]);
}
