use petgraph::graph::NodeIndex;

use crate::atom::AtomKind;
use crate::mol::Molecule;
use crate::valence::implicit_valence;

/// Bond order sum per atom. An atom touching any query bond gets `None`:
/// its valence is unknown and no hydrogens will be inferred for it.
pub fn explicit_valences(mol: &Molecule) -> Vec<Option<u32>> {
    let mut valences = vec![Some(0u32); mol.atom_count()];
    for edge in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        let contribution = mol.bond(edge).order.valence();
        for end in [a, b] {
            let slot = &mut valences[end.index()];
            *slot = match (*slot, contribution) {
                (Some(sum), Some(c)) => Some(sum + c),
                _ => None,
            };
        }
    }
    valences
}

/// Fills `implicit_hydrogens` from the MDL valence model.
///
/// `explicit` holds the bond order sum of every atom, `None` for atoms whose
/// valence was poisoned by a query bond; those atoms are left untouched.
/// Pseudo and query atoms never carry implicit hydrogens.
pub fn assign_implicit_hydrogens(mol: &mut Molecule, explicit: &[Option<u32>]) {
    let indices: Vec<NodeIndex> = mol.atoms().collect();
    for idx in indices {
        let Some(Some(bond_sum)) = explicit.get(idx.index()).copied() else {
            continue;
        };
        let atom = mol.atom_mut(idx);
        let AtomKind::Element(element) = atom.kind else {
            atom.implicit_hydrogens = Some(0);
            continue;
        };
        let used = bond_sum + atom.unpaired_electrons as u32;
        let total = match atom.valence {
            Some(valence) => valence as u32,
            None => implicit_valence(element.atomic_num(), atom.formal_charge, used),
        };
        atom.implicit_hydrogens = Some(total.saturating_sub(used).min(u8::MAX as u32) as u8);
    }
}

/// Valence that must be written explicitly for an atom so a reader applying
/// the valence model recovers its hydrogen count. `None` when the model
/// already agrees, or the atom is not an element.
pub fn valence_to_write(mol: &Molecule, idx: NodeIndex, bond_sum: Option<u32>) -> Option<u8> {
    let atom = mol.atom(idx);
    let element = atom.element()?;
    let used = bond_sum? + atom.unpaired_electrons as u32;
    let actual = match (atom.valence, atom.implicit_hydrogens) {
        (Some(valence), _) => valence as u32,
        (None, Some(h)) => used + h as u32,
        (None, None) => return None,
    };
    let expected = implicit_valence(element.atomic_num(), atom.formal_charge, used);
    if actual == expected {
        None
    } else {
        Some(actual.min(u8::MAX as u32) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Atom, QueryAtom};
    use crate::bond::{Bond, BondOrder};
    use crate::element::Element;

    fn ethanol() -> Molecule {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom::new(Element::C));
        let c2 = mol.add_atom(Atom::new(Element::C));
        let o = mol.add_atom(Atom::new(Element::O));
        mol.add_bond(c1, c2, Bond::default());
        mol.add_bond(c2, o, Bond::default());
        mol
    }

    fn hydrogens(mol: &Molecule) -> Vec<Option<u8>> {
        mol.atoms().map(|i| mol.atom(i).implicit_hydrogens).collect()
    }

    #[test]
    fn ethanol_hydrogens() {
        let mut mol = ethanol();
        let explicit = explicit_valences(&mol);
        assert_eq!(explicit, vec![Some(1), Some(2), Some(1)]);
        assign_implicit_hydrogens(&mut mol, &explicit);
        assert_eq!(hydrogens(&mol), vec![Some(3), Some(2), Some(1)]);
    }

    #[test]
    fn charge_changes_hydrogens() {
        let mut mol = ethanol();
        mol.atom_mut(NodeIndex::new(2)).formal_charge = -1;
        let explicit = explicit_valences(&mol);
        assign_implicit_hydrogens(&mut mol, &explicit);
        assert_eq!(mol.atom(NodeIndex::new(2)).implicit_hydrogens, Some(0));
    }

    #[test]
    fn query_bond_poisons_both_ends() {
        let mut mol = ethanol();
        let n = mol.add_atom(Atom::new(Element::N));
        mol.add_bond(NodeIndex::new(2), n, Bond::new(BondOrder::Any));
        let explicit = explicit_valences(&mol);
        assert_eq!(explicit[2], None);
        assert_eq!(explicit[3], None);
        assign_implicit_hydrogens(&mut mol, &explicit);
        assert_eq!(mol.atom(NodeIndex::new(2)).implicit_hydrogens, None);
        assert_eq!(mol.atom(n).implicit_hydrogens, None);
        assert_eq!(mol.atom(NodeIndex::new(0)).implicit_hydrogens, Some(3));
    }

    #[test]
    fn valence_override_wins() {
        let mut mol = ethanol();
        mol.atom_mut(NodeIndex::new(0)).valence = Some(1);
        let explicit = explicit_valences(&mol);
        assign_implicit_hydrogens(&mut mol, &explicit);
        assert_eq!(mol.atom(NodeIndex::new(0)).implicit_hydrogens, Some(0));
        assert_eq!(
            valence_to_write(&mol, NodeIndex::new(0), explicit[0]),
            Some(1)
        );
        assert_eq!(valence_to_write(&mol, NodeIndex::new(1), explicit[1]), None);
    }

    #[test]
    fn radical_consumes_valence() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(Element::C));
        mol.atom_mut(c).unpaired_electrons = 1;
        let explicit = explicit_valences(&mol);
        assign_implicit_hydrogens(&mut mol, &explicit);
        assert_eq!(mol.atom(c).implicit_hydrogens, Some(3));
    }

    #[test]
    fn pseudo_and_query_atoms_get_none_implied() {
        let mut mol = Molecule::new();
        let r = mol.add_atom(Atom::pseudo("R#"));
        let q = mol.add_atom(Atom::query(QueryAtom::Hetero));
        mol.add_bond(r, q, Bond::default());
        let explicit = explicit_valences(&mol);
        assign_implicit_hydrogens(&mut mol, &explicit);
        assert_eq!(hydrogens(&mol), vec![Some(0), Some(0)]);
        assert_eq!(valence_to_write(&mol, r, explicit[0]), None);
    }

    #[test]
    fn hydrogen_count_above_model_needs_valence() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(Element::C));
        mol.atom_mut(c).implicit_hydrogens = Some(2);
        assert_eq!(valence_to_write(&mol, c, Some(0)), Some(2));
        mol.atom_mut(c).implicit_hydrogens = Some(4);
        assert_eq!(valence_to_write(&mol, c, Some(0)), None);
    }
}
