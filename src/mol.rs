use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::sgroup::{self, Sgroup, SgroupError, SgroupId};
use crate::stereo::TetrahedralStereo;

/// Coordinate dimensionality of a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// No coordinates (or all coordinates zero).
    Zero,
    Two,
    Three,
}

/// A connection table plus everything that travels with it in a molfile
/// record: header lines, Sgroups, 0D stereo and SDF data items.
///
/// Atoms and bonds keep file order: `NodeIndex::new(i)` is the atom on the
/// `i + 1`-th atom line, and bond endpoints keep their begin/end order.
#[derive(Clone, Default)]
pub struct Molecule {
    graph: UnGraph<Atom, Bond>,
    sgroups: Vec<Sgroup>,
    tetrahedral_stereo: Vec<TetrahedralStereo>,
    properties: Vec<(String, String)>,
    pub title: Option<String>,
    pub program: Option<String>,
    pub comment: Option<String>,
    /// Chiral flag from the counts line.
    pub chiral: bool,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &UnGraph<Atom, Bond> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut Atom {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &Bond {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut Bond {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: Bond) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Atom at a 1-based file position.
    pub fn atom_at(&self, position: usize) -> Option<NodeIndex> {
        if position >= 1 && position <= self.atom_count() {
            Some(NodeIndex::new(position - 1))
        } else {
            None
        }
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    /// Neighbours in the order their bonds appear in the bond block.
    ///
    /// petgraph iterates adjacency most-recent-first, which is not file
    /// order; parity decoding depends on file order.
    pub fn neighbors_in_bond_order(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges(idx)
            .map(|e| (e.id(), if e.source() == idx { e.target() } else { e.source() }))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, nbr)| nbr).collect()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    /// Begin and end atom, in the order the bond was added.
    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// True when any bond carries a query order.
    pub fn is_query(&self) -> bool {
        self.graph.edge_weights().any(|b| b.order.is_query())
    }

    pub fn dimension(&self) -> Dimension {
        if self.graph.node_weights().any(|a| a.point_3d.is_some()) {
            Dimension::Three
        } else if self.graph.node_weights().any(|a| a.point_2d.is_some()) {
            Dimension::Two
        } else {
            Dimension::Zero
        }
    }

    pub fn tetrahedral_stereo(&self) -> &[TetrahedralStereo] {
        &self.tetrahedral_stereo
    }

    pub fn tetrahedral_stereo_for(&self, focus: NodeIndex) -> Option<&TetrahedralStereo> {
        self.tetrahedral_stereo.iter().find(|s| s.focus == focus)
    }

    pub fn add_tetrahedral_stereo(&mut self, stereo: TetrahedralStereo) {
        self.tetrahedral_stereo.retain(|s| s.focus != stereo.focus);
        self.tetrahedral_stereo.push(stereo);
    }

    pub fn sgroups(&self) -> &[Sgroup] {
        &self.sgroups
    }

    pub fn sgroup(&self, id: SgroupId) -> &Sgroup {
        &self.sgroups[id.0]
    }

    pub fn sgroup_mut(&mut self, id: SgroupId) -> &mut Sgroup {
        &mut self.sgroups[id.0]
    }

    pub fn add_sgroup(&mut self, sgroup: Sgroup) -> SgroupId {
        self.sgroups.push(sgroup);
        SgroupId(self.sgroups.len() - 1)
    }

    pub(crate) fn sgroups_mut(&mut self) -> &mut Vec<Sgroup> {
        &mut self.sgroups
    }

    /// Links `child` under `parent`, refusing links that would close a
    /// cycle.
    pub fn add_sgroup_parent(
        &mut self,
        child: SgroupId,
        parent: SgroupId,
    ) -> Result<(), SgroupError> {
        let n = self.sgroups.len();
        if child.0 >= n {
            return Err(SgroupError::Unknown(child.0));
        }
        if parent.0 >= n {
            return Err(SgroupError::Unknown(parent.0));
        }
        if child == parent || sgroup::is_ancestor(&self.sgroups, parent, child) {
            return Err(SgroupError::Cycle {
                child: child.0,
                parent: parent.0,
            });
        }
        self.sgroups[child.0].push_parent(parent);
        Ok(())
    }

    /// Writable Sgroups, parents before children.
    pub fn sgroup_emission_order(&self) -> Result<Vec<SgroupId>, SgroupError> {
        sgroup::emission_order(&self.sgroups)
    }

    /// SDF data items in insertion order.
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }
}

impl std::fmt::Debug for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Molecule")
            .field("title", &self.title)
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .field("sgroups", &self.sgroups.len())
            .field("tetrahedral_stereo", &self.tetrahedral_stereo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::element::Element;
    use crate::sgroup::SgroupType;

    #[test]
    fn add_atoms_and_bonds() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(Element::C));
        let o = mol.add_atom(Atom::new(Element::O));
        let e = mol.add_bond(c, o, Bond::new(BondOrder::Double));

        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 1);
        assert_eq!(mol.bond(e).order, BondOrder::Double);
        assert_eq!(mol.bond_endpoints(e), Some((c, o)));
        assert_eq!(mol.bond_between(o, c), Some(e));
        assert_eq!(mol.bonds_of(c).collect::<Vec<_>>(), vec![e]);
        assert_eq!(mol.atom_at(1), Some(c));
        assert_eq!(mol.atom_at(0), None);
        assert_eq!(mol.atom_at(3), None);
    }

    #[test]
    fn neighbors_follow_bond_order() {
        let mut mol = Molecule::new();
        let center = mol.add_atom(Atom::new(Element::C));
        let others: Vec<_> = (0..4).map(|_| mol.add_atom(Atom::new(Element::F))).collect();
        for &o in &others {
            mol.add_bond(center, o, Bond::default());
        }
        assert_eq!(mol.neighbors_in_bond_order(center), others);
        assert_eq!(mol.neighbors_in_bond_order(others[2]), vec![center]);
    }

    #[test]
    fn query_bond_makes_query_molecule() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(Element::C));
        let b = mol.add_atom(Atom::new(Element::C));
        mol.add_bond(a, b, Bond::default());
        assert!(!mol.is_query());
        let c = mol.add_atom(Atom::new(Element::N));
        mol.add_bond(b, c, Bond::new(BondOrder::Any));
        assert!(mol.is_query());
    }

    #[test]
    fn dimension_detection() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(Element::C));
        assert_eq!(mol.dimension(), Dimension::Zero);
        assert!(!mol.atom(a).has_coordinates());
        mol.atom_mut(a).point_2d = Some([1.0, 2.0]);
        assert!(mol.atom(a).has_coordinates());
        assert_eq!(mol.dimension(), Dimension::Two);
        mol.atom_mut(a).point_3d = Some([1.0, 2.0, 3.0]);
        assert_eq!(mol.dimension(), Dimension::Three);
    }

    #[test]
    fn sgroup_parent_cycle_rejected() {
        let mut mol = Molecule::new();
        let a = mol.add_sgroup(Sgroup::new(SgroupType::Generic));
        let b = mol.add_sgroup(Sgroup::new(SgroupType::Generic));
        let c = mol.add_sgroup(Sgroup::new(SgroupType::Generic));
        mol.add_sgroup_parent(a, b).unwrap();
        mol.add_sgroup_parent(b, c).unwrap();
        assert_eq!(
            mol.add_sgroup_parent(c, a),
            Err(SgroupError::Cycle { child: 2, parent: 0 })
        );
        assert!(mol.add_sgroup_parent(a, a).is_err());
        assert!(mol.add_sgroup_parent(a, SgroupId(9)).is_err());
        assert_eq!(mol.sgroup_emission_order().unwrap(), vec![c, b, a]);
    }

    #[test]
    fn properties_keep_insertion_order() {
        let mut mol = Molecule::new();
        mol.set_property("ID", "1");
        mol.set_property("NAME", "ethanol");
        mol.set_property("ID", "2");
        assert_eq!(
            mol.properties(),
            &[
                ("ID".to_string(), "2".to_string()),
                ("NAME".to_string(), "ethanol".to_string())
            ]
        );
        assert_eq!(mol.property("NAME"), Some("ethanol"));
        assert_eq!(mol.property("MISSING"), None);
    }
}
