//! Substructure groups (Sgroups).
//!
//! An Sgroup annotates a subset of atoms and bonds: a repeat unit, an
//! abbreviation, a data field, a mixture component and so on. Sgroups form a
//! forest through their parent links; the molecule rejects links that would
//! close a cycle.

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SgroupId(pub usize);

impl SgroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SgroupType {
    /// Superatom / abbreviation (`SUP`).
    Superatom,
    /// Multiple group (`MUL`).
    MultipleGroup,
    /// Structure repeating unit (`SRU`).
    Sru,
    Monomer,
    Mer,
    /// Copolymer (`COP`); alternating, random or block via the subtype.
    Copolymer,
    Crosslink,
    Modification,
    Graft,
    Component,
    Mixture,
    Formulation,
    Data,
    AnyPolymer,
    Generic,
    /// Positional variation bond (`ENDPTS`/`ATTACH` in V3000). Never counted
    /// or written as an Sgroup.
    ExtMulticenter,
}

impl SgroupType {
    pub fn code(self) -> Option<&'static str> {
        match self {
            SgroupType::Superatom => Some("SUP"),
            SgroupType::MultipleGroup => Some("MUL"),
            SgroupType::Sru => Some("SRU"),
            SgroupType::Monomer => Some("MON"),
            SgroupType::Mer => Some("MER"),
            SgroupType::Copolymer => Some("COP"),
            SgroupType::Crosslink => Some("CRO"),
            SgroupType::Modification => Some("MOD"),
            SgroupType::Graft => Some("GRA"),
            SgroupType::Component => Some("COM"),
            SgroupType::Mixture => Some("MIX"),
            SgroupType::Formulation => Some("FOR"),
            SgroupType::Data => Some("DAT"),
            SgroupType::AnyPolymer => Some("ANY"),
            SgroupType::Generic => Some("GEN"),
            SgroupType::ExtMulticenter => None,
        }
    }

    pub fn from_code(code: &str) -> Option<SgroupType> {
        Some(match code {
            "SUP" => SgroupType::Superatom,
            "MUL" => SgroupType::MultipleGroup,
            "SRU" => SgroupType::Sru,
            "MON" => SgroupType::Monomer,
            "MER" => SgroupType::Mer,
            "COP" => SgroupType::Copolymer,
            "CRO" => SgroupType::Crosslink,
            "MOD" => SgroupType::Modification,
            "GRA" => SgroupType::Graft,
            "COM" => SgroupType::Component,
            "MIX" => SgroupType::Mixture,
            "FOR" => SgroupType::Formulation,
            "DAT" => SgroupType::Data,
            "ANY" => SgroupType::AnyPolymer,
            "GEN" => SgroupType::Generic,
            _ => return None,
        })
    }

    /// Data groups list the bonds they contain; every other type lists the
    /// bonds crossing its boundary.
    pub fn lists_containment_bonds(self) -> bool {
        self == SgroupType::Data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SgroupKey {
    /// Unique identifier from `M  SLB` or the V3000 external index.
    Identifier,
    Subscript,
    Connectivity,
    BracketStyle,
    ComponentNumber,
    Expansion,
    Subtype,
    Class,
    FieldName,
    FieldFormat,
    FieldUnits,
    DataDisplay,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketStyle {
    Square,
    Round,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SgroupValue {
    Text(String),
    Number(u32),
    Flag(bool),
    Style(BracketStyle),
}

impl From<&str> for SgroupValue {
    fn from(s: &str) -> Self {
        SgroupValue::Text(s.to_string())
    }
}

impl From<String> for SgroupValue {
    fn from(s: String) -> Self {
        SgroupValue::Text(s)
    }
}

impl From<u32> for SgroupValue {
    fn from(n: u32) -> Self {
        SgroupValue::Number(n)
    }
}

impl From<bool> for SgroupValue {
    fn from(b: bool) -> Self {
        SgroupValue::Flag(b)
    }
}

impl From<BracketStyle> for SgroupValue {
    fn from(s: BracketStyle) -> Self {
        SgroupValue::Style(s)
    }
}

/// Bracket drawn around the group, as two end points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgroupBracket {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Superatom attachment point.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachPoint {
    pub atom: NodeIndex,
    pub leaving: Option<NodeIndex>,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sgroup {
    pub kind: SgroupType,
    atoms: Vec<NodeIndex>,
    bonds: Vec<EdgeIndex>,
    parents: Vec<SgroupId>,
    parent_atoms: Vec<NodeIndex>,
    brackets: Vec<SgroupBracket>,
    attach_points: Vec<AttachPoint>,
    attrs: Vec<(SgroupKey, SgroupValue)>,
}

impl Sgroup {
    pub fn new(kind: SgroupType) -> Self {
        Self {
            kind,
            atoms: Vec::new(),
            bonds: Vec::new(),
            parents: Vec::new(),
            parent_atoms: Vec::new(),
            brackets: Vec::new(),
            attach_points: Vec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn atoms(&self) -> &[NodeIndex] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[EdgeIndex] {
        &self.bonds
    }

    pub fn parents(&self) -> &[SgroupId] {
        &self.parents
    }

    pub fn parent_atoms(&self) -> &[NodeIndex] {
        &self.parent_atoms
    }

    pub fn brackets(&self) -> &[SgroupBracket] {
        &self.brackets
    }

    pub fn attach_points(&self) -> &[AttachPoint] {
        &self.attach_points
    }

    pub fn add_atom(&mut self, atom: NodeIndex) {
        if !self.atoms.contains(&atom) {
            self.atoms.push(atom);
        }
    }

    pub fn add_bond(&mut self, bond: EdgeIndex) {
        if !self.bonds.contains(&bond) {
            self.bonds.push(bond);
        }
    }

    pub fn add_parent_atom(&mut self, atom: NodeIndex) {
        if !self.parent_atoms.contains(&atom) {
            self.parent_atoms.push(atom);
        }
    }

    pub fn add_bracket(&mut self, bracket: SgroupBracket) {
        self.brackets.push(bracket);
    }

    pub fn add_attach_point(&mut self, point: AttachPoint) {
        self.attach_points.push(point);
    }

    // Parent links go through `Molecule::add_sgroup_parent`, which checks
    // for cycles.
    pub(crate) fn push_parent(&mut self, parent: SgroupId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    /// Stores an attribute, replacing any previous value for the key.
    pub fn put(&mut self, key: SgroupKey, value: impl Into<SgroupValue>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn get(&self, key: SgroupKey) -> Option<&SgroupValue> {
        self.attrs.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn text(&self, key: SgroupKey) -> Option<&str> {
        match self.get(key) {
            Some(SgroupValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, key: SgroupKey) -> Option<u32> {
        match self.get(key) {
            Some(SgroupValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn flag(&self, key: SgroupKey) -> bool {
        matches!(self.get(key), Some(SgroupValue::Flag(true)))
    }

    pub fn bracket_style(&self) -> Option<BracketStyle> {
        match self.get(SgroupKey::BracketStyle) {
            Some(SgroupValue::Style(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn subscript(&self) -> Option<&str> {
        self.text(SgroupKey::Subscript)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &(SgroupKey, SgroupValue)> {
        self.attrs.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SgroupError {
    #[error("sgroup {0} does not exist")]
    Unknown(usize),
    #[error("linking sgroup {child} to parent {parent} would create a cycle")]
    Cycle { child: usize, parent: usize },
}

/// Whether `ancestor` is reachable from `start` through parent links.
/// Terminates on cyclic input.
pub(crate) fn is_ancestor(sgroups: &[Sgroup], start: SgroupId, ancestor: SgroupId) -> bool {
    let mut seen = vec![false; sgroups.len()];
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if id == ancestor {
            return true;
        }
        if id.0 >= sgroups.len() || seen[id.0] {
            continue;
        }
        seen[id.0] = true;
        stack.extend(sgroups[id.0].parents.iter().copied());
    }
    false
}

/// Parents-first ordering of the writable Sgroups (multicenter groups are
/// left out). Ties keep the original order.
pub(crate) fn emission_order(sgroups: &[Sgroup]) -> Result<Vec<SgroupId>, SgroupError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    fn visit(
        sgroups: &[Sgroup],
        id: SgroupId,
        marks: &mut [Mark],
        order: &mut Vec<SgroupId>,
    ) -> Result<(), SgroupError> {
        match marks[id.0] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                return Err(SgroupError::Cycle {
                    child: id.0,
                    parent: id.0,
                })
            }
            Mark::New => {}
        }
        marks[id.0] = Mark::Active;
        for &parent in &sgroups[id.0].parents {
            if parent.0 >= sgroups.len() {
                return Err(SgroupError::Unknown(parent.0));
            }
            visit(sgroups, parent, marks, order)?;
        }
        marks[id.0] = Mark::Done;
        if sgroups[id.0].kind != SgroupType::ExtMulticenter {
            order.push(id);
        }
        Ok(())
    }

    let mut marks = vec![Mark::New; sgroups.len()];
    let mut order = Vec::with_capacity(sgroups.len());
    for i in 0..sgroups.len() {
        visit(sgroups, SgroupId(i), &mut marks, &mut order)?;
    }
    Ok(order)
}

/// Maps the Sgroup numbers used inside a file to molecule Sgroups, creating
/// groups on first reference.
#[derive(Debug, Default)]
pub(crate) struct SgroupRegistry {
    by_number: HashMap<u32, SgroupId>,
}

/// Outcome of [`SgroupRegistry::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ensured {
    Existing(SgroupId),
    /// Created by a reference that came before the type declaration.
    Created(SgroupId),
}

impl Ensured {
    pub(crate) fn id(self) -> SgroupId {
        match self {
            Ensured::Existing(id) | Ensured::Created(id) => id,
        }
    }
}

impl SgroupRegistry {
    /// Declares `number` with a type, creating or retyping the group.
    pub(crate) fn declare(
        &mut self,
        sgroups: &mut Vec<Sgroup>,
        number: u32,
        kind: SgroupType,
    ) -> SgroupId {
        match self.by_number.get(&number) {
            Some(&id) => {
                sgroups[id.0].kind = kind;
                id
            }
            None => {
                let id = SgroupId(sgroups.len());
                sgroups.push(Sgroup::new(kind));
                self.by_number.insert(number, id);
                id
            }
        }
    }

    pub(crate) fn ensure(&mut self, sgroups: &mut Vec<Sgroup>, number: u32) -> Ensured {
        if let Some(&id) = self.by_number.get(&number) {
            return Ensured::Existing(id);
        }
        let id = SgroupId(sgroups.len());
        sgroups.push(Sgroup::new(SgroupType::Generic));
        self.by_number.insert(number, id);
        Ensured::Created(id)
    }

    pub(crate) fn get(&self, number: u32) -> Option<SgroupId> {
        self.by_number.get(&number).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for code in [
            "SUP", "MUL", "SRU", "MON", "MER", "COP", "CRO", "MOD", "GRA", "COM", "MIX", "FOR",
            "DAT", "ANY", "GEN",
        ] {
            let kind = SgroupType::from_code(code).unwrap();
            assert_eq!(kind.code(), Some(code));
        }
        assert!(SgroupType::from_code("XYZ").is_none());
        assert_eq!(SgroupType::ExtMulticenter.code(), None);
    }

    #[test]
    fn put_replaces_value() {
        let mut sg = Sgroup::new(SgroupType::Sru);
        sg.put(SgroupKey::Subscript, "n");
        sg.put(SgroupKey::Subscript, "m");
        sg.put(SgroupKey::ComponentNumber, 3u32);
        sg.put(SgroupKey::BracketStyle, BracketStyle::Round);
        assert_eq!(sg.subscript(), Some("m"));
        assert_eq!(sg.number(SgroupKey::ComponentNumber), Some(3));
        assert_eq!(sg.bracket_style(), Some(BracketStyle::Round));
        assert_eq!(sg.attributes().count(), 3);
        assert!(!sg.flag(SgroupKey::Expansion));
    }

    #[test]
    fn members_are_deduplicated() {
        let mut sg = Sgroup::new(SgroupType::Superatom);
        sg.add_atom(NodeIndex::new(0));
        sg.add_atom(NodeIndex::new(0));
        sg.add_bond(EdgeIndex::new(2));
        sg.add_bond(EdgeIndex::new(2));
        assert_eq!(sg.atoms().len(), 1);
        assert_eq!(sg.bonds().len(), 1);
    }

    #[test]
    fn ancestor_walk_stops_on_cycle() {
        let mut sgroups = vec![
            Sgroup::new(SgroupType::Generic),
            Sgroup::new(SgroupType::Generic),
            Sgroup::new(SgroupType::Generic),
        ];
        sgroups[0].push_parent(SgroupId(1));
        sgroups[1].push_parent(SgroupId(2));
        sgroups[2].push_parent(SgroupId(0));
        assert!(is_ancestor(&sgroups, SgroupId(0), SgroupId(2)));
        assert!(!is_ancestor(&sgroups, SgroupId(0), SgroupId(7)));
        assert!(matches!(
            emission_order(&sgroups),
            Err(SgroupError::Cycle { .. })
        ));
    }

    #[test]
    fn emission_order_puts_parents_first() {
        let mut sgroups = vec![
            Sgroup::new(SgroupType::Sru),
            Sgroup::new(SgroupType::ExtMulticenter),
            Sgroup::new(SgroupType::Copolymer),
        ];
        sgroups[0].push_parent(SgroupId(2));
        let order = emission_order(&sgroups).unwrap();
        assert_eq!(order, vec![SgroupId(2), SgroupId(0)]);
    }

    #[test]
    fn registry_creates_on_reference() {
        let mut sgroups = Vec::new();
        let mut registry = SgroupRegistry::default();
        let created = registry.ensure(&mut sgroups, 4);
        assert!(matches!(created, Ensured::Created(_)));
        assert_eq!(sgroups[created.id().0].kind, SgroupType::Generic);

        let declared = registry.declare(&mut sgroups, 4, SgroupType::Data);
        assert_eq!(declared, created.id());
        assert_eq!(sgroups[declared.0].kind, SgroupType::Data);
        assert_eq!(registry.ensure(&mut sgroups, 4), Ensured::Existing(declared));
        assert_eq!(registry.get(4), Some(declared));
        assert_eq!(sgroups.len(), 1);
    }
}
