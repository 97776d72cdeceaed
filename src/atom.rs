use crate::element::Element;

/// Query atom types used for substructure search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryAtom {
    /// `A`: any atom except hydrogen.
    Any,
    /// `Q`: any atom except carbon and hydrogen.
    Hetero,
    /// `L`: one of (or, when negated, none of) a list of elements.
    List { elements: Vec<Element>, negated: bool },
}

/// What an atom is: a real element, a non-periodic placeholder, or a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Element(Element),
    /// A non-periodic label such as `*`, `LP`, `R#` or an alias text.
    Pseudo(String),
    Query(QueryAtom),
}

/// Tetrahedral parity as written in a connection table.
///
/// `1` and `2` are the two configurations, `3` marks an undefined center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Either,
}

impl Parity {
    pub fn from_code(code: u32) -> Option<Parity> {
        match code {
            0 => Some(Parity::None),
            1 => Some(Parity::Odd),
            2 => Some(Parity::Even),
            3 => Some(Parity::Either),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
            Parity::Either => 3,
        }
    }
}

/// An atom of a connection table.
///
/// Coordinates are either all 2D or all 3D for a given molecule; the reader
/// decides once per record by checking whether every z coordinate is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub kind: AtomKind,
    pub point_2d: Option<[f64; 2]>,
    pub point_3d: Option<[f64; 3]>,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Absolute mass number. `None` means natural abundance.
    pub isotope: Option<u16>,
    /// Explicit valence override. Only meaningful for element atoms.
    pub valence: Option<u8>,
    /// Hydrogens implied by the valence model. `None` when unknown, e.g.
    /// for atoms bearing query bonds.
    pub implicit_hydrogens: Option<u8>,
    pub parity: Parity,
    /// Reaction atom-atom mapping number, `0` when unmapped.
    pub atom_map: u32,
    pub unpaired_electrons: u8,
    /// R-group number for `R#` atoms.
    pub rgroup: Option<u32>,
    /// Free text attached with `V  aaa`.
    pub value: Option<String>,
    pub is_aromatic: bool,
}

impl Default for Atom {
    fn default() -> Self {
        Self {
            kind: AtomKind::Pseudo("*".to_string()),
            point_2d: None,
            point_3d: None,
            formal_charge: 0,
            isotope: None,
            valence: None,
            implicit_hydrogens: None,
            parity: Parity::None,
            atom_map: 0,
            unpaired_electrons: 0,
            rgroup: None,
            value: None,
            is_aromatic: false,
        }
    }
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            kind: AtomKind::Element(element),
            ..Self::default()
        }
    }

    pub fn pseudo(label: impl Into<String>) -> Self {
        Self {
            kind: AtomKind::Pseudo(label.into()),
            ..Self::default()
        }
    }

    pub fn query(query: QueryAtom) -> Self {
        Self {
            kind: AtomKind::Query(query),
            ..Self::default()
        }
    }

    pub fn element(&self) -> Option<Element> {
        match self.kind {
            AtomKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Atomic number, `0` for pseudo and query atoms.
    pub fn atomic_num(&self) -> u8 {
        self.element().map(Element::atomic_num).unwrap_or(0)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element() == Some(Element::H)
    }

    /// Symbol as written in an atom block (`L` for atom lists).
    pub fn symbol(&self) -> &str {
        match &self.kind {
            AtomKind::Element(e) => e.symbol(),
            AtomKind::Pseudo(label) => label,
            AtomKind::Query(QueryAtom::Any) => "A",
            AtomKind::Query(QueryAtom::Hetero) => "Q",
            AtomKind::Query(QueryAtom::List { .. }) => "L",
        }
    }

    /// Sets the valence override; ignored for pseudo and query atoms.
    pub fn set_valence(&mut self, valence: u8) -> bool {
        if self.element().is_none() {
            return false;
        }
        self.valence = Some(valence);
        true
    }

    pub fn has_coordinates(&self) -> bool {
        self.point_2d.is_some() || self.point_3d.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_atom() {
        let c = Atom::new(Element::C);
        assert_eq!(c.atomic_num(), 6);
        assert_eq!(c.symbol(), "C");
        assert!(!c.is_hydrogen());
    }

    #[test]
    fn pseudo_atom_has_no_atomic_number() {
        let r = Atom::pseudo("R#");
        assert_eq!(r.atomic_num(), 0);
        assert_eq!(r.symbol(), "R#");
        assert!(r.element().is_none());
    }

    #[test]
    fn query_symbols() {
        assert_eq!(Atom::query(QueryAtom::Any).symbol(), "A");
        assert_eq!(Atom::query(QueryAtom::Hetero).symbol(), "Q");
        let list = QueryAtom::List {
            elements: vec![Element::N, Element::O],
            negated: false,
        };
        assert_eq!(Atom::query(list).symbol(), "L");
    }

    #[test]
    fn valence_override_only_on_elements() {
        let mut n = Atom::new(Element::N);
        assert!(n.set_valence(4));
        assert_eq!(n.valence, Some(4));

        let mut star = Atom::pseudo("*");
        assert!(!star.set_valence(2));
        assert_eq!(star.valence, None);
    }

    #[test]
    fn parity_codes() {
        for code in 0..4 {
            assert_eq!(Parity::from_code(code).unwrap().code() as u32, code);
        }
        assert!(Parity::from_code(4).is_none());
    }
}
