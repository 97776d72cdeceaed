//! MDL implicit valence model.
//!
//! The model maps an element, its formal charge and the sum of its explicit
//! bond orders to the total valence the atom is assumed to have. The
//! difference between the two is the number of implicit hydrogens.
//!
//! Rules are kept as one flat, ordered table. For a given element and charge
//! the rules are listed in increasing valence, so the first rule whose
//! `max_explicit` is not exceeded gives the smallest standard valence that
//! accommodates the explicit bonds. Anything not covered by the table keeps
//! its explicit valence (no implicit hydrogens).

/// One row of the valence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValenceRule {
    pub atomic_num: u8,
    pub charge: i8,
    pub max_explicit: u32,
    pub valence: u32,
}

const fn r(atomic_num: u8, charge: i8, valence: u32) -> ValenceRule {
    ValenceRule {
        atomic_num,
        charge,
        max_explicit: valence,
        valence,
    }
}

pub static VALENCE_RULES: &[ValenceRule] = &[
    // alkali metals (and H)
    r(1, 0, 1),
    r(3, 0, 1),
    r(11, 0, 1),
    r(19, 0, 1),
    r(37, 0, 1),
    r(55, 0, 1),
    r(87, 0, 1),
    // alkaline earth metals
    r(4, 0, 2),
    r(4, 1, 1),
    r(12, 0, 2),
    r(12, 1, 1),
    r(20, 0, 2),
    r(20, 1, 1),
    r(38, 0, 2),
    r(38, 1, 1),
    r(56, 0, 2),
    r(56, 1, 1),
    r(88, 0, 2),
    r(88, 1, 1),
    // B
    r(5, -4, 1),
    r(5, -3, 2),
    r(5, -2, 3),
    r(5, -2, 5),
    r(5, -1, 4),
    r(5, 0, 3),
    r(5, 1, 2),
    r(5, 2, 1),
    // C
    r(6, -3, 1),
    r(6, -2, 2),
    r(6, -1, 3),
    r(6, -1, 5),
    r(6, 0, 4),
    r(6, 1, 3),
    r(6, 2, 2),
    r(6, 3, 1),
    // N
    r(7, -2, 1),
    r(7, -1, 2),
    r(7, 0, 3),
    r(7, 0, 5),
    r(7, 1, 4),
    r(7, 2, 3),
    r(7, 3, 2),
    r(7, 4, 1),
    // O
    r(8, -1, 1),
    r(8, 0, 2),
    r(8, 1, 3),
    r(8, 1, 5),
    r(8, 2, 4),
    r(8, 3, 3),
    r(8, 4, 2),
    r(8, 5, 1),
    // F
    r(9, 0, 1),
    r(9, 1, 2),
    r(9, 2, 3),
    r(9, 2, 5),
    r(9, 3, 4),
    r(9, 4, 3),
    r(9, 5, 2),
    r(9, 6, 1),
    // Si
    r(14, -2, 2),
    r(14, -1, 3),
    r(14, -1, 5),
    r(14, 0, 4),
    r(14, 1, 3),
    r(14, 2, 2),
    r(14, 3, 1),
    // P
    r(15, -2, 1),
    r(15, -2, 3),
    r(15, -2, 5),
    r(15, -2, 7),
    r(15, -1, 2),
    r(15, -1, 4),
    r(15, -1, 6),
    r(15, 0, 3),
    r(15, 0, 5),
    r(15, 1, 4),
    r(15, 2, 3),
    r(15, 3, 2),
    r(15, 4, 1),
    // S
    r(16, -1, 1),
    r(16, -1, 3),
    r(16, -1, 5),
    r(16, -1, 7),
    r(16, 0, 2),
    r(16, 0, 4),
    r(16, 0, 6),
    r(16, 1, 3),
    r(16, 1, 5),
    r(16, 2, 4),
    r(16, 3, 3),
    r(16, 4, 2),
    r(16, 5, 1),
    // Cl
    r(17, 0, 1),
    r(17, 0, 3),
    r(17, 0, 5),
    r(17, 0, 7),
    r(17, 1, 2),
    r(17, 1, 4),
    r(17, 1, 6),
    r(17, 2, 3),
    r(17, 2, 5),
    r(17, 3, 4),
    r(17, 4, 3),
    r(17, 5, 2),
    r(17, 6, 1),
    // Ga, In
    r(31, -4, 1),
    r(31, -4, 3),
    r(31, -4, 5),
    r(31, -4, 7),
    r(31, -3, 2),
    r(31, -3, 4),
    r(31, -3, 6),
    r(31, -2, 3),
    r(31, -2, 5),
    r(31, -1, 4),
    r(31, 0, 3),
    r(31, 2, 1),
    r(49, -4, 1),
    r(49, -4, 3),
    r(49, -4, 5),
    r(49, -4, 7),
    r(49, -3, 2),
    r(49, -3, 4),
    r(49, -3, 6),
    r(49, -2, 3),
    r(49, -2, 5),
    r(49, -1, 4),
    r(49, 0, 3),
    r(49, 2, 1),
    // Ge, Sn
    r(32, -3, 1),
    r(32, -3, 3),
    r(32, -3, 5),
    r(32, -3, 7),
    r(32, -2, 2),
    r(32, -2, 4),
    r(32, -2, 6),
    r(32, -1, 3),
    r(32, -1, 5),
    r(32, 0, 4),
    r(32, 1, 3),
    r(32, 3, 1),
    r(50, -3, 1),
    r(50, -3, 3),
    r(50, -3, 5),
    r(50, -3, 7),
    r(50, -2, 2),
    r(50, -2, 4),
    r(50, -2, 6),
    r(50, -1, 3),
    r(50, -1, 5),
    r(50, 0, 2),
    r(50, 0, 4),
    r(50, 1, 3),
    r(50, 3, 1),
    // As, Sb
    r(33, -2, 1),
    r(33, -2, 3),
    r(33, -2, 5),
    r(33, -2, 7),
    r(33, -1, 2),
    r(33, -1, 4),
    r(33, -1, 6),
    r(33, 0, 3),
    r(33, 0, 5),
    r(33, 1, 4),
    r(33, 2, 3),
    r(33, 4, 1),
    r(51, -2, 1),
    r(51, -2, 3),
    r(51, -2, 5),
    r(51, -2, 7),
    r(51, -1, 2),
    r(51, -1, 4),
    r(51, -1, 6),
    r(51, 0, 3),
    r(51, 0, 5),
    r(51, 1, 4),
    r(51, 2, 3),
    r(51, 4, 1),
    // Se, Te
    r(34, -1, 1),
    r(34, -1, 3),
    r(34, -1, 5),
    r(34, -1, 7),
    r(34, 0, 2),
    r(34, 0, 4),
    r(34, 0, 6),
    r(34, 1, 3),
    r(34, 1, 5),
    r(34, 2, 4),
    r(34, 3, 3),
    r(34, 5, 1),
    r(52, -1, 1),
    r(52, -1, 3),
    r(52, -1, 5),
    r(52, -1, 7),
    r(52, 0, 2),
    r(52, 0, 4),
    r(52, 0, 6),
    r(52, 1, 3),
    r(52, 1, 5),
    r(52, 2, 4),
    r(52, 3, 3),
    r(52, 5, 1),
    // Br, I
    r(35, 0, 1),
    r(35, 0, 3),
    r(35, 0, 5),
    r(35, 0, 7),
    r(35, 1, 2),
    r(35, 1, 4),
    r(35, 1, 6),
    r(35, 2, 3),
    r(35, 2, 5),
    r(35, 3, 4),
    r(35, 4, 3),
    r(35, 6, 1),
    r(53, 0, 1),
    r(53, 0, 3),
    r(53, 0, 5),
    r(53, 0, 7),
    r(53, 1, 2),
    r(53, 1, 4),
    r(53, 1, 6),
    r(53, 2, 3),
    r(53, 2, 5),
    r(53, 3, 4),
    r(53, 4, 3),
    r(53, 6, 1),
    // Tl, Pb, Bi, Po, At
    r(81, -4, 1),
    r(81, -4, 3),
    r(81, -4, 5),
    r(81, -4, 7),
    r(81, -3, 2),
    r(81, -3, 4),
    r(81, -3, 6),
    r(81, -2, 3),
    r(81, -2, 5),
    r(81, -1, 4),
    r(81, 0, 1),
    r(81, 0, 3),
    r(82, -3, 1),
    r(82, -3, 3),
    r(82, -3, 5),
    r(82, -3, 7),
    r(82, -2, 2),
    r(82, -2, 4),
    r(82, -2, 6),
    r(82, -1, 3),
    r(82, -1, 5),
    r(82, 0, 2),
    r(82, 0, 4),
    r(83, -2, 1),
    r(83, -2, 3),
    r(83, -2, 5),
    r(83, -2, 7),
    r(83, -1, 2),
    r(83, -1, 4),
    r(83, -1, 6),
    r(83, 0, 3),
    r(83, 0, 5),
    r(83, 1, 2),
    r(83, 1, 4),
    r(83, 2, 3),
    r(84, -1, 1),
    r(84, -1, 3),
    r(84, -1, 5),
    r(84, -1, 7),
    r(84, 0, 2),
    r(84, 0, 4),
    r(84, 0, 6),
    r(84, 1, 3),
    r(84, 1, 5),
    r(84, 2, 4),
    r(85, 0, 1),
    r(85, 0, 3),
    r(85, 0, 5),
    r(85, 0, 7),
    r(85, 1, 2),
    r(85, 1, 4),
    r(85, 1, 6),
    r(85, 2, 3),
    r(85, 2, 5),
];

/// Total valence the MDL model assigns to an atom with the given explicit
/// valence (bond order sum plus unpaired electrons).
///
/// Returns `explicit` unchanged when the element/charge pair is not
/// tabulated or every tabulated valence is exceeded.
pub fn implicit_valence(atomic_num: u8, charge: i8, explicit: u32) -> u32 {
    VALENCE_RULES
        .iter()
        .find(|rule| {
            rule.atomic_num == atomic_num && rule.charge == charge && explicit <= rule.max_explicit
        })
        .map(|rule| rule.valence)
        .unwrap_or(explicit)
}

/// Whether any rule exists for this element and charge.
pub fn is_tabulated(atomic_num: u8, charge: i8) -> bool {
    VALENCE_RULES
        .iter()
        .any(|rule| rule.atomic_num == atomic_num && rule.charge == charge)
}
