
/// Periodic table data for elements 1–118.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Sc = 21,
    Ti = 22,
    V = 23,
    Cr = 24,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Kr = 36,
    Rb = 37,
    Sr = 38,
    Y = 39,
    Zr = 40,
    Nb = 41,
    Mo = 42,
    Tc = 43,
    Ru = 44,
    Rh = 45,
    Pd = 46,
    Ag = 47,
    Cd = 48,
    In = 49,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
    Xe = 54,
    Cs = 55,
    Ba = 56,
    La = 57,
    Ce = 58,
    Pr = 59,
    Nd = 60,
    Pm = 61,
    Sm = 62,
    Eu = 63,
    Gd = 64,
    Tb = 65,
    Dy = 66,
    Ho = 67,
    Er = 68,
    Tm = 69,
    Yb = 70,
    Lu = 71,
    Hf = 72,
    Ta = 73,
    W = 74,
    Re = 75,
    Os = 76,
    Ir = 77,
    Pt = 78,
    Au = 79,
    Hg = 80,
    Tl = 81,
    Pb = 82,
    Bi = 83,
    Po = 84,
    At = 85,
    Rn = 86,
    Fr = 87,
    Ra = 88,
    Ac = 89,
    Th = 90,
    Pa = 91,
    U = 92,
    Np = 93,
    Pu = 94,
    Am = 95,
    Cm = 96,
    Bk = 97,
    Cf = 98,
    Es = 99,
    Fm = 100,
    Md = 101,
    No = 102,
    Lr = 103,
    Rf = 104,
    Db = 105,
    Sg = 106,
    Bh = 107,
    Hs = 108,
    Mt = 109,
    Ds = 110,
    Rg = 111,
    Cn = 112,
    Nh = 113,
    Fl = 114,
    Mc = 115,
    Lv = 116,
    Ts = 117,
    Og = 118,
}

impl Element {
    pub fn from_atomic_num(n: u8) -> Option<Element> {
        if (1..=118).contains(&n) {
            // SAFETY: Element is repr(u8) with variants 1..=118, and we checked bounds.
            Some(unsafe { std::mem::transmute::<u8, Element>(n) })
        } else {
            None
        }
    }

    pub fn from_symbol(s: &str) -> Option<Element> {
        SYMBOL_TABLE.iter().find(|(sym, _)| *sym == s).map(|(_, e)| *e)
    }

    pub fn atomic_num(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self as usize - 1]
    }

    /// Mass number of the most abundant (or, for synthetic elements, the
    /// longest-lived) isotope. Mass differences in the V2000 atom block are
    /// relative to this value.
    pub fn major_isotope(self) -> u16 {
        MAJOR_ISOTOPES[self as usize - 1]
    }
}

/// Non-periodic atom labels accepted in the atom block without a diagnostic.
pub const PSEUDO_LABELS: [&str; 6] = ["A", "Q", "*", "L", "LP", "R#"];

pub fn is_pseudo_label(s: &str) -> bool {
    PSEUDO_LABELS.contains(&s)
}

// symbol, Element pairs for from_symbol lookup
const SYMBOL_TABLE: [(&str, Element); 118] = [
    ("H", Element::H), ("He", Element::He), ("Li", Element::Li), ("Be", Element::Be),
    ("B", Element::B), ("C", Element::C), ("N", Element::N), ("O", Element::O),
    ("F", Element::F), ("Ne", Element::Ne), ("Na", Element::Na), ("Mg", Element::Mg),
    ("Al", Element::Al), ("Si", Element::Si), ("P", Element::P), ("S", Element::S),
    ("Cl", Element::Cl), ("Ar", Element::Ar), ("K", Element::K), ("Ca", Element::Ca),
    ("Sc", Element::Sc), ("Ti", Element::Ti), ("V", Element::V), ("Cr", Element::Cr),
    ("Mn", Element::Mn), ("Fe", Element::Fe), ("Co", Element::Co), ("Ni", Element::Ni),
    ("Cu", Element::Cu), ("Zn", Element::Zn), ("Ga", Element::Ga), ("Ge", Element::Ge),
    ("As", Element::As), ("Se", Element::Se), ("Br", Element::Br), ("Kr", Element::Kr),
    ("Rb", Element::Rb), ("Sr", Element::Sr), ("Y", Element::Y), ("Zr", Element::Zr),
    ("Nb", Element::Nb), ("Mo", Element::Mo), ("Tc", Element::Tc), ("Ru", Element::Ru),
    ("Rh", Element::Rh), ("Pd", Element::Pd), ("Ag", Element::Ag), ("Cd", Element::Cd),
    ("In", Element::In), ("Sn", Element::Sn), ("Sb", Element::Sb), ("Te", Element::Te),
    ("I", Element::I), ("Xe", Element::Xe), ("Cs", Element::Cs), ("Ba", Element::Ba),
    ("La", Element::La), ("Ce", Element::Ce), ("Pr", Element::Pr), ("Nd", Element::Nd),
    ("Pm", Element::Pm), ("Sm", Element::Sm), ("Eu", Element::Eu), ("Gd", Element::Gd),
    ("Tb", Element::Tb), ("Dy", Element::Dy), ("Ho", Element::Ho), ("Er", Element::Er),
    ("Tm", Element::Tm), ("Yb", Element::Yb), ("Lu", Element::Lu), ("Hf", Element::Hf),
    ("Ta", Element::Ta), ("W", Element::W), ("Re", Element::Re), ("Os", Element::Os),
    ("Ir", Element::Ir), ("Pt", Element::Pt), ("Au", Element::Au), ("Hg", Element::Hg),
    ("Tl", Element::Tl), ("Pb", Element::Pb), ("Bi", Element::Bi), ("Po", Element::Po),
    ("At", Element::At), ("Rn", Element::Rn), ("Fr", Element::Fr), ("Ra", Element::Ra),
    ("Ac", Element::Ac), ("Th", Element::Th), ("Pa", Element::Pa), ("U", Element::U),
    ("Np", Element::Np), ("Pu", Element::Pu), ("Am", Element::Am), ("Cm", Element::Cm),
    ("Bk", Element::Bk), ("Cf", Element::Cf), ("Es", Element::Es), ("Fm", Element::Fm),
    ("Md", Element::Md), ("No", Element::No), ("Lr", Element::Lr), ("Rf", Element::Rf),
    ("Db", Element::Db), ("Sg", Element::Sg), ("Bh", Element::Bh), ("Hs", Element::Hs),
    ("Mt", Element::Mt), ("Ds", Element::Ds), ("Rg", Element::Rg), ("Cn", Element::Cn),
    ("Nh", Element::Nh), ("Fl", Element::Fl), ("Mc", Element::Mc), ("Lv", Element::Lv),
    ("Ts", Element::Ts), ("Og", Element::Og),
];

static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];


static MAJOR_ISOTOPES: [u16; 118] = [
    1, 4, 7, 9, 11, 12, 14, 16, 19, 20,                 // H  .. Ne
    23, 24, 27, 28, 31, 32, 35, 40, 39, 40,             // Na .. Ca
    45, 48, 51, 52, 55, 56, 59, 58, 63, 64,             // Sc .. Zn
    69, 74, 75, 80, 79, 84, 85, 88, 89, 90,             // Ga .. Zr
    93, 98, 98, 102, 103, 106, 107, 114, 115, 120,      // Nb .. Sn
    121, 130, 127, 132, 133, 138, 139, 140, 141, 142,   // Sb .. Nd
    145, 152, 153, 158, 159, 164, 165, 166, 169, 174,   // Pm .. Yb
    175, 180, 181, 184, 187, 192, 193, 195, 197, 202,   // Lu .. Hg
    205, 208, 209, 209, 210, 222, 223, 226, 227, 232,   // Tl .. Th
    231, 238, 237, 244, 243, 247, 247, 251, 252, 257,   // Pa .. Fm
    258, 259, 262, 267, 268, 271, 272, 270, 276, 281,   // Md .. Ds
    280, 285, 284, 289, 288, 293, 292, 294,             // Rg .. Og
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_atomic_num_round_trip() {
        for n in 1u8..=118 {
            let e = Element::from_atomic_num(n).unwrap();
            assert_eq!(e.atomic_num(), n);
        }
    }

    #[test]
    fn from_atomic_num_boundaries() {
        assert!(Element::from_atomic_num(0).is_none());
        assert!(Element::from_atomic_num(119).is_none());
        assert_eq!(Element::from_atomic_num(1), Some(Element::H));
        assert_eq!(Element::from_atomic_num(118), Some(Element::Og));
    }

    #[test]
    fn from_symbol_case_sensitive() {
        assert_eq!(Element::from_symbol("Cl"), Some(Element::Cl));
        assert!(Element::from_symbol("CL").is_none());
        assert!(Element::from_symbol("cl").is_none());
        assert!(Element::from_symbol("").is_none());
        assert!(Element::from_symbol("Xx").is_none());
    }

    #[test]
    fn symbol_round_trip() {
        for n in 1u8..=118 {
            let e = Element::from_atomic_num(n).unwrap();
            assert_eq!(Element::from_symbol(e.symbol()), Some(e));
        }
    }

    #[test]
    fn major_isotopes_spot_check() {
        assert_eq!(Element::H.major_isotope(), 1);
        assert_eq!(Element::C.major_isotope(), 12);
        assert_eq!(Element::Cl.major_isotope(), 35);
        assert_eq!(Element::Cu.major_isotope(), 63);
        assert_eq!(Element::Br.major_isotope(), 79);
        assert_eq!(Element::U.major_isotope(), 238);
    }

    #[test]
    fn major_isotope_not_below_atomic_number() {
        for n in 1u8..=118 {
            let e = Element::from_atomic_num(n).unwrap();
            assert!(e.major_isotope() >= n as u16, "{:?}", e);
        }
    }

    #[test]
    fn pseudo_labels() {
        for label in ["A", "Q", "*", "L", "LP", "R#"] {
            assert!(is_pseudo_label(label));
        }
        assert!(!is_pseudo_label("R"));
        assert!(!is_pseudo_label("C"));
    }
}
