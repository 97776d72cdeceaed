#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    /// Not representable in a molfile; rejected by the writers.
    Quadruple,
    Aromatic,
    SingleOrDouble,
    SingleOrAromatic,
    DoubleOrAromatic,
    Any,
}

impl BondOrder {
    /// V2000 bond type code, `None` when the order has no code.
    pub fn code(self) -> Option<u8> {
        match self {
            BondOrder::Single => Some(1),
            BondOrder::Double => Some(2),
            BondOrder::Triple => Some(3),
            BondOrder::Aromatic => Some(4),
            BondOrder::SingleOrDouble => Some(5),
            BondOrder::SingleOrAromatic => Some(6),
            BondOrder::DoubleOrAromatic => Some(7),
            BondOrder::Any => Some(8),
            BondOrder::Quadruple => None,
        }
    }

    pub fn from_code(code: u32) -> Option<BondOrder> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            5 => Some(BondOrder::SingleOrDouble),
            6 => Some(BondOrder::SingleOrAromatic),
            7 => Some(BondOrder::DoubleOrAromatic),
            8 => Some(BondOrder::Any),
            _ => None,
        }
    }

    /// Query orders only make sense in substructure queries.
    pub fn is_query(self) -> bool {
        matches!(
            self,
            BondOrder::Aromatic
                | BondOrder::SingleOrDouble
                | BondOrder::SingleOrAromatic
                | BondOrder::DoubleOrAromatic
                | BondOrder::Any
        )
    }

    /// Contribution to the explicit valence of each endpoint, `None` for
    /// query orders.
    pub fn valence(self) -> Option<u32> {
        match self {
            BondOrder::Single => Some(1),
            BondOrder::Double => Some(2),
            BondOrder::Triple => Some(3),
            BondOrder::Quadruple => Some(4),
            _ => None,
        }
    }
}

/// Bond stereo marking. `Inverted` variants point from the end atom to the
/// begin atom; writers swap the endpoints to express them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    UpInverted,
    Down,
    DownInverted,
    UpOrDown,
    UpOrDownInverted,
    /// Double bond with unknown configuration (crossed bond).
    EOrZ,
    /// Double bond whose configuration follows from the coordinates.
    EZByCoordinates,
}

impl BondStereo {
    pub fn is_inverted(self) -> bool {
        matches!(
            self,
            BondStereo::UpInverted | BondStereo::DownInverted | BondStereo::UpOrDownInverted
        )
    }

    /// The same marking seen from the other endpoint.
    pub fn inverted(self) -> BondStereo {
        match self {
            BondStereo::Up => BondStereo::UpInverted,
            BondStereo::UpInverted => BondStereo::Up,
            BondStereo::Down => BondStereo::DownInverted,
            BondStereo::DownInverted => BondStereo::Down,
            BondStereo::UpOrDown => BondStereo::UpOrDownInverted,
            BondStereo::UpOrDownInverted => BondStereo::UpOrDown,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
    pub is_aromatic: bool,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }
}
