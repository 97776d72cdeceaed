//! Tetrahedral stereo and its molfile parity encoding.
//!
//! A molfile stores tetrahedral configuration as a parity on the atom line:
//! number the four substituents by atom position with the (explicit or
//! implicit) hydrogen counted last, then `1`/`2` say whether the numbered
//! substituents wind clockwise or anticlockwise. A [`TetrahedralStereo`]
//! instead records the winding of its own neighbour list, viewed from the
//! first neighbour. Converting between the two is a matter of counting
//! transpositions between the stored order and the numbered order.

use petgraph::graph::NodeIndex;

use crate::atom::Parity;
use crate::mol::Molecule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Clockwise,
    AntiClockwise,
}

impl Winding {
    pub fn invert(self) -> Winding {
        match self {
            Winding::Clockwise => Winding::AntiClockwise,
            Winding::AntiClockwise => Winding::Clockwise,
        }
    }
}

/// Tetrahedral center with exactly four neighbours. When the center has only
/// three explicit neighbours the focus atom itself takes the fourth slot,
/// standing in for the implicit hydrogen or lone pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetrahedralStereo {
    pub focus: NodeIndex,
    pub neighbors: [NodeIndex; 4],
    pub winding: Winding,
}

impl TetrahedralStereo {
    /// The same configuration expressed over a reordering of the
    /// neighbours. `None` if `neighbors` is not a permutation of the
    /// current list.
    pub fn permuted(&self, neighbors: [NodeIndex; 4]) -> Option<TetrahedralStereo> {
        if !neighbors.iter().all(|n| self.neighbors.contains(n))
            || !self.neighbors.iter().all(|n| neighbors.contains(n))
        {
            return None;
        }
        let winding = if permutation_parity(&self.neighbors, &neighbors) {
            self.winding
        } else {
            self.winding.invert()
        };
        Some(TetrahedralStereo {
            focus: self.focus,
            neighbors,
            winding,
        })
    }

    /// Whether both describe the same spatial arrangement.
    pub fn same_configuration(&self, other: &TetrahedralStereo) -> bool {
        self.focus == other.focus
            && self
                .permuted(other.neighbors)
                .is_some_and(|p| p.winding == other.winding)
    }
}

/// `true` when `to` is an even permutation of `from`.
pub(crate) fn permutation_parity<T: Eq>(from: &[T], to: &[T]) -> bool {
    let n = from.len();
    if n != to.len() {
        return true;
    }
    let perm: Vec<usize> = from
        .iter()
        .map(|f| to.iter().position(|t| t == f).unwrap_or(0))
        .collect();
    let mut visited = vec![false; n];
    let mut swaps = 0usize;
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut cycle_len = 0;
        let mut j = i;
        while !visited[j] {
            visited[j] = true;
            j = perm[j];
            cycle_len += 1;
        }
        swaps += cycle_len - 1;
    }
    swaps % 2 == 0
}

fn inversions(keys: &[usize; 4]) -> usize {
    let mut count = 0;
    for i in 0..4 {
        for j in i + 1..4 {
            if keys[i] > keys[j] {
                count += 1;
            }
        }
    }
    count
}

/// Builds a tetrahedral element from an atom-block parity.
///
/// Neighbours are taken in bond-block order. A hydrogen neighbour, or the
/// focus itself when only three neighbours exist, is numbered last. Returns
/// `None` for parities other than 1/2, more than four neighbours, fewer than
/// three, or more than one hydrogen-like slot.
pub fn decode_parity(mol: &Molecule, focus: NodeIndex, parity: Parity) -> Option<TetrahedralStereo> {
    let base = match parity {
        Parity::Odd => Winding::Clockwise,
        Parity::Even => Winding::AntiClockwise,
        _ => return None,
    };

    let neighbors = mol.neighbors_in_bond_order(focus);
    if neighbors.len() > 4 || neighbors.len() < 3 {
        return None;
    }

    let mut hidx = None;
    for (i, &nbr) in neighbors.iter().enumerate() {
        if mol.atom(nbr).is_hydrogen() {
            if hidx.is_some() {
                return None;
            }
            hidx = Some(i);
        }
    }

    let mut carriers = [focus; 4];
    carriers[..neighbors.len()].copy_from_slice(&neighbors);
    if neighbors.len() == 3 {
        if hidx.is_some() {
            return None;
        }
        hidx = Some(3);
    }

    let last = mol.atom_count();
    let mut keys = [0usize; 4];
    for (i, carrier) in carriers.iter().enumerate() {
        keys[i] = if hidx == Some(i) { last } else { carrier.index() };
    }

    let winding = if inversions(&keys) % 2 == 1 {
        base.invert()
    } else {
        base
    };

    Some(TetrahedralStereo {
        focus,
        neighbors: carriers,
        winding,
    })
}

/// Parity to write for a tetrahedral element, given each atom's output
/// position. Yields [`Parity::None`] when two neighbours are hydrogen-like,
/// since the numbering is then ambiguous.
pub fn encode_parity(mol: &Molecule, stereo: &TetrahedralStereo, output_index: &[usize]) -> Parity {
    let mut hidx = None;
    for (i, &nbr) in stereo.neighbors.iter().enumerate() {
        if nbr == stereo.focus || mol.atom(nbr).is_hydrogen() {
            if hidx.is_some() {
                return Parity::None;
            }
            hidx = Some(i);
        }
    }

    let last = mol.atom_count();
    let mut keys = [0usize; 4];
    for (i, nbr) in stereo.neighbors.iter().enumerate() {
        keys[i] = if hidx == Some(i) {
            last
        } else {
            output_index.get(nbr.index()).copied().unwrap_or(last)
        };
    }

    let mut parity = match stereo.winding {
        Winding::Clockwise => Parity::Odd,
        Winding::AntiClockwise => Parity::Even,
    };
    for _ in 0..inversions(&keys) {
        parity = match parity {
            Parity::Odd => Parity::Even,
            _ => Parity::Odd,
        };
    }
    parity
}

/// Output positions with every hydrogen moved after the heavy atoms.
///
/// Only used to number parity substituents; atoms are still written in
/// molecule order.
pub fn hydrogens_last_order(mol: &Molecule) -> Vec<usize> {
    let mut order = vec![0usize; mol.atom_count()];
    let mut next = 0;
    for pass_hydrogens in [false, true] {
        for idx in mol.atoms() {
            if mol.atom(idx).is_hydrogen() == pass_hydrogens {
                order[idx.index()] = next;
                next += 1;
            }
        }
    }
    order
}

/// Adds tetrahedral elements for every atom carrying a 1/2 parity. Returns
/// the number of elements created.
pub fn assign_from_parities(mol: &mut Molecule) -> usize {
    let centers: Vec<_> = mol
        .atoms()
        .filter(|&idx| matches!(mol.atom(idx).parity, Parity::Odd | Parity::Even))
        .collect();
    let mut added = 0;
    for focus in centers {
        match decode_parity(mol, focus, mol.atom(focus).parity) {
            Some(stereo) => {
                mol.add_tetrahedral_stereo(stereo);
                added += 1;
            }
            None => log::debug!(
                "parity on atom {} cannot be expressed as a tetrahedral center",
                focus.index() + 1
            ),
        }
    }
    added
}

/// Parity for each atom, in molecule order, derived from the tetrahedral
/// elements. Atoms without an element keep the parity they were read with.
pub fn atom_parities(mol: &Molecule) -> Vec<Parity> {
    let order = hydrogens_last_order(mol);
    let mut parities: Vec<Parity> = mol.atoms().map(|idx| mol.atom(idx).parity).collect();
    for stereo in mol.tetrahedral_stereo() {
        parities[stereo.focus.index()] = encode_parity(mol, stereo, &order);
    }
    parities
}
