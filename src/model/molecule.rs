use std::collections::BTreeMap;

use super::atom::Atom;
use super::types::{BondOrder, Element};
use crate::error::Error;

/// A bond between atoms `i` and `j`.
///
/// The endpoint order is preserved as given: `i` is the begin atom, `j` the end
/// atom. Graph construction relies on this order when laying out directed edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(i: usize, j: usize, order: BondOrder) -> Self {
        Self { i, j, order }
    }

    /// Returns the endpoint opposite to `atom`, if `atom` is part of this bond.
    #[inline]
    pub fn partner(&self, atom: usize) -> Option<usize> {
        if self.i == atom {
            Some(self.j)
        } else if self.j == atom {
            Some(self.i)
        } else {
            None
        }
    }
}

/// A molecule: ordered atoms, ordered bonds, and free-form record properties
/// (e.g. SDF data items).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    pub properties: BTreeMap<String, String>,
}

/// Per-atom properties derived from the atom and its bonding environment.
///
/// This is the entity atom feature encoders consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomView {
    pub element: Element,
    /// Number of bonded atoms stored in the molecule (explicit hydrogens included).
    pub degree: usize,
    pub formal_charge: i8,
    /// Implicit hydrogens plus bonded explicit hydrogen atoms.
    pub total_hydrogens: usize,
    pub aromatic: bool,
    pub in_ring: bool,
    pub mass: f64,
}

/// Per-bond properties consumed by bond feature encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondView {
    pub order: BondOrder,
    pub aromatic: bool,
    pub in_ring: bool,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.element != Element::H).count()
    }

    /// Checks that every bond references atoms inside the molecule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBond`] for the first bond with an out-of-range endpoint.
    pub fn check_bonds(&self) -> Result<(), Error> {
        let n = self.atoms.len();
        match self.bonds.iter().find(|b| b.i >= n || b.j >= n) {
            Some(bond) => Err(Error::invalid_bond(
                bond.i,
                bond.j,
                format!("atom index out of bounds (n_atoms = {n})"),
            )),
            None => Ok(()),
        }
    }

    /// Flags, for each bond, whether it belongs to a ring.
    ///
    /// A bond is in a ring exactly when it is not a bridge of the molecular graph.
    /// Bonds with out-of-range endpoints are reported as acyclic.
    pub fn ring_bonds(&self) -> Vec<bool> {
        let n = self.atoms.len();
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
        for (b, bond) in self.bonds.iter().enumerate() {
            if bond.i < n && bond.j < n {
                adjacency[bond.i].push((bond.j, b));
                adjacency[bond.j].push((bond.i, b));
            }
        }

        let mut in_ring = vec![false; self.bonds.len()];
        for (b, bond) in self.bonds.iter().enumerate() {
            in_ring[b] = bond.i < n && bond.j < n;
        }

        let unvisited = usize::MAX;
        let mut disc = vec![unvisited; n];
        let mut low = vec![0usize; n];
        let mut timer = 0usize;

        for root in 0..n {
            if disc[root] != unvisited {
                continue;
            }
            disc[root] = timer;
            low[root] = timer;
            timer += 1;

            // (atom, bond used to reach it, next adjacency slot)
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
            while let Some(top) = stack.last_mut() {
                let (u, via) = (top.0, top.1);
                if top.2 < adjacency[u].len() {
                    let (v, b) = adjacency[u][top.2];
                    top.2 += 1;
                    if via == Some(b) {
                        continue;
                    }
                    if disc[v] == unvisited {
                        disc[v] = timer;
                        low[v] = timer;
                        timer += 1;
                        stack.push((v, Some(b), 0));
                    } else {
                        low[u] = low[u].min(disc[v]);
                    }
                } else {
                    stack.pop();
                    if let (Some(b), Some(&(parent, _, _))) = (via, stack.last()) {
                        low[parent] = low[parent].min(low[u]);
                        if low[u] > disc[parent] {
                            in_ring[b] = false;
                        }
                    }
                }
            }
        }

        in_ring
    }

    /// Computes the [`AtomView`] of every atom, in atom order.
    pub fn atom_views(&self) -> Vec<AtomView> {
        self.atom_views_with(&self.ring_bonds())
    }

    /// Computes the [`BondView`] of every bond, in bond order.
    pub fn bond_views(&self) -> Vec<BondView> {
        self.bond_views_with(&self.ring_bonds())
    }

    /// Atom and bond views sharing a single ring search.
    pub fn views(&self) -> (Vec<AtomView>, Vec<BondView>) {
        let ring_bonds = self.ring_bonds();
        (self.atom_views_with(&ring_bonds), self.bond_views_with(&ring_bonds))
    }

    fn atom_views_with(&self, ring_bonds: &[bool]) -> Vec<AtomView> {
        let n = self.atoms.len();

        let mut degree = vec![0usize; n];
        let mut explicit_h = vec![0usize; n];
        let mut in_ring = vec![false; n];

        for (bond, &ring) in self.bonds.iter().zip(ring_bonds) {
            if bond.i >= n || bond.j >= n {
                continue;
            }
            for (a, b) in [(bond.i, bond.j), (bond.j, bond.i)] {
                degree[a] += 1;
                if self.atoms[b].element == Element::H {
                    explicit_h[a] += 1;
                }
                in_ring[a] |= ring;
            }
        }

        self.atoms
            .iter()
            .enumerate()
            .map(|(idx, atom)| AtomView {
                element: atom.element,
                degree: degree[idx],
                formal_charge: atom.formal_charge,
                total_hydrogens: atom.hydrogens as usize + explicit_h[idx],
                aromatic: atom.aromatic,
                in_ring: in_ring[idx],
                mass: atom.element.atomic_mass(),
            })
            .collect()
    }

    fn bond_views_with(&self, ring_bonds: &[bool]) -> Vec<BondView> {
        self.bonds
            .iter()
            .zip(ring_bonds.iter().copied())
            .map(|(bond, in_ring)| BondView {
                order: bond.order,
                aromatic: bond.order == BondOrder::Aromatic,
                in_ring,
            })
            .collect()
    }

    /// Derives implicit hydrogen counts from default valences for every atom
    /// whose `mask` entry is `true`.
    ///
    /// The count is the distance from the atom's bond-order sum to the smallest
    /// default valence that accommodates it, after adjusting valences for the
    /// formal charge. Atoms without default valences are left untouched.
    pub fn assign_implicit_hydrogens(&mut self, mask: &[bool]) {
        let n = self.atoms.len();
        let mut bond_sum = vec![0u8; n];
        for bond in &self.bonds {
            if bond.i < n && bond.j < n {
                let v = bond.order.valence_contribution();
                bond_sum[bond.i] = bond_sum[bond.i].saturating_add(v);
                bond_sum[bond.j] = bond_sum[bond.j].saturating_add(v);
            }
        }

        for (idx, atom) in self.atoms.iter_mut().enumerate() {
            if !mask.get(idx).copied().unwrap_or(false) {
                continue;
            }
            let valences = atom.element.default_valences();
            if valences.is_empty() {
                continue;
            }

            let mut used = i16::from(bond_sum[idx]);
            // Aromatic C/N/B/P carry one double bond in any Kekulé structure;
            // aromatic O/S/Se donate a lone pair instead.
            if atom.aromatic && matches!(atom.element.atomic_number(), 5 | 6 | 7 | 15) {
                used += 1;
            }

            let charge = i16::from(atom.formal_charge);
            let shift = if matches!(atom.element.atomic_number(), 5 | 6) {
                -charge.abs()
            } else {
                charge
            };

            atom.hydrogens = valences
                .iter()
                .map(|&v| i16::from(v) + shift)
                .find(|&v| v >= used)
                .map(|v| (v - used) as u8)
                .unwrap_or(0);
        }
    }

    /// Returns a copy in which every implicit hydrogen is an explicit H atom.
    ///
    /// New hydrogens are appended after the existing atoms and bonded with
    /// single bonds, so existing atom and bond indices are unchanged.
    pub fn with_explicit_hydrogens(&self) -> Molecule {
        let mut out = self.clone();
        for idx in 0..self.atoms.len() {
            let count = out.atoms[idx].hydrogens;
            out.atoms[idx].hydrogens = 0;
            for _ in 0..count {
                out.atoms.push(Atom::new(Element::H, self.atoms[idx].position));
                let h = out.atoms.len() - 1;
                out.bonds.push(Bond::new(idx, h, BondOrder::Single));
            }
        }
        out
    }
}
