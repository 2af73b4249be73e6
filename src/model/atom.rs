use super::types::Element;

/// A single atom of a [`Molecule`](super::molecule::Molecule).
///
/// `hydrogens` counts implicit (attached but not stored) hydrogens; explicit
/// hydrogen atoms are regular atoms connected through bonds.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub position: [f64; 3],
    pub formal_charge: i8,
    pub hydrogens: u8,
    pub aromatic: bool,
}

impl Atom {
    pub fn new(element: Element, position: [f64; 3]) -> Self {
        Self {
            element,
            position,
            formal_charge: 0,
            hydrogens: 0,
            aromatic: false,
        }
    }

    /// Creates an atom without coordinates, as produced by line notations.
    pub fn bare(element: Element) -> Self {
        Self::new(element, [0.0; 3])
    }

    pub fn with_charge(mut self, formal_charge: i8) -> Self {
        self.formal_charge = formal_charge;
        self
    }

    pub fn with_hydrogens(mut self, hydrogens: u8) -> Self {
        self.hydrogens = hydrogens;
        self
    }

    pub fn with_aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }
}
