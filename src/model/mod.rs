//! Core data structures representing molecules.
//!
//! - [`atom`] – Atom with element, coordinates, formal charge, and implicit hydrogens.
//! - [`types`] – Periodic table elements and bond order classifications.
//! - [`molecule`] – Molecules with ordered atoms and bonds, plus the derived
//!   [`AtomView`](molecule::AtomView) and [`BondView`](molecule::BondView)
//!   entities that feature encoders consume.

pub mod atom;
pub mod molecule;
pub mod types;
