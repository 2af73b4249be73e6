//! Molecular graphs and their batched form.
//!
//! - [`Graph`] – Node/edge feature matrices with directed-edge duplication and
//!   a reverse-edge index.
//! - [`build`] / [`MolGraphFeaturizer`] – Molecule to graph conversion.
//! - [`BatchedGraph`] – Disjoint union of graphs with offset indices.

mod batch;
mod featurizer;
mod structure;

pub use batch::BatchedGraph;
pub use featurizer::{MolGraphFeaturizer, build};
pub use structure::Graph;
