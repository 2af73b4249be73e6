//! Molecular graph featurization and batching for graph neural networks.
//!
//! Molecules are read from SMILES or SDF, turned into graphs of per-atom and
//! per-bond feature vectors, and merged into batches whose indices are offset
//! so a whole batch can be processed as one disjoint graph.
//!
//! # Features
//!
//! - **Graphs with reverse-edge indexing** — every bond is stored as two
//!   directed edges at positions `2i` and `2i + 1`, and each edge knows the
//!   position of its reverse
//! - **Configurable featurization** — atom and bond feature vectors are
//!   described in TOML and built from one-hot and scalar encoders
//! - **Keyed transform pipelines** — named `in_key → out_key` steps validated
//!   when the pipeline is built
//! - **Batch collation** — samples merge into a [`BatchedGraph`] plus target
//!   matrices, with auxiliary data joined from databases
//!
//! # Quick Start
//!
//! ```
//! use molgraph::data::{DatasetBuilder, TransformManager};
//! use molgraph::transform::{MolToGraph, Sample, SmilesToMol};
//!
//! let records = vec![
//!     Sample::new().with("smi", "CCO").with("logp", "-0.31"),
//!     Sample::new().with("smi", "c1ccccc1").with("logp", "1.69"),
//! ];
//!
//! let dataset = DatasetBuilder::new(records)
//!     .transform(TransformManager::new(SmilesToMol::new()))
//!     .transform(TransformManager::new(MolToGraph::default()))
//!     .target("logp", ["logp"])
//!     .build()?;
//!
//! let batch = dataset.load_batch(&[0, 1])?;
//!
//! // Two molecules merged into one disjoint graph: 3 + 6 atoms, 2 + 6 bonds.
//! let graphs = batch.input("G").and_then(|c| c.as_graphs()).unwrap();
//! assert_eq!(graphs.num_graphs(), 2);
//! assert_eq!(graphs.num_nodes(), 9);
//! assert_eq!(graphs.num_edges(), 16);
//! assert_eq!(graphs.batch().to_vec(), vec![0, 0, 0, 1, 1, 1, 1, 1, 1]);
//!
//! // One target row per molecule.
//! let targets = batch.target("logp").and_then(|c| c.as_matrix()).unwrap();
//! assert_eq!(targets.dim(), (2, 1));
//! # Ok::<(), molgraph::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — SMILES, SDF, and CSV readers
//! - [`featurize`] — Feature encoders and their TOML configuration
//! - [`graph`] — [`Graph`], [`BatchedGraph`], and graph construction
//! - [`transform`] — [`Sample`](transform::Sample) values, transforms, and pipelines
//! - [`data`] — Managers, [`Dataset`](data::Dataset), and [`Batch`](data::Batch)
//! - [`database`] — Auxiliary lookup sources with scoped open/close
//!
//! # Data Types
//!
//! - [`Molecule`] — Atoms, bonds, and per-record properties
//! - [`Atom`] — Element, coordinates, formal charge, and hydrogen count
//! - [`Bond`] — Bond between two atoms with bond order
//! - [`AtomView`] / [`BondView`] — Derived per-atom and per-bond properties
//!   that encoders consume
//! - [`Element`] — Chemical element (H through Og)
//! - [`BondOrder`] — Bond order (Single, Double, Triple, Aromatic)

mod error;
mod model;

pub mod data;
pub mod database;
pub mod featurize;
pub mod graph;
pub mod io;
pub mod transform;

pub use error::{Entity, Error};

pub use model::atom::Atom;
pub use model::molecule::{AtomView, Bond, BondView, Molecule};
pub use model::types::{BondOrder, Element, ParseBondOrderError, ParseElementError};

pub use graph::{BatchedGraph, Graph};
