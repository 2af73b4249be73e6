//! Keyed sample transforms and the pipeline that chains them.
//!
//! A [`Transform`] reads one field of a [`Sample`] and produces another,
//! e.g. `smi → mol` or `mol → G`. Transforms are wrapped in
//! [`TransformManager`](crate::data::TransformManager)s, which fix their keys,
//! and ordered into a [`Pipeline`] by a [`PipelineBuilder`].
//!
//! - [`SmilesToMol`], [`MolBlockToMol`] – Structure parsing.
//! - [`MolToGraph`] – Graph featurization.
//! - [`Chain`] – Several transforms applied as one step.

use std::fmt;

use crate::error::Error;

mod chain;
mod graph;
mod mol;
mod pipeline;
mod sample;
mod value;

pub use chain::Chain;
pub use graph::MolToGraph;
pub use mol::{MolBlockToMol, SmilesToMol};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use sample::Sample;
pub use value::{Collated, Value};

/// Shape of the values a transform produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    #[default]
    Unknown,
    Scalar,
    Vector(usize),
    Graph { node_dim: usize, edge_dim: usize },
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputShape::Unknown => write!(f, "?"),
            OutputShape::Scalar => write!(f, "scalar"),
            OutputShape::Vector(w) => write!(f, "vector[{w}]"),
            OutputShape::Graph { node_dim, edge_dim } => {
                write!(f, "graph(nodes: {node_dim}, edges: {edge_dim})")
            }
        }
    }
}

/// A named conversion of one sample field into another.
pub trait Transform: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Key read when the transform is used with its default keys.
    fn in_key(&self) -> &str;

    /// Key written when the transform is used with its default keys.
    fn out_key(&self) -> &str;

    fn output_shape(&self) -> OutputShape {
        OutputShape::Unknown
    }

    /// Converts the value read from the input key. `key` is the key actually
    /// read and is only used in error messages.
    fn apply(&self, key: &str, value: &Value) -> Result<Value, Error>;

    /// Combines this transform's outputs across a batch.
    fn collate(&self, key: &str, values: &[&Value]) -> Result<Collated, Error> {
        Collated::stack(key, values)
    }
}

pub(crate) fn expect_text<'a>(key: &str, value: &'a Value) -> Result<&'a str, Error> {
    value.as_text().ok_or_else(|| Error::TypeMismatch {
        key: key.to_string(),
        expected: "text",
        found: value.kind(),
    })
}
