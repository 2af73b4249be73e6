use super::{OutputShape, Transform, Value};
use crate::error::Error;
use crate::featurize::FeaturizerConfig;
use crate::graph::MolGraphFeaturizer;

/// Featurizes a molecule into a [`Graph`](crate::graph::Graph) (`mol → G`).
///
/// Outputs collate into a [`BatchedGraph`](crate::graph::BatchedGraph).
#[derive(Debug, Default)]
pub struct MolToGraph {
    featurizer: MolGraphFeaturizer,
}

impl MolToGraph {
    pub fn new(featurizer: MolGraphFeaturizer) -> Self {
        Self { featurizer }
    }

    pub fn from_config(config: &FeaturizerConfig) -> Self {
        Self::new(MolGraphFeaturizer::from_config(config))
    }

    pub fn featurizer(&self) -> &MolGraphFeaturizer {
        &self.featurizer
    }
}

impl Transform for MolToGraph {
    fn name(&self) -> &str {
        "mol_to_graph"
    }

    fn in_key(&self) -> &str {
        "mol"
    }

    fn out_key(&self) -> &str {
        "G"
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Graph {
            node_dim: self.featurizer.node_dim(),
            edge_dim: self.featurizer.edge_dim(),
        }
    }

    fn apply(&self, key: &str, value: &Value) -> Result<Value, Error> {
        let mol = value.as_molecule().ok_or_else(|| Error::TypeMismatch {
            key: key.to_string(),
            expected: "molecule",
            found: value.kind(),
        })?;
        Ok(Value::Graph(self.featurizer.featurize(mol)?))
    }
}
