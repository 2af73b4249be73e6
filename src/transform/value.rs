use ndarray::{Array1, Array2};

use crate::error::Error;
use crate::graph::{BatchedGraph, Graph};
use crate::model::molecule::Molecule;

/// A single field of a [`Sample`](super::Sample).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Vector(Vec<f32>),
    Molecule(Molecule),
    Graph(Graph),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Vector(_) => "vector",
            Value::Molecule(_) => "molecule",
            Value::Graph(_) => "graph",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_molecule(&self) -> Option<&Molecule> {
        match self {
            Value::Molecule(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }

    /// Renders a text or number value as a lookup key.
    ///
    /// Integral numbers render without a fractional part, so `Number(3.0)`
    /// and `Text("3")` address the same entry.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(format!("{n:.0}")),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::Vector(v)
    }
}

impl From<Molecule> for Value {
    fn from(m: Molecule) -> Self {
        Value::Molecule(m)
    }
}

impl From<Graph> for Value {
    fn from(g: Graph) -> Self {
        Value::Graph(g)
    }
}

/// The batch-level form of one key across several samples.
#[derive(Debug, Clone, PartialEq)]
pub enum Collated {
    Texts(Vec<String>),
    Numbers(Array1<f64>),
    /// One row per sample.
    Matrix(Array2<f32>),
    Molecules(Vec<Molecule>),
    Graphs(BatchedGraph),
}

impl Collated {
    /// Stacks same-kind values into their batch form.
    ///
    /// Vectors become the rows of a matrix and graphs are merged with
    /// [`BatchedGraph::collate`]. `key` names the field in error messages.
    pub fn stack(key: &str, values: &[&Value]) -> Result<Collated, Error> {
        let first = values.first().ok_or(Error::EmptyBatch)?;
        if let Some(other) = values.iter().find(|v| v.kind() != first.kind()) {
            return Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: first.kind(),
                found: other.kind(),
            });
        }

        let collated = match first {
            Value::Text(_) => Collated::Texts(
                values
                    .iter()
                    .filter_map(|v| v.as_text().map(str::to_string))
                    .collect(),
            ),
            Value::Number(_) => {
                Collated::Numbers(values.iter().filter_map(|v| v.as_number()).collect())
            }
            Value::Vector(row) => {
                let width = row.len();
                let mut data = Vec::with_capacity(values.len() * width);
                for v in values.iter().filter_map(|v| v.as_vector()) {
                    if v.len() != width {
                        return Err(Error::invalid_shape(key, width, v.len()));
                    }
                    data.extend_from_slice(v);
                }
                let matrix = Array2::from_shape_vec((values.len(), width), data)
                    .map_err(|_| Error::invalid_shape(key, width, 0))?;
                Collated::Matrix(matrix)
            }
            Value::Molecule(_) => Collated::Molecules(
                values
                    .iter()
                    .filter_map(|v| v.as_molecule().cloned())
                    .collect(),
            ),
            Value::Graph(_) => {
                let graphs: Vec<Graph> =
                    values.iter().filter_map(|v| v.as_graph().cloned()).collect();
                Collated::Graphs(BatchedGraph::collate(&graphs)?)
            }
        };
        Ok(collated)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Collated::Texts(_) => "texts",
            Collated::Numbers(_) => "numbers",
            Collated::Matrix(_) => "matrix",
            Collated::Molecules(_) => "molecules",
            Collated::Graphs(_) => "graphs",
        }
    }

    /// Number of samples represented.
    pub fn len(&self) -> usize {
        match self {
            Collated::Texts(v) => v.len(),
            Collated::Numbers(v) => v.len(),
            Collated::Matrix(m) => m.nrows(),
            Collated::Molecules(v) => v.len(),
            Collated::Graphs(g) => g.num_graphs(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_matrix(&self) -> Option<&Array2<f32>> {
        match self {
            Collated::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_graphs(&self) -> Option<&BatchedGraph> {
        match self {
            Collated::Graphs(g) => Some(g),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn vectors_stack_into_rows() {
        let a = Value::Vector(vec![1.0, 2.0]);
        let b = Value::Vector(vec![3.0, 4.0]);
        let c = Collated::stack("targets", &[&a, &b]).unwrap();
        assert_eq!(c, Collated::Matrix(array![[1.0, 2.0], [3.0, 4.0]]));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn ragged_vectors_are_rejected() {
        let a = Value::Vector(vec![1.0, 2.0]);
        let b = Value::Vector(vec![3.0]);
        let err = Collated::stack("targets", &[&a, &b]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape { expected: 2, received: 1, .. }));
    }

    #[test]
    fn mixed_kinds_are_rejected() {
        let a = Value::from("x");
        let b = Value::from(1.0);
        let err = Collated::stack("smiles", &[&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { expected: "text", found: "number", .. }
        ));
    }

    #[test]
    fn empty_stack_fails() {
        assert!(matches!(Collated::stack("k", &[]), Err(Error::EmptyBatch)));
    }

    #[test]
    fn numbers_and_texts() {
        let (a, b) = (Value::from(1.5), Value::from(-2.0));
        assert_eq!(
            Collated::stack("n", &[&a, &b]).unwrap(),
            Collated::Numbers(array![1.5, -2.0])
        );
        let t = Value::from("CCO");
        assert_eq!(
            Collated::stack("s", &[&t]).unwrap(),
            Collated::Texts(vec!["CCO".into()])
        );
    }

    #[test]
    fn key_rendering() {
        assert_eq!(Value::Number(3.0).as_key().as_deref(), Some("3"));
        assert_eq!(Value::Number(2.5).as_key().as_deref(), Some("2.5"));
        assert_eq!(Value::from("abc").as_key().as_deref(), Some("abc"));
        assert_eq!(Value::Vector(vec![]).as_key(), None);
    }
}
