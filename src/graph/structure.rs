use ndarray::{Array2, ArrayView2};

use crate::error::Error;

/// Node and edge features of one molecule.
///
/// Every undirected bond is stored as two directed edges at consecutive
/// positions, and `rev_index[p]` is the position of the edge antiparallel to
/// edge `p`. Fields are private: a `Graph` satisfies its invariants from
/// construction on.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: Array2<f32>,
    edges: Array2<f32>,
    edge_index: Vec<[usize; 2]>,
    rev_index: Vec<usize>,
}

impl Graph {
    /// Builds a graph from its components after checking that
    ///
    /// - `edges`, `edge_index` and `rev_index` have the same length,
    /// - every edge endpoint is a valid node row,
    /// - `rev_index` is an involution pointing at the reversed edge.
    pub fn new(
        nodes: Array2<f32>,
        edges: Array2<f32>,
        edge_index: Vec<[usize; 2]>,
        rev_index: Vec<usize>,
    ) -> Result<Self, Error> {
        let n = nodes.nrows();
        let e = edge_index.len();

        if edges.nrows() != e {
            return Err(Error::invalid_shape("edge rows", e, edges.nrows()));
        }
        if rev_index.len() != e {
            return Err(Error::invalid_shape("rev_index", e, rev_index.len()));
        }
        if let Some((p, pair)) = edge_index
            .iter()
            .enumerate()
            .find(|(_, [u, v])| *u >= n || *v >= n)
        {
            return Err(Error::InvalidGraph(format!(
                "edge {p} {pair:?} references a node outside 0..{n}"
            )));
        }
        for (p, &r) in rev_index.iter().enumerate() {
            if r >= e || rev_index[r] != p {
                return Err(Error::InvalidGraph(format!(
                    "rev_index is not an involution at edge {p}"
                )));
            }
            let [u, v] = edge_index[p];
            if edge_index[r] != [v, u] {
                return Err(Error::InvalidGraph(format!(
                    "edge {r} is not the reverse of edge {p}"
                )));
            }
        }

        Ok(Self {
            nodes,
            edges,
            edge_index,
            rev_index,
        })
    }

    pub(crate) fn from_parts_unchecked(
        nodes: Array2<f32>,
        edges: Array2<f32>,
        edge_index: Vec<[usize; 2]>,
        rev_index: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(edges.nrows(), edge_index.len());
        debug_assert_eq!(rev_index.len(), edge_index.len());
        Self {
            nodes,
            edges,
            edge_index,
            rev_index,
        }
    }

    pub fn nodes(&self) -> ArrayView2<'_, f32> {
        self.nodes.view()
    }

    pub fn edges(&self) -> ArrayView2<'_, f32> {
        self.edges.view()
    }

    pub fn edge_index(&self) -> &[[usize; 2]] {
        &self.edge_index
    }

    pub fn rev_index(&self) -> &[usize] {
        &self.rev_index
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.nrows()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    pub fn node_dim(&self) -> usize {
        self.nodes.ncols()
    }

    pub fn edge_dim(&self) -> usize {
        self.edges.ncols()
    }

    /// Edge index as a `(2, E)` array of sources over targets.
    pub fn edge_index_array(&self) -> Array2<usize> {
        edge_index_array(&self.edge_index)
    }

    pub fn into_parts(self) -> (Array2<f32>, Array2<f32>, Vec<[usize; 2]>, Vec<usize>) {
        (self.nodes, self.edges, self.edge_index, self.rev_index)
    }
}

pub(super) fn edge_index_array(pairs: &[[usize; 2]]) -> Array2<usize> {
    Array2::from_shape_fn((2, pairs.len()), |(row, col)| pairs[col][row])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn pair() -> Graph {
        Graph::new(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[0.5], [0.5]],
            vec![[0, 1], [1, 0]],
            vec![1, 0],
        )
        .unwrap()
    }

    #[test]
    fn accessors_report_dimensions() {
        let g = pair();
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.node_dim(), 2);
        assert_eq!(g.edge_dim(), 1);
        assert_eq!(g.edge_index_array(), array![[0usize, 1], [1, 0]]);
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Graph::new(
            Array2::zeros((2, 1)),
            Array2::zeros((1, 1)),
            vec![[0, 1], [1, 0]],
            vec![1, 0],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidShape { expected: 2, received: 1, .. }));
    }

    #[test]
    fn rejects_out_of_range_node() {
        let err = Graph::new(
            Array2::zeros((2, 1)),
            Array2::zeros((2, 1)),
            vec![[0, 2], [2, 0]],
            vec![1, 0],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn rejects_bad_reverse_index() {
        let err = Graph::new(
            Array2::zeros((3, 1)),
            Array2::zeros((2, 1)),
            vec![[0, 1], [1, 2]],
            vec![1, 0],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));

        let err = Graph::new(
            Array2::zeros((2, 1)),
            Array2::zeros((2, 1)),
            vec![[0, 1], [1, 0]],
            vec![0, 0],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn empty_graph_is_valid() {
        let g = Graph::new(Array2::zeros((0, 4)), Array2::zeros((0, 3)), vec![], vec![]).unwrap();
        assert_eq!(g.num_nodes(), 0);
        assert_eq!(g.edge_index_array().dim(), (2, 0));
    }
}
