use ndarray::{Array1, Array2, ArrayView2, s};

use super::{Graph, structure::edge_index_array};
use crate::error::Error;

/// Several graphs merged into one disjoint graph.
///
/// Node and edge rows are stacked in input order. Edge endpoints are shifted
/// by the node offset of their graph and reverse indices by its edge offset,
/// so message passing over the merged graph never crosses graph boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedGraph {
    nodes: Array2<f32>,
    edges: Array2<f32>,
    edge_index: Vec<[usize; 2]>,
    rev_index: Vec<usize>,
    batch: Array1<usize>,
    node_offsets: Vec<usize>,
    edge_offsets: Vec<usize>,
}

impl BatchedGraph {
    /// Merges `graphs` into one batch.
    ///
    /// Fails with [`Error::EmptyBatch`] for an empty slice and with
    /// [`Error::InvalidShape`] when node or edge feature widths differ.
    pub fn collate(graphs: &[Graph]) -> Result<Self, Error> {
        let first = graphs.first().ok_or(Error::EmptyBatch)?;
        let node_dim = first.node_dim();
        let edge_dim = first.edge_dim();

        let mut node_offsets = Vec::with_capacity(graphs.len() + 1);
        let mut edge_offsets = Vec::with_capacity(graphs.len() + 1);
        node_offsets.push(0);
        edge_offsets.push(0);
        for (i, g) in graphs.iter().enumerate() {
            if g.node_dim() != node_dim {
                return Err(Error::invalid_shape(
                    format!("node features of graph {i}"),
                    node_dim,
                    g.node_dim(),
                ));
            }
            if g.edge_dim() != edge_dim {
                return Err(Error::invalid_shape(
                    format!("edge features of graph {i}"),
                    edge_dim,
                    g.edge_dim(),
                ));
            }
            node_offsets.push(node_offsets[i] + g.num_nodes());
            edge_offsets.push(edge_offsets[i] + g.num_edges());
        }
        let total_nodes = node_offsets[graphs.len()];
        let total_edges = edge_offsets[graphs.len()];

        let mut nodes = Array2::<f32>::zeros((total_nodes, node_dim));
        let mut edges = Array2::<f32>::zeros((total_edges, edge_dim));
        let mut edge_index = Vec::with_capacity(total_edges);
        let mut rev_index = Vec::with_capacity(total_edges);
        let mut batch = Vec::with_capacity(total_nodes);

        for (i, g) in graphs.iter().enumerate() {
            let (n0, n1) = (node_offsets[i], node_offsets[i + 1]);
            let (e0, e1) = (edge_offsets[i], edge_offsets[i + 1]);
            nodes.slice_mut(s![n0..n1, ..]).assign(&g.nodes());
            edges.slice_mut(s![e0..e1, ..]).assign(&g.edges());
            edge_index.extend(g.edge_index().iter().map(|&[u, v]| [u + n0, v + n0]));
            rev_index.extend(g.rev_index().iter().map(|&r| r + e0));
            batch.extend(std::iter::repeat_n(i, g.num_nodes()));
        }

        Ok(Self {
            nodes,
            edges,
            edge_index,
            rev_index,
            batch: Array1::from(batch),
            node_offsets,
            edge_offsets,
        })
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

    pub fn edge_index_array(&self) -> Array2<usize> {
        edge_index_array(&self.edge_index)
    }

    pub fn rev_index(&self) -> &[usize] {
        &self.rev_index
    }

    /// Graph membership of every node row.
    pub fn batch(&self) -> &Array1<usize> {
        &self.batch
    }

    pub fn num_graphs(&self) -> usize {
        self.node_offsets.len() - 1
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

    /// Prefix sums of node counts; graph `i` owns rows `node_offsets[i]..node_offsets[i + 1]`.
    pub fn node_offsets(&self) -> &[usize] {
        &self.node_offsets
    }

    pub fn edge_offsets(&self) -> &[usize] {
        &self.edge_offsets
    }

    /// Reconstructs member graph `i`, or `None` when out of range.
    pub fn graph(&self, i: usize) -> Option<Graph> {
        if i >= self.num_graphs() {
            return None;
        }
        let (n0, n1) = (self.node_offsets[i], self.node_offsets[i + 1]);
        let (e0, e1) = (self.edge_offsets[i], self.edge_offsets[i + 1]);
        Some(Graph::from_parts_unchecked(
            self.nodes.slice(s![n0..n1, ..]).to_owned(),
            self.edges.slice(s![e0..e1, ..]).to_owned(),
            self.edge_index[e0..e1]
                .iter()
                .map(|&[u, v]| [u - n0, v - n0])
                .collect(),
            self.rev_index[e0..e1].iter().map(|&r| r - e0).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_atoms() -> Graph {
        Graph::new(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[0.5], [0.5]],
            vec![[0, 1], [1, 0]],
            vec![1, 0],
        )
        .unwrap()
    }

    fn three_atoms_no_bonds() -> Graph {
        Graph::new(
            array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]],
            Array2::zeros((0, 1)),
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn merges_bonded_and_bondless_graphs() {
        let b = BatchedGraph::collate(&[two_atoms(), three_atoms_no_bonds()]).unwrap();
        assert_eq!(b.num_graphs(), 2);
        assert_eq!(b.num_nodes(), 5);
        assert_eq!(b.num_edges(), 2);
        assert_eq!(b.batch(), &array![0usize, 0, 1, 1, 1]);
        assert_eq!(b.edge_index(), &[[0, 1], [1, 0]]);
        assert_eq!(b.rev_index(), &[1, 0]);
        assert_eq!(b.node_offsets(), &[0, 2, 5]);
        assert_eq!(b.edge_offsets(), &[0, 2, 2]);
        assert_eq!(b.nodes().row(4).to_vec(), vec![3.0, 3.0]);
    }

    #[test]
    fn offsets_shift_second_graph() {
        let b = BatchedGraph::collate(&[three_atoms_no_bonds(), two_atoms(), two_atoms()]).unwrap();
        assert_eq!(b.edge_index(), &[[3, 4], [4, 3], [5, 6], [6, 5]]);
        assert_eq!(b.rev_index(), &[1, 0, 3, 2]);
        assert_eq!(b.edge_index_array(), array![[3usize, 4, 5, 6], [4, 3, 6, 5]]);
    }

    #[test]
    fn single_graph_is_identity() {
        let g = two_atoms();
        let b = BatchedGraph::collate(std::slice::from_ref(&g)).unwrap();
        assert_eq!(b.nodes(), g.nodes());
        assert_eq!(b.edges(), g.edges());
        assert_eq!(b.edge_index(), g.edge_index());
        assert_eq!(b.rev_index(), g.rev_index());
        assert_eq!(b.batch(), &array![0usize, 0]);
    }

    #[test]
    fn members_can_be_recovered() {
        let graphs = [three_atoms_no_bonds(), two_atoms()];
        let b = BatchedGraph::collate(&graphs).unwrap();
        assert_eq!(b.graph(0).unwrap(), graphs[0]);
        assert_eq!(b.graph(1).unwrap(), graphs[1]);
        assert!(b.graph(2).is_none());
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(BatchedGraph::collate(&[]), Err(Error::EmptyBatch)));
    }

    #[test]
    fn width_mismatch_fails() {
        let narrow =
            Graph::new(Array2::zeros((1, 1)), Array2::zeros((0, 1)), vec![], vec![]).unwrap();
        let err = BatchedGraph::collate(&[two_atoms(), narrow]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape { expected: 2, received: 1, .. }));
    }
}
