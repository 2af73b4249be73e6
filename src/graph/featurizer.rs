use ndarray::Array2;
use rayon::prelude::*;

use super::Graph;
use crate::error::{Entity, Error};
use crate::featurize::{Concat, EncodeError, FeatureEncoder, FeaturizerConfig};
use crate::model::molecule::{AtomView, BondView, Molecule};

/// Builds the graph of `mol` from one atom encoder and one bond encoder.
///
/// Atom `i` becomes node row `i`. Bond `i` between atoms `u` and `v` is
/// encoded once and becomes edges `2i` (`u → v`) and `2i + 1` (`v → u`), so
/// `rev_index[p] == p ^ 1`.
pub fn build<A, B>(mol: &Molecule, atom_encoder: &A, bond_encoder: &B) -> Result<Graph, Error>
where
    A: FeatureEncoder<AtomView> + ?Sized,
    B: FeatureEncoder<BondView> + ?Sized,
{
    mol.check_bonds()?;

    let node_dim = atom_encoder.width();
    let edge_dim = bond_encoder.width();
    let n = mol.atom_count();
    let m = mol.bond_count();

    let (atom_views, bond_views) = mol.views();

    let mut nodes = Vec::with_capacity(n * node_dim);
    for (index, atom) in atom_views.iter().enumerate() {
        let row = atom_encoder
            .encode(atom)
            .map_err(|source| encode_failure(Entity::Atom, index, source))?;
        if row.len() != node_dim {
            return Err(Error::invalid_shape(
                format!("atom {index} features"),
                node_dim,
                row.len(),
            ));
        }
        nodes.extend(row);
    }

    let mut edges = Vec::with_capacity(2 * m * edge_dim);
    let mut edge_index = Vec::with_capacity(2 * m);
    for (index, (bond, view)) in mol.bonds.iter().zip(&bond_views).enumerate() {
        let row = bond_encoder
            .encode(view)
            .map_err(|source| encode_failure(Entity::Bond, index, source))?;
        if row.len() != edge_dim {
            return Err(Error::invalid_shape(
                format!("bond {index} features"),
                edge_dim,
                row.len(),
            ));
        }
        edges.extend_from_slice(&row);
        edges.extend(row);
        edge_index.push([bond.i, bond.j]);
        edge_index.push([bond.j, bond.i]);
    }

    let rev_index = (0..2 * m).map(|p| p ^ 1).collect();
    let nodes = Array2::from_shape_vec((n, node_dim), nodes)
        .map_err(|e| Error::InvalidGraph(e.to_string()))?;
    let edges = Array2::from_shape_vec((2 * m, edge_dim), edges)
        .map_err(|e| Error::InvalidGraph(e.to_string()))?;

    Ok(Graph::from_parts_unchecked(nodes, edges, edge_index, rev_index))
}

/// A part of a composite encoder that breaks its declared width is a shape
/// error, not an encoding error.
fn encode_failure(entity: Entity, index: usize, source: EncodeError) -> Error {
    match source {
        EncodeError::Width {
            feature,
            expected,
            received,
        } => Error::invalid_shape(
            format!("{entity} {index} feature '{feature}'"),
            expected,
            received,
        ),
        source => Error::Encoding {
            entity,
            index,
            source,
        },
    }
}

/// Featurizer pairing a concatenated atom encoder with a concatenated bond
/// encoder.
#[derive(Debug)]
pub struct MolGraphFeaturizer {
    atom: Concat<AtomView>,
    bond: Concat<BondView>,
}

impl MolGraphFeaturizer {
    pub fn new(atom: Concat<AtomView>, bond: Concat<BondView>) -> Self {
        Self { atom, bond }
    }

    pub fn from_config(config: &FeaturizerConfig) -> Self {
        Self::new(config.atom_encoder(), config.bond_encoder())
    }

    pub fn node_dim(&self) -> usize {
        self.atom.width()
    }

    pub fn edge_dim(&self) -> usize {
        self.bond.width()
    }

    pub fn featurize(&self, mol: &Molecule) -> Result<Graph, Error> {
        build(mol, &self.atom, &self.bond)
    }

    /// Featurizes `mols` in parallel; results keep the input order.
    pub fn featurize_all(&self, mols: &[Molecule]) -> Vec<Result<Graph, Error>> {
        mols.par_iter().map(|mol| self.featurize(mol)).collect()
    }
}

impl Default for MolGraphFeaturizer {
    fn default() -> Self {
        Self::from_config(&FeaturizerConfig::default())
    }
}
