use super::{EncodeError, FeatureEncoder, atom::flag, one_hot::OneHot};
use crate::model::{molecule::BondView, types::BondOrder};

/// A single per-bond feature.
#[derive(Debug, Clone, PartialEq)]
pub enum BondEncoder {
    Order(OneHot<BondOrder>),
    Aromatic,
    InRing,
}

impl FeatureEncoder<BondView> for BondEncoder {
    fn width(&self) -> usize {
        match self {
            BondEncoder::Order(h) => h.width(),
            BondEncoder::Aromatic | BondEncoder::InRing => 1,
        }
    }

    fn name(&self) -> &str {
        match self {
            BondEncoder::Order(h) => h.feature(),
            BondEncoder::Aromatic => "aromatic",
            BondEncoder::InRing => "in_ring",
        }
    }

    fn encode(&self, bond: &BondView) -> Result<Vec<f32>, EncodeError> {
        match self {
            BondEncoder::Order(h) => h.encode(&bond.order),
            BondEncoder::Aromatic => Ok(vec![flag(bond.aromatic)]),
            BondEncoder::InRing => Ok(vec![flag(bond.in_ring)]),
        }
    }
}
