use super::{EncodeError, FeatureEncoder, one_hot::OneHot};
use crate::model::{molecule::AtomView, types::Element};

/// A single per-atom feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomEncoder {
    Element(OneHot<Element>),
    Degree(OneHot<usize>),
    FormalCharge(OneHot<i8>),
    Hydrogens(OneHot<usize>),
    /// `1.0` for aromatic atoms.
    Aromatic,
    /// `1.0` for atoms in at least one ring.
    InRing,
    /// Atomic mass multiplied by `scale`.
    Mass { scale: f32 },
}

impl FeatureEncoder<AtomView> for AtomEncoder {
    fn width(&self) -> usize {
        match self {
            AtomEncoder::Element(h) => h.width(),
            AtomEncoder::Degree(h) => h.width(),
            AtomEncoder::FormalCharge(h) => h.width(),
            AtomEncoder::Hydrogens(h) => h.width(),
            AtomEncoder::Aromatic | AtomEncoder::InRing | AtomEncoder::Mass { .. } => 1,
        }
    }

    fn name(&self) -> &str {
        match self {
            AtomEncoder::Element(h) => h.feature(),
            AtomEncoder::Degree(h) => h.feature(),
            AtomEncoder::FormalCharge(h) => h.feature(),
            AtomEncoder::Hydrogens(h) => h.feature(),
            AtomEncoder::Aromatic => "aromatic",
            AtomEncoder::InRing => "in_ring",
            AtomEncoder::Mass { .. } => "mass",
        }
    }

    fn encode(&self, atom: &AtomView) -> Result<Vec<f32>, EncodeError> {
        match self {
            AtomEncoder::Element(h) => h.encode(&atom.element),
            AtomEncoder::Degree(h) => h.encode(&atom.degree),
            AtomEncoder::FormalCharge(h) => h.encode(&atom.formal_charge),
            AtomEncoder::Hydrogens(h) => h.encode(&atom.total_hydrogens),
            AtomEncoder::Aromatic => Ok(vec![flag(atom.aromatic)]),
            AtomEncoder::InRing => Ok(vec![flag(atom.in_ring)]),
            AtomEncoder::Mass { scale } => Ok(vec![atom.mass as f32 * scale]),
        }
    }
}

pub(super) fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn carbon() -> AtomView {
        AtomView {
            element: Element::C,
            degree: 3,
            formal_charge: 0,
            total_hydrogens: 1,
            aromatic: true,
            in_ring: true,
            mass: Element::C.atomic_mass(),
        }
    }

    #[test]
    fn element_one_hot() {
        let enc = AtomEncoder::Element(OneHot::new(
            "element",
            vec![Element::C, Element::N, Element::O],
            true,
        ));
        assert_eq!(enc.width(), 4);
        assert_eq!(enc.encode(&carbon()).unwrap(), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn flags_and_mass() {
        let atom = carbon();
        assert_eq!(AtomEncoder::Aromatic.encode(&atom).unwrap(), vec![1.0]);
        assert_eq!(AtomEncoder::InRing.encode(&atom).unwrap(), vec![1.0]);
        let mass = AtomEncoder::Mass { scale: 0.01 }.encode(&atom).unwrap();
        assert_relative_eq!(mass[0], 0.12011, epsilon = 1e-5);
    }

    #[test]
    fn encoding_is_deterministic() {
        let enc = AtomEncoder::Degree(OneHot::new("degree", vec![0, 1, 2, 3, 4], true));
        let a = enc.encode(&carbon()).unwrap();
        let b = enc.encode(&carbon()).unwrap();
        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }
}
