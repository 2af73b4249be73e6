use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{Concat, FeatureEncoder, atom::AtomEncoder, bond::BondEncoder, one_hot::OneHot};
use crate::error::Error;
use crate::model::{
    molecule::{AtomView, BondView},
    types::{BondOrder, Element},
};

const DEFAULT_CONFIG_TOML: &str = include_str!("../../resources/default.featurizer.toml");

static DEFAULT_CONFIG: OnceLock<FeaturizerConfig> = OnceLock::new();

/// Declarative description of the atom and bond feature vectors.
///
/// ```toml
/// [[atom]]
/// kind = "element"
/// choices = ["C", "N", "O"]
/// unknown = true
///
/// [[atom]]
/// kind = "aromatic"
///
/// [[bond]]
/// kind = "order"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturizerConfig {
    #[serde(default)]
    pub atom: Vec<AtomFeatureSpec>,
    #[serde(default)]
    pub bond: Vec<BondFeatureSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AtomFeatureSpec {
    Element {
        #[serde(default = "default_elements")]
        choices: Vec<Element>,
        #[serde(default = "default_unknown")]
        unknown: bool,
    },
    Degree {
        #[serde(default = "default_degrees")]
        choices: Vec<usize>,
        #[serde(default = "default_unknown")]
        unknown: bool,
    },
    FormalCharge {
        #[serde(default = "default_charges")]
        choices: Vec<i8>,
        #[serde(default = "default_unknown")]
        unknown: bool,
    },
    Hydrogens {
        #[serde(default = "default_hydrogens")]
        choices: Vec<usize>,
        #[serde(default = "default_unknown")]
        unknown: bool,
    },
    Aromatic,
    InRing,
    Mass {
        #[serde(default = "default_mass_scale")]
        scale: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BondFeatureSpec {
    Order {
        #[serde(default = "default_orders")]
        choices: Vec<BondOrder>,
        #[serde(default)]
        unknown: bool,
    },
    Aromatic,
    InRing,
}

fn default_elements() -> Vec<Element> {
    vec![
        Element::C,
        Element::N,
        Element::O,
        Element::F,
        Element::P,
        Element::S,
        Element::CL,
        Element::BR,
        Element::I,
    ]
}
fn default_degrees() -> Vec<usize> {
    (0..=5).collect()
}
fn default_charges() -> Vec<i8> {
    vec![-2, -1, 0, 1, 2]
}
fn default_hydrogens() -> Vec<usize> {
    (0..=4).collect()
}
fn default_orders() -> Vec<BondOrder> {
    vec![
        BondOrder::Single,
        BondOrder::Double,
        BondOrder::Triple,
        BondOrder::Aromatic,
    ]
}
fn default_unknown() -> bool {
    true
}
fn default_mass_scale() -> f32 {
    0.01
}

impl AtomFeatureSpec {
    pub fn build(&self) -> AtomEncoder {
        match self {
            AtomFeatureSpec::Element { choices, unknown } => {
                AtomEncoder::Element(OneHot::new("element", choices.clone(), *unknown))
            }
            AtomFeatureSpec::Degree { choices, unknown } => {
                AtomEncoder::Degree(OneHot::new("degree", choices.clone(), *unknown))
            }
            AtomFeatureSpec::FormalCharge { choices, unknown } => {
                AtomEncoder::FormalCharge(OneHot::new("formal_charge", choices.clone(), *unknown))
            }
            AtomFeatureSpec::Hydrogens { choices, unknown } => {
                AtomEncoder::Hydrogens(OneHot::new("hydrogens", choices.clone(), *unknown))
            }
            AtomFeatureSpec::Aromatic => AtomEncoder::Aromatic,
            AtomFeatureSpec::InRing => AtomEncoder::InRing,
            AtomFeatureSpec::Mass { scale } => AtomEncoder::Mass { scale: *scale },
        }
    }
}

impl BondFeatureSpec {
    pub fn build(&self) -> BondEncoder {
        match self {
            BondFeatureSpec::Order { choices, unknown } => {
                BondEncoder::Order(OneHot::new("order", choices.clone(), *unknown))
            }
            BondFeatureSpec::Aromatic => BondEncoder::Aromatic,
            BondFeatureSpec::InRing => BondEncoder::InRing,
        }
    }
}

impl FeaturizerConfig {
    pub fn atom_encoder(&self) -> Concat<AtomView> {
        Concat::new(
            self.atom
                .iter()
                .map(|spec| Box::new(spec.build()) as Box<dyn FeatureEncoder<AtomView>>)
                .collect(),
        )
    }

    pub fn bond_encoder(&self) -> Concat<BondView> {
        Concat::new(
            self.bond
                .iter()
                .map(|spec| Box::new(spec.build()) as Box<dyn FeatureEncoder<BondView>>)
                .collect(),
        )
    }
}

impl Default for FeaturizerConfig {
    fn default() -> Self {
        get_default_config().clone()
    }
}

/// Parses `custom_toml` as a featurizer configuration, or returns the embedded
/// default when `None`.
pub fn load_config(custom_toml: Option<&str>) -> Result<FeaturizerConfig, Error> {
    match custom_toml {
        Some(toml) => {
            let config: FeaturizerConfig = toml::from_str(toml)?;
            Ok(config)
        }
        None => Ok(get_default_config().clone()),
    }
}

pub fn get_default_config() -> &'static FeaturizerConfig {
    DEFAULT_CONFIG.get_or_init(|| {
        toml::from_str(DEFAULT_CONFIG_TOML)
            .expect("Failed to parse embedded default featurizer configuration. This is a library bug.")
    })
}
