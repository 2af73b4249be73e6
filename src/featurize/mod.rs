//! Per-atom and per-bond feature encoders.
//!
//! A [`FeatureEncoder`] maps one entity view to a fixed-width vector of
//! `f32`. Encoders are pure functions of their configuration, so the same
//! input always yields a bit-identical vector. Encoders compose with
//! [`Concat`], and the built-in ones are described declaratively by the TOML
//! schema in [`config`].
//!
//! - [`one_hot`] – One-hot vocabularies with an optional unknown slot.
//! - [`atom`] – Encoders over [`AtomView`](crate::AtomView).
//! - [`bond`] – Encoders over [`BondView`](crate::BondView).
//! - [`config`] – Tagged feature specs and the embedded default configuration.

use std::fmt;

use thiserror::Error;

pub mod atom;
pub mod bond;
pub mod config;
pub mod one_hot;

pub use config::{AtomFeatureSpec, BondFeatureSpec, FeaturizerConfig, load_config};

/// Why a single entity could not be encoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{feature}: value '{value}' is not in the vocabulary and no unknown slot is configured")]
    Unsupported { feature: String, value: String },

    #[error("{feature}: produced {received} values, expected {expected}")]
    Width {
        feature: String,
        expected: usize,
        received: usize,
    },
}

impl EncodeError {
    pub fn unsupported(feature: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::Unsupported {
            feature: feature.into(),
            value: value.to_string(),
        }
    }
}

/// Converts one entity of type `T` into a feature vector.
pub trait FeatureEncoder<T>: Send + Sync + fmt::Debug {
    /// Length of every vector this encoder produces.
    fn width(&self) -> usize;

    /// Short name used in error messages.
    fn name(&self) -> &str;

    fn encode(&self, item: &T) -> Result<Vec<f32>, EncodeError>;
}

/// Concatenation of several encoders over the same entity type.
///
/// The width is the sum of the part widths. A part that returns a vector of
/// the wrong length is reported as [`EncodeError::Width`].
#[derive(Debug)]
pub struct Concat<T> {
    parts: Vec<Box<dyn FeatureEncoder<T>>>,
    width: usize,
}

impl<T> Concat<T> {
    pub fn new(parts: Vec<Box<dyn FeatureEncoder<T>>>) -> Self {
        let width = parts.iter().map(|p| p.width()).sum();
        Self { parts, width }
    }

    pub fn parts(&self) -> &[Box<dyn FeatureEncoder<T>>] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<T> FeatureEncoder<T> for Concat<T>
where
    T: fmt::Debug + 'static,
{
    fn width(&self) -> usize {
        self.width
    }

    fn name(&self) -> &str {
        "concat"
    }

    fn encode(&self, item: &T) -> Result<Vec<f32>, EncodeError> {
        let mut out = Vec::with_capacity(self.width);
        for part in &self.parts {
            let values = part.encode(item)?;
            if values.len() != part.width() {
                return Err(EncodeError::Width {
                    feature: part.name().to_string(),
                    expected: part.width(),
                    received: values.len(),
                });
            }
            out.extend(values);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed(Vec<f32>, usize);

    impl FeatureEncoder<u8> for Fixed {
        fn width(&self) -> usize {
            self.1
        }
        fn name(&self) -> &str {
            "fixed"
        }
        fn encode(&self, _: &u8) -> Result<Vec<f32>, EncodeError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn concat_joins_parts_in_order() {
        let enc = Concat::new(vec![
            Box::new(Fixed(vec![1.0], 1)) as Box<dyn FeatureEncoder<u8>>,
            Box::new(Fixed(vec![2.0, 3.0], 2)),
        ]);
        assert_eq!(enc.width(), 3);
        assert_eq!(enc.encode(&0).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn concat_reports_misdeclared_part() {
        let enc = Concat::new(vec![
            Box::new(Fixed(vec![1.0, 2.0], 1)) as Box<dyn FeatureEncoder<u8>>,
        ]);
        let err = enc.encode(&0).unwrap_err();
        assert_eq!(
            err,
            EncodeError::Width {
                feature: "fixed".into(),
                expected: 1,
                received: 2
            }
        );
    }
}
