use std::fmt;

use super::EncodeError;

/// One-hot encoding over a fixed vocabulary.
///
/// With `unknown` set, the vector carries one extra trailing slot that is hot
/// for any value outside the vocabulary; without it such values fail with
/// [`EncodeError::Unsupported`].
#[derive(Debug, Clone, PartialEq)]
pub struct OneHot<V> {
    feature: String,
    choices: Vec<V>,
    unknown: bool,
}

impl<V> OneHot<V>
where
    V: PartialEq + fmt::Display,
{
    pub fn new(feature: impl Into<String>, choices: Vec<V>, unknown: bool) -> Self {
        Self {
            feature: feature.into(),
            choices,
            unknown,
        }
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn choices(&self) -> &[V] {
        &self.choices
    }

    pub fn width(&self) -> usize {
        self.choices.len() + usize::from(self.unknown)
    }

    pub fn encode(&self, value: &V) -> Result<Vec<f32>, EncodeError> {
        let mut out = vec![0.0; self.width()];
        match self.choices.iter().position(|c| c == value) {
            Some(idx) => out[idx] = 1.0,
            None if self.unknown => out[self.choices.len()] = 1.0,
            None => return Err(EncodeError::unsupported(&self.feature, value)),
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_value_sets_its_slot() {
        let enc = OneHot::new("degree", vec![0usize, 1, 2, 3], true);
        assert_eq!(enc.width(), 5);
        assert_eq!(enc.encode(&2).unwrap(), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn unknown_value_uses_trailing_slot() {
        let enc = OneHot::new("degree", vec![0usize, 1], true);
        assert_eq!(enc.encode(&7).unwrap(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn unknown_value_without_slot_fails() {
        let enc = OneHot::new("charge", vec![-1i8, 0, 1], false);
        assert_eq!(enc.width(), 3);
        let err = enc.encode(&2).unwrap_err();
        assert_eq!(err, EncodeError::unsupported("charge", 2));
        assert!(err.to_string().contains("'2'"));
    }
}
