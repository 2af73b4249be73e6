use std::collections::BTreeMap;

use crate::transform::Collated;

/// Namespace of collated pipeline and database outputs.
pub const INPUT_KEY_PREFIX: &str = "inputs";
/// Namespace of collated target groups.
pub const TARGET_KEY_PREFIX: &str = "targets";

pub fn input_key(out_key: &str) -> String {
    format!("{INPUT_KEY_PREFIX}.{out_key}")
}

pub fn target_key(group: &str) -> String {
    format!("{TARGET_KEY_PREFIX}.{group}")
}

/// Collated values of several samples, keyed by namespaced key
/// (`inputs.<out_key>`, `targets.<group>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    size: usize,
    entries: BTreeMap<String, Collated>,
}

impl Batch {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            entries: BTreeMap::new(),
        }
    }

    /// Number of samples in the batch.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Collated) -> Option<Collated> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Collated> {
        self.entries.get(key)
    }

    pub fn input(&self, out_key: &str) -> Option<&Collated> {
        self.get(&input_key(out_key))
    }

    pub fn target(&self, group: &str) -> Option<&Collated> {
        self.get(&target_key(group))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Collated)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_lookups() {
        let mut batch = Batch::new(1);
        batch.insert(input_key("smi"), Collated::Texts(vec!["C".into()]));
        batch.insert(target_key("logp"), Collated::Texts(vec!["x".into()]));
        assert!(batch.input("smi").is_some());
        assert!(batch.target("logp").is_some());
        assert!(batch.get("smi").is_none());
        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["inputs.smi", "targets.logp"]);
    }
}
