use super::{Collated, OutputShape, Transform, Value};
use crate::error::Error;

/// Several transforms applied in sequence as a single step.
///
/// The chain reads its first member's input key, writes its last member's
/// output key, and collates like its last member. Intermediate values never
/// enter the sample.
#[derive(Debug)]
pub struct Chain {
    name: String,
    members: Vec<Box<dyn Transform>>,
}

impl Chain {
    /// Returns `None` when `members` is empty.
    pub fn new(name: impl Into<String>, members: Vec<Box<dyn Transform>>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            members,
        })
    }

    pub fn members(&self) -> &[Box<dyn Transform>] {
        &self.members
    }

    fn last(&self) -> &dyn Transform {
        // Non-empty by construction.
        self.members[self.members.len() - 1].as_ref()
    }
}

impl Transform for Chain {
    fn name(&self) -> &str {
        &self.name
    }

    fn in_key(&self) -> &str {
        self.members[0].in_key()
    }

    fn out_key(&self) -> &str {
        self.last().out_key()
    }

    fn output_shape(&self) -> OutputShape {
        self.last().output_shape()
    }

    fn apply(&self, key: &str, value: &Value) -> Result<Value, Error> {
        let mut current = self.members[0].apply(key, value)?;
        for pair in self.members.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            current = next.apply(prev.out_key(), &current)?;
        }
        Ok(current)
    }

    fn collate(&self, key: &str, values: &[&Value]) -> Result<Collated, Error> {
        self.last().collate(key, values)
    }
}
