use std::collections::BTreeSet;

use tracing::debug;

use super::Sample;
use crate::data::{Batch, Manager, TransformManager, input_key};
use crate::error::Error;

/// Validates and assembles an ordered list of transform steps.
#[derive(Debug)]
pub struct PipelineBuilder {
    input_keys: BTreeSet<String>,
    steps: Vec<TransformManager>,
}

impl PipelineBuilder {
    /// Starts a pipeline over records that provide `input_keys`.
    pub fn new<I, K>(input_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            input_keys: input_keys.into_iter().map(Into::into).collect(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: TransformManager) -> Self {
        self.steps.push(step);
        self
    }

    /// Checks that step names are unique and that every step reads a key that
    /// is an input column or the output of an earlier step.
    pub fn build(self) -> Result<Pipeline, Error> {
        let mut available = self.input_keys;
        let mut names = BTreeSet::new();
        for step in &self.steps {
            if !names.insert(step.name()) {
                return Err(Error::DuplicateStep(step.name().to_string()));
            }
            if !available.contains(step.in_key()) {
                return Err(Error::DanglingKey {
                    step: step.name().to_string(),
                    key: step.in_key().to_string(),
                });
            }
            available.insert(step.out_key().to_string());
        }

        debug!(
            steps = ?self.steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "built transform pipeline"
        );
        Ok(Pipeline { steps: self.steps })
    }
}

/// An ordered, validated sequence of transform steps.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<TransformManager>,
}

impl Pipeline {
    pub fn steps(&self) -> &[TransformManager] {
        &self.steps
    }

    /// Keys written by the steps, in order.
    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.out_key())
    }

    /// Runs every step on `sample` in order.
    pub fn apply(&self, mut sample: Sample) -> Result<Sample, Error> {
        for (i, step) in self.steps.iter().enumerate() {
            if !sample.contains_key(step.in_key()) {
                let producer = self.steps[..i]
                    .iter()
                    .rev()
                    .find(|s| s.out_key() == step.in_key())
                    .map(|s| s.name());
                return Err(Error::missing_key(step.in_key(), step.name(), producer));
            }
            sample = step.update(sample)?;
        }
        Ok(sample)
    }

    /// Collates every step's output across `samples` into
    /// `inputs.<out_key>` entries.
    pub fn collate(&self, samples: &[Sample]) -> Result<Batch, Error> {
        if samples.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let mut batch = Batch::new(samples.len());
        for step in &self.steps {
            batch.insert(input_key(step.out_key()), step.collate(samples)?);
        }
        Ok(batch)
    }
}
