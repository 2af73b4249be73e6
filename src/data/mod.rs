//! Sample assembly and batching.
//!
//! A [`Dataset`] owns tabular records and turns each into a [`Sample`](crate::transform::Sample)
//! by running the transform pipeline, attaching target groups, and applying
//! database lookups. Samples of a batch are collated into a [`Batch`] keyed by
//! `inputs.<out_key>` and `targets.<group>`.

mod batch;
mod dataset;
mod manager;

pub use batch::{Batch, INPUT_KEY_PREFIX, TARGET_KEY_PREFIX, input_key, target_key};
pub use dataset::{Batches, Dataset, DatasetBuilder, TargetGroup};
pub(crate) use dataset::parse_target;
pub use manager::{DatabaseManager, Manager, TransformManager};
