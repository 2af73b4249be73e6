use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use super::{Batch, DatabaseManager, Manager, TransformManager, input_key, target_key};
use crate::database::DatabaseGuard;
use crate::error::Error;
use crate::transform::{Collated, Pipeline, PipelineBuilder, Sample, Value};

/// Named group of target columns, stacked into one vector per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub name: String,
    pub columns: Vec<String>,
}

impl TargetGroup {
    fn extract(&self, sample: &Sample) -> Result<Value, Error> {
        let mut row = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = sample
                .get(column)
                .ok_or_else(|| Error::MissingColumn(column.clone()))?;
            row.push(parse_target(column, value)?);
        }
        Ok(Value::Vector(row))
    }
}

/// Parses one target cell; empty text is a missing label and becomes `NaN`.
pub(crate) fn parse_target(column: &str, value: &Value) -> Result<f32, Error> {
    match value {
        Value::Number(n) => Ok(*n as f32),
        Value::Text(s) if s.trim().is_empty() => Ok(f32::NAN),
        Value::Text(s) => s.trim().parse::<f32>().map_err(|_| Error::InvalidTarget {
            column: column.to_string(),
            value: s.clone(),
        }),
        other => Err(Error::TypeMismatch {
            key: column.to_string(),
            expected: "text or number",
            found: other.kind(),
        }),
    }
}

/// Records plus the steps that turn each into a training sample.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<Sample>,
    pipeline: Pipeline,
    targets: Vec<TargetGroup>,
    databases: Vec<DatabaseManager>,
    parallel: bool,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn targets(&self) -> &[TargetGroup] {
        &self.targets
    }

    pub fn databases(&self) -> &[DatabaseManager] {
        &self.databases
    }

    /// Opens every attached database for the lifetime of the returned guards.
    pub fn open_databases(&self) -> Result<Vec<DatabaseGuard<'_>>, Error> {
        self.databases
            .iter()
            .map(|m| DatabaseGuard::open(m.database()))
            .collect()
    }

    /// Builds the sample for record `index`: pipeline outputs, then one
    /// vector per target group, then database lookups.
    ///
    /// Databases must already be open (see [`open_databases`](Self::open_databases)).
    /// Failures are wrapped in [`Error::Record`].
    pub fn get(&self, index: usize) -> Result<Sample, Error> {
        self.build_sample(index).map_err(|e| e.in_record(index))
    }

    fn build_sample(&self, index: usize) -> Result<Sample, Error> {
        let record = self
            .records
            .get(index)
            .cloned()
            .ok_or_else(|| Error::key_not_found("records", index))?;

        let mut sample = self.pipeline.apply(record)?;
        for group in &self.targets {
            let row = group.extract(&sample)?;
            sample.insert(group.name.clone(), row);
        }
        for db in &self.databases {
            sample = db.update(sample)?;
        }
        Ok(sample)
    }

    /// Collates samples produced by [`get`](Self::get) into a [`Batch`].
    pub fn collate(&self, samples: &[Sample]) -> Result<Batch, Error> {
        let mut batch = self.pipeline.collate(samples)?;
        for group in &self.targets {
            let values = samples
                .iter()
                .map(|s| {
                    s.get(&group.name).ok_or_else(|| Error::MissingOutput {
                        manager: group.name.clone(),
                        key: group.name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            batch.insert(target_key(&group.name), Collated::stack(&group.name, &values)?);
        }
        for db in &self.databases {
            batch.insert(input_key(db.out_key()), db.collate(samples)?);
        }
        Ok(batch)
    }

    /// Whether [`load_samples`](Self::load_samples) builds samples on the
    /// rayon pool: parallelism must be enabled and every database must
    /// support concurrent reads.
    pub fn runs_parallel(&self) -> bool {
        self.parallel
            && self
                .databases
                .iter()
                .all(|m| m.database().concurrent_reads())
    }

    /// Opens the databases and builds the sample of every index, keeping
    /// per-record failures separate.
    pub fn load_samples(&self, indices: &[usize]) -> Result<Vec<Result<Sample, Error>>, Error> {
        let _guards = self.open_databases()?;
        let parallel = self.runs_parallel();
        debug!(count = indices.len(), parallel, "loading samples");

        let samples: Vec<Result<Sample, Error>> = if parallel {
            indices.par_iter().map(|&i| self.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.get(i)).collect()
        };
        Ok(samples)
    }

    /// Builds and collates the samples at `indices`; any failing record fails
    /// the whole batch.
    pub fn load_batch(&self, indices: &[usize]) -> Result<Batch, Error> {
        let samples = self
            .load_samples(indices)?
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        self.collate(&samples)
    }

    /// Iterates over consecutive batches of `batch_size` records; the last
    /// batch may be smaller.
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub fn batches(&self, batch_size: usize) -> Batches<'_> {
        assert!(batch_size > 0, "batch size must be non-zero");
        Batches {
            dataset: self,
            batch_size,
            next: 0,
        }
    }
}

/// Iterator returned by [`Dataset::batches`].
#[derive(Debug)]
pub struct Batches<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    next: usize,
}

impl Batches<'_> {
    /// Indices of the batch the next call to `next` will load.
    pub fn peek_indices(&self) -> Option<Vec<usize>> {
        let end = (self.next + self.batch_size).min(self.dataset.len());
        (self.next < end).then(|| (self.next..end).collect())
    }
}

impl Iterator for Batches<'_> {
    type Item = Result<Batch, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.peek_indices()?;
        self.next += indices.len();
        Some(self.dataset.load_batch(&indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.next).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

/// Assembles a [`Dataset`] and validates its key wiring.
#[derive(Debug)]
pub struct DatasetBuilder {
    records: Vec<Sample>,
    input_keys: Option<BTreeSet<String>>,
    steps: Vec<TransformManager>,
    targets: Vec<TargetGroup>,
    databases: Vec<DatabaseManager>,
    parallel: bool,
}

impl DatasetBuilder {
    pub fn new(records: Vec<Sample>) -> Self {
        Self {
            records,
            input_keys: None,
            steps: Vec::new(),
            targets: Vec::new(),
            databases: Vec::new(),
            parallel: true,
        }
    }

    /// Declares the record columns explicitly instead of taking every key
    /// that appears in the records.
    pub fn input_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.input_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn transform(mut self, step: TransformManager) -> Self {
        self.steps.push(step);
        self
    }

    pub fn target<I, K>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.targets.push(TargetGroup {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn database(mut self, manager: DatabaseManager) -> Self {
        self.databases.push(manager);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<Dataset, Error> {
        let input_keys = self.input_keys.unwrap_or_else(|| {
            self.records
                .iter()
                .flat_map(|r| r.keys().map(str::to_string))
                .collect()
        });

        let mut pipeline = PipelineBuilder::new(input_keys.iter().cloned());
        for step in self.steps {
            pipeline = pipeline.step(step);
        }
        let pipeline = pipeline.build()?;

        let mut available: BTreeSet<String> = input_keys;
        available.extend(pipeline.output_keys().map(str::to_string));
        let mut names: BTreeSet<String> = pipeline
            .steps()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        for group in &self.targets {
            if !names.insert(group.name.clone()) {
                return Err(Error::DuplicateStep(group.name.clone()));
            }
            if let Some(column) = group.columns.iter().find(|c| !available.contains(*c)) {
                return Err(Error::MissingColumn(column.clone()));
            }
        }
        available.extend(self.targets.iter().map(|g| g.name.clone()));

        for db in &self.databases {
            if !names.insert(db.name().to_string()) {
                return Err(Error::DuplicateStep(db.name().to_string()));
            }
            if !available.contains(db.in_key()) {
                return Err(Error::DanglingKey {
                    step: db.name().to_string(),
                    key: db.in_key().to_string(),
                });
            }
            available.insert(db.out_key().to_string());
        }

        debug!(
            records = self.records.len(),
            targets = self.targets.len(),
            databases = self.databases.len(),
            "built dataset"
        );
        Ok(Dataset {
            records: self.records,
            pipeline,
            targets: self.targets,
            databases: self.databases,
            parallel: self.parallel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDatabase;
    use crate::transform::{MolToGraph, SmilesToMol};

    fn records() -> Vec<Sample> {
        vec![
            Sample::new().with("smi", "C").with("y", "1.5"),
            Sample::new().with("smi", "CC").with("y", ""),
            Sample::new().with("smi", "CCO").with("y", "-2"),
        ]
    }

    fn dataset() -> Dataset {
        DatasetBuilder::new(records())
            .transform(TransformManager::new(SmilesToMol::new()))
            .transform(TransformManager::new(MolToGraph::default()))
            .target("y", ["y"])
            .build()
            .unwrap()
    }

    #[test]
    fn get_attaches_targets() {
        let sample = dataset().get(0).unwrap();
        assert_eq!(sample.get("y"), Some(&Value::Vector(vec![1.5])));
        assert!(sample.get("G").is_some());
    }

    #[test]
    fn empty_target_cell_is_nan() {
        let sample = dataset().get(1).unwrap();
        let row = sample.get("y").and_then(Value::as_vector).unwrap();
        assert!(row[0].is_nan());
    }

    #[test]
    fn out_of_range_index_is_wrapped() {
        let err = dataset().get(9).unwrap_err();
        assert!(matches!(err, Error::Record { index: 9, .. }));
        assert!(matches!(err.root(), Error::KeyNotFound { .. }));
    }

    #[test]
    fn load_batch_collates_inputs_and_targets() {
        let batch = dataset().load_batch(&[0, 2]).unwrap();
        assert_eq!(batch.size(), 2);
        let targets = batch.target("y").and_then(Collated::as_matrix).unwrap();
        assert_eq!(targets.dim(), (2, 1));
        assert_eq!(targets[[1, 0]], -2.0);
        let graphs = batch.input("G").and_then(Collated::as_graphs).unwrap();
        assert_eq!(graphs.num_nodes(), 1 + 3);
    }

    #[test]
    fn batches_cover_every_record() {
        let ds = dataset();
        let sizes: Vec<_> = ds.batches(2).map(|b| b.unwrap().size()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(ds.batches(2).len(), 2);
    }

    #[test]
    fn invalid_target_is_reported() {
        let ds = DatasetBuilder::new(vec![Sample::new().with("smi", "C").with("y", "n/a")])
            .target("y", ["y"])
            .build()
            .unwrap();
        let err = ds.get(0).unwrap_err();
        assert!(matches!(err.root(), Error::InvalidTarget { value, .. } if value == "n/a"));
    }

    #[test]
    fn unknown_target_column_fails_build() {
        let err = DatasetBuilder::new(records())
            .target("z", ["z"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "z"));
    }

    #[test]
    fn database_lookups_follow_targets() {
        let db = MemoryDatabase::new(
            "weights",
            [
                ("C".to_string(), Value::Vector(vec![1.0])),
                ("CCO".to_string(), Value::Vector(vec![3.0])),
            ],
        );
        let ds = DatasetBuilder::new(records())
            .target("y", ["y"])
            .database(DatabaseManager::new(db, "smi"))
            .build()
            .unwrap();

        let batch = ds.load_batch(&[0, 2]).unwrap();
        let weights = batch.input("weights").and_then(Collated::as_matrix).unwrap();
        assert_eq!(weights.column(0).to_vec(), vec![1.0, 3.0]);
        assert!(!ds.databases()[0].database().is_open());

        let err = ds.load_batch(&[1]).unwrap_err();
        assert!(matches!(err.root(), Error::KeyNotFound { .. }));
    }

    #[test]
    fn database_reading_unknown_key_fails_build() {
        let db = MemoryDatabase::new("weights", Vec::<(String, Value)>::new());
        let err = DatasetBuilder::new(records())
            .database(DatabaseManager::new(db, "inchi"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DanglingKey { ref key, .. } if key == "inchi"));
    }
}
