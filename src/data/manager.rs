use std::fmt;

use crate::database::Database;
use crate::error::Error;
use crate::transform::{Collated, Sample, Transform, Value};

/// Uniform `update`/`collate` protocol over transforms and databases.
///
/// `update` reads `in_key` from a sample and writes `out_key`; `collate`
/// combines the `out_key` values of a batch of updated samples.
pub trait Manager: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn in_key(&self) -> &str;

    fn out_key(&self) -> &str;

    fn update(&self, sample: Sample) -> Result<Sample, Error>;

    fn collate_values(&self, values: &[&Value]) -> Result<Collated, Error>;

    /// Collates the output key of `samples`.
    ///
    /// Fails with [`Error::MissingOutput`] if any sample lacks the key, which
    /// usually means `update` was never applied to it.
    fn collate(&self, samples: &[Sample]) -> Result<Collated, Error> {
        let values = samples
            .iter()
            .map(|s| {
                s.get(self.out_key()).ok_or_else(|| Error::MissingOutput {
                    manager: self.name().to_string(),
                    key: self.out_key().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.collate_values(&values)
    }
}

fn required<'a>(sample: &'a Sample, key: &str, step: &str) -> Result<&'a Value, Error> {
    sample
        .get(key)
        .ok_or_else(|| Error::missing_key(key, step, None))
}

/// A transform bound to concrete sample keys.
#[derive(Debug)]
pub struct TransformManager {
    transform: Box<dyn Transform>,
    name: String,
    in_key: String,
    out_key: String,
}

impl TransformManager {
    /// Wraps `transform` with its default name and keys.
    pub fn new(transform: impl Transform + 'static) -> Self {
        Self::boxed(Box::new(transform))
    }

    pub fn boxed(transform: Box<dyn Transform>) -> Self {
        Self {
            name: transform.name().to_string(),
            in_key: transform.in_key().to_string(),
            out_key: transform.out_key().to_string(),
            transform,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn reading(mut self, key: impl Into<String>) -> Self {
        self.in_key = key.into();
        self
    }

    pub fn writing(mut self, key: impl Into<String>) -> Self {
        self.out_key = key.into();
        self
    }

    pub fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }
}

impl Manager for TransformManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn in_key(&self) -> &str {
        &self.in_key
    }

    fn out_key(&self) -> &str {
        &self.out_key
    }

    fn update(&self, mut sample: Sample) -> Result<Sample, Error> {
        let input = required(&sample, &self.in_key, &self.name)?;
        let output = self.transform.apply(&self.in_key, input)?;
        sample.insert(self.out_key.clone(), output);
        Ok(sample)
    }

    fn collate_values(&self, values: &[&Value]) -> Result<Collated, Error> {
        self.transform.collate(&self.out_key, values)
    }
}

/// A database lookup keyed by a field already present in the sample.
#[derive(Debug)]
pub struct DatabaseManager {
    database: Box<dyn Database>,
    name: String,
    in_key: String,
    out_key: String,
}

impl DatabaseManager {
    /// Looks up `in_key` in `database` and stores the result under the
    /// database's name.
    pub fn new(database: impl Database + 'static, in_key: impl Into<String>) -> Self {
        let name = database.name().to_string();
        Self {
            database: Box::new(database),
            out_key: name.clone(),
            name,
            in_key: in_key.into(),
        }
    }

    pub fn writing(mut self, key: impl Into<String>) -> Self {
        self.out_key = key.into();
        self
    }

    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }
}

impl Manager for DatabaseManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn in_key(&self) -> &str {
        &self.in_key
    }

    fn out_key(&self) -> &str {
        &self.out_key
    }

    fn update(&self, mut sample: Sample) -> Result<Sample, Error> {
        let key = required(&sample, &self.in_key, &self.name)?;
        let value = self.database.get(key)?;
        sample.insert(self.out_key.clone(), value);
        Ok(sample)
    }

    fn collate_values(&self, values: &[&Value]) -> Result<Collated, Error> {
        self.database.collate(&self.out_key, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseGuard, MemoryDatabase};
    use crate::transform::SmilesToMol;

    #[test]
    fn transform_manager_renames_keys() {
        let m = TransformManager::new(SmilesToMol::new())
            .named("parse")
            .reading("smiles")
            .writing("molecule");
        let sample = m.update(Sample::new().with("smiles", "CC")).unwrap();
        assert!(sample.get("molecule").and_then(Value::as_molecule).is_some());
        assert_eq!(m.name(), "parse");
    }

    #[test]
    fn transform_manager_reports_missing_input() {
        let m = TransformManager::new(SmilesToMol::new());
        let err = m.update(Sample::new()).unwrap_err();
        assert!(matches!(err, Error::MissingKey { ref step, .. } if step == "smi_to_mol"));
    }

    #[test]
    fn collate_without_update_asks_about_update() {
        let m = TransformManager::new(SmilesToMol::new());
        let err = m.collate(&[Sample::new().with("smi", "C")]).unwrap_err();
        assert!(matches!(err, Error::MissingOutput { .. }));
        assert!(err.to_string().contains("smi_to_mol.update()"));
    }

    #[test]
    fn database_manager_looks_up_sample_field() {
        let db = MemoryDatabase::new("props", [("CCO".to_string(), Value::from(46.07))]);
        let m = DatabaseManager::new(db, "smi");
        let _guard = DatabaseGuard::open(m.database()).unwrap();
        let sample = m.update(Sample::new().with("smi", "CCO")).unwrap();
        assert_eq!(sample.get("props"), Some(&Value::from(46.07)));
        let collated = m.collate(&[sample]).unwrap();
        assert_eq!(collated.len(), 1);
    }
}
