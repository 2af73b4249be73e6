use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use super::{Database, Leases, closed, key_text};
use crate::data::parse_target;
use crate::error::Error;
use crate::transform::Value;

/// Precomputed numeric descriptors in a CSV file.
///
/// One column holds the lookup key; the feature columns (every other column
/// unless narrowed with [`with_columns`](Self::with_columns)) are parsed into
/// one vector per row when the table is opened, and released on close.
/// Empty cells become `NaN`. When a key repeats, its first row wins and the
/// repeats are logged.
#[derive(Debug)]
pub struct DescriptorTable {
    name: String,
    path: PathBuf,
    key_column: String,
    columns: Vec<String>,
    len: usize,
    rows: RwLock<Option<HashMap<String, Vec<f32>>>>,
    leases: Leases,
}

impl DescriptorTable {
    /// Reads the header to resolve columns and counts the distinct keys.
    pub fn new(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        key_column: impl Into<String>,
    ) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let key_column = key_column.into();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(File::open(&path)?);
        let headers = reader.headers()?.clone();
        let key_at = headers
            .iter()
            .position(|h| h == key_column)
            .ok_or_else(|| Error::MissingColumn(key_column.clone()))?;
        let columns = headers
            .iter()
            .filter(|h| *h != key_column)
            .map(str::to_string)
            .collect();

        let name = name.into();
        let mut keys = HashSet::new();
        let mut duplicates = 0usize;
        for record in reader.records() {
            let record = record?;
            if !keys.insert(record.get(key_at).unwrap_or_default().to_string()) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(table = %name, duplicates, "repeated keys; keeping the first row of each");
        }

        Ok(Self {
            name,
            path,
            key_column,
            columns,
            len: keys.len(),
            rows: RwLock::new(None),
            leases: Leases::new(),
        })
    }

    /// Restricts the feature vector to `columns`, in the given order.
    pub fn with_columns<I, K>(mut self, columns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some(missing) = columns.iter().find(|c| !self.columns.contains(c)) {
            return Err(Error::MissingColumn(missing.clone()));
        }
        self.columns = columns;
        Ok(self)
    }

    /// Length of every descriptor vector.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<HashMap<String, Vec<f32>>>> {
        self.rows.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<HashMap<String, Vec<f32>>>> {
        self.rows.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self) -> Result<HashMap<String, Vec<f32>>, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(File::open(&self.path)?);
        let headers = reader.headers()?.clone();
        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| Error::MissingColumn(column.to_string()))
        };
        let key_at = position(self.key_column.as_str())?;
        let feature_at = self
            .columns
            .iter()
            .map(|c| position(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = HashMap::with_capacity(self.len);
        for record in reader.records() {
            let record = record?;
            let key = record.get(key_at).unwrap_or_default().to_string();
            let mut row = Vec::with_capacity(feature_at.len());
            for (&at, column) in feature_at.iter().zip(&self.columns) {
                let cell = Value::Text(record.get(at).unwrap_or_default().to_string());
                row.push(parse_target(column, &cell)?);
            }
            rows.entry(key).or_insert(row);
        }
        Ok(rows)
    }
}

impl Database for DescriptorTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_open(&self) -> bool {
        self.read().is_some()
    }

    fn open(&self) -> Result<(), Error> {
        if self.is_open() {
            return Ok(());
        }
        let rows = self.load()?;
        debug!(table = %self.name, rows = rows.len(), width = self.width(), "loaded descriptors");
        *self.write() = Some(rows);
        Ok(())
    }

    fn close(&self) {
        self.write().take();
    }

    fn leases(&self) -> &Leases {
        &self.leases
    }

    fn get(&self, key: &Value) -> Result<Value, Error> {
        let rows = self.read();
        let rows = rows.as_ref().ok_or_else(|| closed(&self.name))?;
        let key = key_text(&self.name, key)?;
        rows.get(&key)
            .map(|row| Value::Vector(row.clone()))
            .ok_or_else(|| Error::key_not_found(&self.name, key))
    }

    fn concurrent_reads(&self) -> bool {
        true
    }
}
