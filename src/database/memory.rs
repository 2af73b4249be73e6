use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{Database, Leases, closed, key_text};
use crate::error::Error;
use crate::transform::Value;

/// A fixed map from text key to value.
///
/// Numeric keys are rendered as text before lookup (see [`Value::as_key`]).
#[derive(Debug)]
pub struct MemoryDatabase {
    name: String,
    entries: HashMap<String, Value>,
    open: AtomicBool,
    leases: Leases,
}

impl MemoryDatabase {
    pub fn new<I>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Self {
            name: name.into(),
            entries: entries.into_iter().collect(),
            open: AtomicBool::new(false),
            leases: Leases::new(),
        }
    }
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn open(&self) -> Result<(), Error> {
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    fn leases(&self) -> &Leases {
        &self.leases
    }

    fn get(&self, key: &Value) -> Result<Value, Error> {
        if !self.is_open() {
            return Err(closed(&self.name));
        }
        let key = key_text(&self.name, key)?;
        self.entries
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(&self.name, key))
    }

    fn concurrent_reads(&self) -> bool {
        true
    }
}
