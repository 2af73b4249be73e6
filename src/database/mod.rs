//! Auxiliary key-value sources joined into samples.
//!
//! A [`Database`] must be opened before it is read. [`DatabaseGuard`] ties the
//! open/close pair to a scope so a batch never leaves a handle open, even
//! when sample assembly fails or panics.
//!
//! - [`SdfDatabase`] – Molecules from an SDF file, addressed by record index.
//! - [`DescriptorTable`] – Numeric feature rows from a CSV file, addressed by a key column.
//! - [`MemoryDatabase`] – A fixed in-memory map.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::Error;
use crate::transform::{Collated, Value};

mod memory;
mod sdf;
mod table;

pub use memory::MemoryDatabase;
pub use sdf::SdfDatabase;
pub use table::DescriptorTable;

pub trait Database: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_open(&self) -> bool;

    fn open(&self) -> Result<(), Error>;

    fn close(&self);

    /// Holder count shared by every [`DatabaseGuard`] over this database.
    fn leases(&self) -> &Leases;

    /// Looks up `key`.
    ///
    /// Fails with [`Error::ClosedResource`] when the database is not open and
    /// with [`Error::KeyNotFound`] when it has no entry for `key`.
    fn get(&self, key: &Value) -> Result<Value, Error>;

    /// Whether `get` may be called from several threads at once without
    /// serializing on a shared handle.
    fn concurrent_reads(&self) -> bool {
        false
    }

    fn collate(&self, key: &str, values: &[&Value]) -> Result<Collated, Error> {
        Collated::stack(key, values)
    }
}

/// Tracks the guards currently holding a database open.
///
/// Each [`Database`] owns one; implementations only need to store it and
/// return it from [`Database::leases`].
#[derive(Debug, Default)]
pub struct Leases {
    state: Mutex<LeaseState>,
}

#[derive(Debug, Default)]
struct LeaseState {
    holders: usize,
    owned: bool,
}

impl Leases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live guards.
    pub fn holders(&self) -> usize {
        self.lock().holders
    }

    fn lock(&self) -> MutexGuard<'_, LeaseState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Keeps a database open for the guard's lifetime.
///
/// Guards over the same database share a holder count. The first guard opens
/// the database if it is closed, and the last one to drop closes it again,
/// so overlapping batches never close a database another batch still reads.
/// A database that was already open when the first guard arrived is left
/// open.
#[must_use = "the database is closed again when the last guard is dropped"]
pub struct DatabaseGuard<'a> {
    database: &'a dyn Database,
}

impl<'a> DatabaseGuard<'a> {
    pub fn open(database: &'a dyn Database) -> Result<Self, Error> {
        let mut state = database.leases().lock();
        if state.holders == 0 {
            state.owned = !database.is_open();
            if state.owned {
                database.open()?;
                debug!(database = database.name(), "opened database");
            }
        }
        state.holders += 1;
        Ok(Self { database })
    }

    pub fn database(&self) -> &dyn Database {
        self.database
    }
}

impl fmt::Debug for DatabaseGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseGuard")
            .field("database", &self.database.name())
            .field("holders", &self.database.leases().holders())
            .finish()
    }
}

impl Drop for DatabaseGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.database.leases().lock();
        state.holders = state.holders.saturating_sub(1);
        if state.holders == 0 && state.owned {
            state.owned = false;
            self.database.close();
            debug!(database = self.database.name(), "closed database");
        }
    }
}

pub(crate) fn closed(name: &str) -> Error {
    Error::ClosedResource {
        database: name.to_string(),
    }
}

pub(crate) fn key_text(database: &str, key: &Value) -> Result<String, Error> {
    key.as_key().ok_or_else(|| Error::TypeMismatch {
        key: format!("{database} key"),
        expected: "text or number",
        found: key.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> MemoryDatabase {
        MemoryDatabase::new("m", [("a".to_string(), Value::from(1.0))])
    }

    #[test]
    fn guard_opens_and_closes() {
        let db = db();
        {
            let guard = DatabaseGuard::open(&db).unwrap();
            assert!(guard.database().is_open());
            assert_eq!(db.get(&Value::from("a")).unwrap(), Value::from(1.0));
        }
        assert!(!db.is_open());
        assert!(matches!(db.get(&Value::from("a")), Err(Error::ClosedResource { .. })));
    }

    #[test]
    fn guard_leaves_open_database_open() {
        let db = db();
        db.open().unwrap();
        {
            let _guard = DatabaseGuard::open(&db).unwrap();
        }
        assert!(db.is_open());
        db.close();
        assert!(!db.is_open());
    }

    #[test]
    fn overlapping_guards_close_on_last_drop() {
        let db = db();
        let first = DatabaseGuard::open(&db).unwrap();
        let second = DatabaseGuard::open(&db).unwrap();
        assert_eq!(db.leases().holders(), 2);

        drop(first);
        assert!(db.is_open());
        assert_eq!(second.database().get(&Value::from("a")).unwrap(), Value::from(1.0));

        drop(second);
        assert_eq!(db.leases().holders(), 0);
        assert!(!db.is_open());
    }

    #[test]
    fn guards_on_other_threads_share_the_open() {
        let db = db();
        let outer = DatabaseGuard::open(&db).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let guard = DatabaseGuard::open(&db).unwrap();
                    assert!(guard.database().get(&Value::from("a")).is_ok());
                });
            }
        });
        assert!(db.is_open());
        drop(outer);
        assert!(!db.is_open());
    }

    #[test]
    fn guard_closes_during_unwinding() {
        let db = db();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = DatabaseGuard::open(&db).unwrap();
            panic!("sample assembly failed");
        }));
        assert!(result.is_err());
        assert!(!db.is_open());
    }
}
