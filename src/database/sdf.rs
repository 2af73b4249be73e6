use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{Database, Leases, closed, key_text};
use crate::error::Error;
use crate::io::sdf;
use crate::transform::Value;

const TERMINATOR: &str = "$$$$";

#[derive(Debug)]
struct Handle {
    reader: BufReader<File>,
    offsets: Vec<u64>,
}

/// Molecules stored in an SDF file, addressed by zero-based record index.
///
/// The record count is taken when the database is created. Opening indexes
/// the byte offset of every record; reads seek through one shared handle, so
/// concurrent lookups are serialized.
#[derive(Debug)]
pub struct SdfDatabase {
    name: String,
    path: PathBuf,
    len: usize,
    handle: Mutex<Option<Handle>>,
    leases: Leases,
}

impl SdfDatabase {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let mut len = 0;
        for line in BufReader::new(File::open(&path)?).lines() {
            if line?.trim() == TERMINATOR {
                len += 1;
            }
        }
        Ok(Self {
            name: name.into(),
            path,
            len,
            handle: Mutex::new(None),
            leases: Leases::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Option<Handle>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index(&self, key: &Value) -> Result<usize, Error> {
        let text = key_text(&self.name, key)?;
        match text.parse::<usize>() {
            Ok(i) if i < self.len => Ok(i),
            _ => Err(Error::key_not_found(&self.name, text)),
        }
    }
}

fn index_offsets(reader: &mut BufReader<File>, limit: usize) -> Result<Vec<u64>, Error> {
    let mut offsets = Vec::with_capacity(limit);
    let mut position = 0u64;
    let mut line = String::new();
    offsets.push(0);
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        position += read as u64;
        if line.trim() == TERMINATOR && offsets.len() < limit {
            offsets.push(position);
        }
    }
    // A terminator at the very end does not start another record.
    offsets.retain(|&offset| offset < position);
    offsets.truncate(limit);
    Ok(offsets)
}

impl Database for SdfDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn open(&self) -> Result<(), Error> {
        let mut slot = self.lock();
        if slot.is_none() {
            let mut reader = BufReader::new(File::open(&self.path)?);
            let offsets = index_offsets(&mut reader, self.len)?;
            *slot = Some(Handle { reader, offsets });
        }
        Ok(())
    }

    fn close(&self) {
        self.lock().take();
    }

    fn leases(&self) -> &Leases {
        &self.leases
    }

    fn get(&self, key: &Value) -> Result<Value, Error> {
        let mut slot = self.lock();
        let handle = slot.as_mut().ok_or_else(|| closed(&self.name))?;
        let index = self.index(key)?;

        // The file may have shrunk since the records were counted.
        let offset = *handle
            .offsets
            .get(index)
            .ok_or_else(|| Error::key_not_found(&self.name, index))?;
        handle.reader.seek(SeekFrom::Start(offset))?;
        let mut block = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if handle.reader.read_line(&mut line)? == 0 || line.trim() == TERMINATOR {
                break;
            }
            block.push_str(&line);
        }

        let mut mol = sdf::read(block.as_bytes())?;
        if mol.name.is_empty() {
            mol.name = format!("{}#{index}", self.name);
        }
        Ok(Value::Molecule(mol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_RECORDS: &str = "\
water
  test

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
ammonia
  test

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
M  END
> <id>
NH3

$$$$
";

    fn database() -> (tempfile::NamedTempFile, SdfDatabase) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_RECORDS.as_bytes()).unwrap();
        file.flush().unwrap();
        let db = SdfDatabase::new("structures", file.path()).unwrap();
        (file, db)
    }

    #[test]
    fn counts_records_at_construction() {
        let (_file, db) = database();
        assert_eq!(db.len(), 2);
        assert!(!db.is_open());
    }

    #[test]
    fn reads_records_by_index() {
        let (_file, db) = database();
        db.open().unwrap();
        let second = db.get(&Value::from(1.0)).unwrap();
        let mol = second.as_molecule().unwrap();
        assert_eq!(mol.name, "ammonia");
        assert_eq!(mol.atoms[0].hydrogens, 3);
        assert_eq!(mol.properties.get("id").map(String::as_str), Some("NH3"));

        let first = db.get(&Value::from("0")).unwrap();
        assert_eq!(first.as_molecule().unwrap().name, "water");
    }

    #[test]
    fn records_removed_after_counting_are_missing_keys() {
        let (file, db) = database();
        let first_record = TWO_RECORDS.split_inclusive("$$$$\n").next().unwrap();
        std::fs::write(file.path(), first_record).unwrap();

        db.open().unwrap();
        assert_eq!(db.len(), 2);
        assert!(db.get(&Value::from(0.0)).is_ok());
        let err = db.get(&Value::from(1.0)).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { ref key, .. } if key == "1"));
    }

    #[test]
    fn closed_and_missing_keys_fail() {
        let (_file, db) = database();
        assert!(matches!(db.get(&Value::from(0.0)), Err(Error::ClosedResource { .. })));
        db.open().unwrap();
        assert!(matches!(db.get(&Value::from(2.0)), Err(Error::KeyNotFound { .. })));
        assert!(matches!(db.get(&Value::from("first")), Err(Error::KeyNotFound { .. })));
        db.close();
        assert!(!db.is_open());
    }
}
