//! CSV record sources.
//!
//! Each row becomes a [`Sample`] whose keys are the column headers and whose
//! values are the raw cells as [`Value::Text`]. Numeric interpretation (targets,
//! descriptors) happens downstream where the meaning of a column is known.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Error;
use crate::transform::{Sample, Value};

/// Reads every row of a headed CSV stream into a sample.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Sample>, Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut sample = Sample::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            sample.insert(header, Value::Text(cell.to_string()));
        }
        records.push(sample);
    }
    Ok(records)
}

/// Opens `path` and reads its rows with [`read_records`].
pub fn read_records_from_path(path: impl AsRef<Path>) -> Result<Vec<Sample>, Error> {
    let file = File::open(path.as_ref())?;
    read_records(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_become_text_samples() {
        let input = "smiles, logp ,tag\nCCO,0.5,a\nc1ccccc1, 2.1 ,\n";
        let records = read_records(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].get("smiles"), Some(Value::Text(s)) if s == "CCO"));
        assert!(matches!(records[1].get("logp"), Some(Value::Text(s)) if s == "2.1"));
        assert!(matches!(records[1].get("tag"), Some(Value::Text(s)) if s.is_empty()));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let input = "a,b\n1,2\n3\n";
        assert!(matches!(read_records(input.as_bytes()), Err(Error::Csv(_))));
    }
}
