//! Readers for molecular structures and tabular records.
//!
//! - [`smiles`] – SMILES line notation.
//! - [`sdf`] – V2000 MOL/SDF blocks, including data items.
//! - [`table`] – CSV record sources.

use std::fmt;
use std::io::BufRead;
use std::path::Path;

use crate::model::molecule::Molecule;

pub mod error;
pub mod sdf;
pub mod smiles;
pub mod table;

pub use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Smiles,
    Sdf,
    Csv,
}

impl Format {
    /// Infers a format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "smi" | "smiles" => Some(Format::Smiles),
            "sdf" | "mol" | "sd" => Some(Format::Sdf),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Smiles => write!(f, "SMILES"),
            Format::Sdf => write!(f, "SDF"),
            Format::Csv => write!(f, "CSV"),
        }
    }
}

/// Reads the first molecule from `reader` in the given structure format.
///
/// For SMILES input the first non-empty line is parsed; text after the first
/// whitespace is taken as the molecule name.
pub fn read_molecule<R: BufRead>(reader: R, format: Format) -> Result<Molecule, Error> {
    match format {
        Format::Sdf => sdf::read(reader),
        Format::Smiles => {
            for line in reader.lines() {
                let line = line?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let (smi, name) = match trimmed.split_once(char::is_whitespace) {
                    Some((smi, name)) => (smi, name.trim()),
                    None => (trimmed, ""),
                };
                let mut mol = smiles::parse(smi)?;
                mol.name = name.to_string();
                return Ok(mol);
            }
            Err(Error::parse(Format::Smiles, 1, "input contains no SMILES string"))
        }
        Format::Csv => Err(Error::UnsupportedReadFormat(format)),
    }
}
