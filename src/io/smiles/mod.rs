//! SMILES line notation reading.

mod reader;

pub use reader::parse;
