//! V2000 MOL/SDF reading.

mod reader;

pub use reader::{read, read_all};
