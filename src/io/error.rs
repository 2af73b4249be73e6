use super::Format;
use thiserror::Error;

/// Failure to read a structure or record stream.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read input: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A line-oriented file (SDF) is malformed; `line` is 1-based.
    #[error("malformed {format} input at line {line}: {details}")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    /// A line notation (SMILES) is malformed; `position` is the 0-based
    /// character offset into `input`.
    #[error("invalid {format} '{input}' at position {position}: {details}")]
    Syntax {
        format: Format,
        input: String,
        position: usize,
        details: String,
    },

    #[error("{0} input cannot be read as a molecular structure")]
    UnsupportedReadFormat(Format),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn syntax(
        format: Format,
        input: &str,
        position: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            format,
            input: input.to_string(),
            position,
            details: details.into(),
        }
    }
}
