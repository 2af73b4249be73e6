//! Error types for graph construction, pipelines, and sample assembly.
//!
//! Every failure names the offending key, step, index, or database so callers
//! can decide per record whether to skip and log or abort the batch. Per-record
//! failures raised while assembling a dataset sample are wrapped in
//! [`Error::Record`].

use std::fmt;

use thiserror::Error;

use crate::featurize::EncodeError;

/// The kind of entity a feature encoder was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Atom,
    Bond,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Atom => write!(f, "atom"),
            Entity::Bond => write!(f, "bond"),
        }
    }
}

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An atom or bond could not be converted into a feature vector.
    #[error("failed to encode {entity} {index}: {source}")]
    Encoding {
        /// Whether an atom or a bond failed.
        entity: Entity,
        /// Position of the atom or bond in the molecule.
        index: usize,
        /// The encoder's failure.
        #[source]
        source: EncodeError,
    },

    /// A feature vector or matrix does not have the width its producer declared.
    #[error("'{name}' has incorrect shape: got {received}, expected {expected}")]
    InvalidShape {
        /// What was being checked.
        name: String,
        /// Declared width.
        expected: usize,
        /// Observed width.
        received: usize,
    },

    /// A pipeline step required a key that is absent from the sample.
    #[error(
        "step '{step}' requires key '{key}', which is missing from the sample{hint}",
        hint = producer_hint(.producer)
    )]
    MissingKey {
        /// The missing key.
        key: String,
        /// The step that needed the key.
        step: String,
        /// The step expected to produce the key, when it is not a record column.
        producer: Option<String>,
    },

    /// A manager was asked to collate samples that lack its output key.
    #[error("sample is missing key '{key}': is it the result of `{manager}.update()`?")]
    MissingOutput {
        /// Name of the collating manager.
        manager: String,
        /// The manager's output key.
        key: String,
    },

    /// A database was read while it was not open.
    #[error(
        "tried to retrieve an item from closed database '{database}'; open it first, e.g. with `DatabaseGuard::open`"
    )]
    ClosedResource {
        /// Name of the database.
        database: String,
    },

    /// Collation was called with no items.
    #[error("cannot collate an empty batch: at least one item is required")]
    EmptyBatch,

    /// A database has no entry for the requested key.
    #[error("key '{key}' not found in database '{database}'")]
    KeyNotFound {
        /// Name of the database.
        database: String,
        /// The requested key, rendered as text.
        key: String,
    },

    /// A sample value has a different kind than the consumer expects.
    #[error("value under '{key}' is {found}, expected {expected}")]
    TypeMismatch {
        /// Key of the offending value.
        key: String,
        /// Expected value kind.
        expected: &'static str,
        /// Actual value kind.
        found: &'static str,
    },

    /// A pipeline step reads a key nothing provides.
    #[error(
        "step '{step}' reads key '{key}', which is neither an input column nor produced by an earlier step"
    )]
    DanglingKey {
        /// The reading step.
        step: String,
        /// The unresolved key.
        key: String,
    },

    /// Two pipeline steps or managers share a name.
    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),

    /// A bond references atoms outside the molecule.
    #[error("invalid bond between atoms {i} and {j}: {detail}")]
    InvalidBond {
        /// First atom index.
        i: usize,
        /// Second atom index.
        j: usize,
        /// Description of the problem.
        detail: String,
    },

    /// Graph components violate a structural invariant.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// A tabular column required by the configuration is absent.
    #[error("column '{0}' not found in record headers")]
    MissingColumn(String),

    /// A target cell could not be parsed as a number.
    #[error("invalid target value '{value}' in column '{column}'")]
    InvalidTarget {
        /// Target column.
        column: String,
        /// Offending cell.
        value: String,
    },

    /// A structure could not be read.
    #[error(transparent)]
    Structure(#[from] crate::io::Error),

    /// Reading a file failed.
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Reading tabular (CSV) data failed.
    #[error("failed to read tabular data: {0}")]
    Csv(#[from] csv::Error),

    /// The featurizer configuration is not valid TOML for this crate.
    #[error("failed to parse featurizer configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Building the sample for a dataset record failed.
    #[error("failed to build sample for record {index}")]
    Record {
        /// Record index in the dataset.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

fn producer_hint(producer: &Option<String>) -> String {
    match producer {
        Some(step) => format!(" (it is produced by step '{step}'; did that step run?)"),
        None => " (it is expected as a record input column)".to_string(),
    }
}

impl Error {
    /// Creates a [`MissingKey`](Error::MissingKey) error.
    pub fn missing_key(
        key: impl Into<String>,
        step: impl Into<String>,
        producer: Option<&str>,
    ) -> Self {
        Self::MissingKey {
            key: key.into(),
            step: step.into(),
            producer: producer.map(str::to_string),
        }
    }

    /// Creates an [`InvalidShape`](Error::InvalidShape) error.
    pub fn invalid_shape(name: impl Into<String>, expected: usize, received: usize) -> Self {
        Self::InvalidShape {
            name: name.into(),
            expected,
            received,
        }
    }

    /// Creates an [`InvalidBond`](Error::InvalidBond) error.
    pub fn invalid_bond(i: usize, j: usize, details: impl Into<String>) -> Self {
        Self::InvalidBond {
            i,
            j,
            detail: details.into(),
        }
    }

    /// Creates a [`KeyNotFound`](Error::KeyNotFound) error.
    pub fn key_not_found(database: &str, key: impl fmt::Display) -> Self {
        Self::KeyNotFound {
            database: database.to_string(),
            key: key.to_string(),
        }
    }

    /// Wraps `self` with the index of the record it was raised for.
    pub fn in_record(self, index: usize) -> Self {
        Self::Record {
            index,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through [`Record`](Error::Record) wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Record { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_step_and_producer() {
        let err = Error::missing_key("mol", "mol_to_graph", Some("smi_to_mol"));
        let msg = err.to_string();
        assert!(msg.contains("'mol_to_graph'"));
        assert!(msg.contains("'mol'"));
        assert!(msg.contains("'smi_to_mol'"));

        let err = Error::missing_key("raw", "T1", None);
        assert!(err.to_string().contains("record input column"));
    }

    #[test]
    fn record_wrapper_exposes_root() {
        let err = Error::EmptyBatch.in_record(3).in_record(7);
        assert!(matches!(err.root(), Error::EmptyBatch));
        assert!(matches!(err, Error::Record { index: 7, .. }));
    }
}
