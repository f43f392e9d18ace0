//! Error types for tempocheck.
//!
//! All errors are strongly typed using thiserror. Each collaborator at the
//! edge of the validation core (log source, constraint provider, violation
//! sink, configuration) has its own error enum, and `AnalyserError` folds
//! them together for callers that drive a whole run.

use thiserror::Error;

use crate::time::Timestamp;

/// Errors raised while reading rows from a log source.
///
/// Every variant is fatal for the run: the core never skips a malformed row.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error reading log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log source has no header row")]
    MissingHeader,

    #[error("Required column '{column}' is missing from the log header")]
    MissingColumn {
        column: String,
    },

    #[error("Line {line}: expected {expected} fields, found {actual}")]
    FieldCount {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Line {line}: invalid timestamp '{raw}'")]
    InvalidTimestamp {
        line: usize,
        raw: String,
    },

    #[error("Row {row}: timestamp {timestamp} is older than the previous row ({previous})")]
    OutOfOrder {
        row: usize,
        timestamp: Timestamp,
        previous: Timestamp,
    },
}

/// Errors raised while loading or validating constraint definitions.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("Constraint '{constraint}': field '{field}' cannot be empty")]
    EmptyField {
        constraint: String,
        field: String,
    },

    #[error("Age constraint '{constraint}' has an empty stimulus/response chain")]
    EmptyChain {
        constraint: String,
    },

    #[error("Constraint '{constraint}' has a non-finite value {value}")]
    InvalidValue {
        constraint: String,
        value: f64,
    },

    #[error("Constraint id '{constraint}' is declared more than once")]
    DuplicateId {
        constraint: String,
    },

    #[error("Failed to parse constraint document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by a violation sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing violation: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize violation: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Timestamp scale must be finite and > 0, got {value}")]
    InvalidScale {
        value: f64,
    },

    #[error("Timestamp column name cannot be empty")]
    EmptyTimestampColumn,

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error type for a validation run.
#[derive(Debug, Error)]
pub enum AnalyserError {
    #[error("Log source error: {0}")]
    Source(#[from] SourceError),

    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AnalyserError {
    /// Returns true if the log source was malformed or unreadable.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if the constraint definitions were rejected.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// Returns true if a violation could not be handed to the sink.
    #[must_use]
    pub const fn is_sink(&self) -> bool {
        matches!(self, Self::Sink(_))
    }

    /// Returns true if the configuration was invalid.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for tempocheck operations.
pub type AnalyserResult<T> = Result<T, AnalyserError>;
