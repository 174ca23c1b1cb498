//! Error types for joint axis identification.
//!
//! Recoverable conditions (negative tolerances, degenerate experiments) are
//! never errors: they are corrected or counted and reported through `tracing`.
//! Everything here aborts the operation that returned it.

use thiserror::Error;

/// Main error type for joint axis identification.
#[derive(Error, Debug)]
pub enum IdentError {
    /// Input validation errors.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Sample table width does not match the declared joint count.
    #[error("Column mismatch: {n_joints} joints need {expected} columns, got {actual}")]
    ColumnMismatch {
        n_joints: usize,
        expected: usize,
        actual: usize,
    },

    /// Sample table is too short to contain a single motion.
    #[error("Too few samples: need at least {min} rows, got {actual}")]
    TooFewRows { min: usize, actual: usize },

    /// A sample value is NaN or infinite.
    #[error("Non-finite sample value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One or more joints were never observed moving on their own.
    #[error("Insufficient coverage: no usable motion for joint(s) {joints:?}")]
    InsufficientCoverage { joints: Vec<usize> },

    /// A token in a text table is not a number.
    #[error("Parse error at line {line}, column {column}: {token:?} is not a number")]
    Parse {
        line: usize,
        column: usize,
        token: String,
    },

    /// A text table row has a different number of columns than the first row.
    #[error("Ragged row at line {line}: expected {expected} columns, got {actual}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A text table contained no data rows.
    #[error("Input contains no data rows")]
    EmptyInput,

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Delimited-text reader failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Result type alias for joint axis identification.
pub type Result<T> = std::result::Result<T, IdentError>;

impl IdentError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a column mismatch error.
    #[must_use]
    pub const fn column_mismatch(n_joints: usize, expected: usize, actual: usize) -> Self {
        Self::ColumnMismatch {
            n_joints,
            expected,
            actual,
        }
    }

    /// Create a too-few-rows error.
    #[must_use]
    pub const fn too_few_rows(min: usize, actual: usize) -> Self {
        Self::TooFewRows { min, actual }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an insufficient coverage error.
    #[must_use]
    pub fn insufficient_coverage(joints: impl Into<Vec<usize>>) -> Self {
        Self::InsufficientCoverage {
            joints: joints.into(),
        }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(line: usize, column: usize, token: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            token: token.into(),
        }
    }

    /// Whether the error comes from the shape or content of the input data
    /// rather than from configuration or I/O.
    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::ColumnMismatch { .. }
                | Self::TooFewRows { .. }
                | Self::NonFinite { .. }
                | Self::Parse { .. }
                | Self::RaggedRow { .. }
                | Self::EmptyInput
        )
    }
}
