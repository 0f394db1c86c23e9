//! Error types for checker operations.

use modelcheck_core::StoreError;
use thiserror::Error;

/// Errors that abort a checker run.
///
/// Data violations are not errors; they are yielded as
/// [`Violation`](crate::Violation)s.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckerError {
    /// The store failed while a check was evaluated
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// The store does not carry the structural version the checks expect
    #[error("Schema version mismatch: expected {expected}, found {}", .found.map_or("none".to_string(), |v| v.to_string()))]
    SchemaVersionMismatch { expected: u32, found: Option<u32> },

    /// A declared table is absent from the store
    #[error("Declared table '{0}' is missing from the store")]
    MissingTable(String),

    /// Two checks share an error code
    #[error("Error code {code} is used by more than one check")]
    DuplicateErrorCode { code: u32 },

    /// A hand-declared check refers to a column the schema does not declare
    #[error("Column '{table}.{column}' is not declared")]
    UnknownColumn { table: String, column: String },

    /// A family of generated checks does not fit its code block
    #[error("Generated checks overflow the code block starting at {block}")]
    CodeBlockFull { block: u32 },
}

impl CheckerError {
    /// Creates a new schema version mismatch error.
    pub fn version_mismatch(expected: u32, found: Option<u32>) -> Self {
        Self::SchemaVersionMismatch { expected, found }
    }

    /// Creates a new missing table error.
    pub fn missing_table(table: impl Into<String>) -> Self {
        Self::MissingTable(table.into())
    }

    /// Creates a new unknown column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}
