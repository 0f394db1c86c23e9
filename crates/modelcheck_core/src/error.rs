//! Error types for the store and geometry layers.
//!
//! Data violations are never errors: they are the regular output of a check.
//! The types here describe failures of the machinery underneath the checks.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`Store`](crate::Store) implementation.
///
/// Any of these terminates a validation run: results would otherwise be
/// silently incomplete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The queried table does not exist in the store
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    /// A record was inserted with an identifier that is already taken
    #[error("Duplicate id {id} in table '{table}'")]
    DuplicateId {
        /// Table name
        table: String,
        /// Offending identifier
        id: i64,
    },

    /// The backend failed while executing a query
    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a new unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable(table.into())
    }

    /// Creates a new backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Errors that can occur while reading Well-Known Text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The geometry keyword is not one of POINT, LINESTRING, POLYGON
    #[error("Unsupported geometry type '{0}'")]
    UnsupportedType(String),

    /// The text does not follow the WKT grammar
    #[error("Malformed WKT at position {position}: {message}")]
    Malformed {
        /// Byte offset of the problem
        position: usize,
        /// What was expected
        message: String,
    },

    /// A coordinate component is not a number
    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),
}

impl GeometryError {
    /// Creates a new malformed WKT error.
    pub fn malformed(position: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            position,
            message: message.into(),
        }
    }
}
