//! Loaders for model snapshots and checker configuration (YAML/TOML/JSON).
//!
//! A snapshot is a plain-text dump of a schematisation: its schema version
//! and, per table, a list of rows. Loading a snapshot against a
//! [`DeclaredSchema`](modelcheck_core::DeclaredSchema) yields a
//! [`MemoryStore`](modelcheck_core::MemoryStore) whose values carry the
//! declared column types.
//!
//! # Example
//!
//! ```rust
//! use modelcheck_core::{ColumnBuilder, ColumnType, GeometryType, SchemaBuilder, Store, TableBuilder};
//! use modelcheck_parser::parse_snapshot_yaml;
//!
//! let schema = SchemaBuilder::new(1)
//!     .table(
//!         TableBuilder::new("connection_node")
//!             .column(ColumnBuilder::new("the_geom", ColumnType::Geometry(GeometryType::Point)))
//!             .build(),
//!     )
//!     .build();
//!
//! let yaml = r#"
//! schema_version: 1
//! tables:
//!   connection_node:
//!     - id: 1
//!       the_geom: POINT (0 0)
//! "#;
//!
//! let store = parse_snapshot_yaml(yaml, &schema).unwrap();
//! assert_eq!(store.schema_version().unwrap(), Some(1));
//! assert_eq!(store.row_count("connection_node"), 1);
//! ```

mod config;
mod snapshot;

pub use config::*;
pub use snapshot::*;

use modelcheck_core::StoreError;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading snapshots or configuration.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// JSON parsing or deserialization failed
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// The snapshot holds a table the schema does not declare
    #[error("Table '{0}' is not declared in the schema")]
    UnknownTable(String),

    /// A snapshot row has no integer id
    #[error("Row {row} of table '{table}' has no integer id")]
    MissingId { table: String, row: usize },

    /// The rows could not be stored
    #[error("Failed to store snapshot: {0}")]
    StoreError(#[from] StoreError),
}

impl ParserError {
    /// Creates a new missing id error; `row` is 1-based.
    pub fn missing_id(table: impl Into<String>, row: usize) -> Self {
        Self::MissingId {
            table: table.into(),
            row,
        }
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

/// Detect the file format from a path based on its extension.
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

fn from_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))
}

fn from_format<T: serde::de::DeserializeOwned>(content: &str, format: FileFormat) -> Result<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yaml_ng::from_str(content)?),
        FileFormat::Toml => from_toml(content),
        FileFormat::Json => Ok(serde_json::from_str(content)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("model.yml")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("model.YAML")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("checker.toml")).unwrap(), FileFormat::Toml);
        assert_eq!(detect_format(Path::new("model.json")).unwrap(), FileFormat::Json);
    }

    #[test]
    fn test_detect_format_errors() {
        assert!(matches!(
            detect_format(Path::new("model")),
            Err(ParserError::InvalidExtension)
        ));
        assert!(matches!(
            detect_format(Path::new("model.sqlite")),
            Err(ParserError::UnsupportedFormat(ext)) if ext == "sqlite"
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ParserError::missing_id("channel", 3).to_string(),
            "Row 3 of table 'channel' has no integer id"
        );
        assert_eq!(
            ParserError::UnknownTable("v2_channel".to_string()).to_string(),
            "Table 'v2_channel' is not declared in the schema"
        );
    }
}
