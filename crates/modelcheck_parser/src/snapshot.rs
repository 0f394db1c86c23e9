//! Model snapshot loading.

use crate::{detect_format, from_format, FileFormat, ParserError, Result};
use modelcheck_core::{ColumnType, DeclaredSchema, Geometry, MemoryStore, Record, TableDef, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A scalar as written in a snapshot file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

/// The raw content of a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    /// Structural schema version of the dumped schematisation
    #[serde(default)]
    pub schema_version: Option<u32>,

    /// Rows per table
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<BTreeMap<String, Option<RawValue>>>>,
}

fn number_text(value: f64) -> String {
    format!("{value}")
}

/// Converts a raw value to a value of the declared column type.
///
/// Values that cannot be converted are kept as they are, so that the type
/// checks report them.
pub fn typed_value(raw: Option<RawValue>, column_type: Option<ColumnType>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    match (raw, column_type) {
        (RawValue::Bool(b), _) => Value::from(b),
        (RawValue::Integer(i), Some(ColumnType::Text)) => Value::Text(i.to_string()),
        (RawValue::Real(r), Some(ColumnType::Text)) => Value::Text(number_text(r)),
        (RawValue::Integer(i), _) => Value::Integer(i),
        (RawValue::Real(r), _) => Value::Real(r),
        (RawValue::Text(text), Some(ColumnType::Geometry(_))) => {
            Geometry::from_wkt(&text).map_or(Value::Text(text), Value::Geometry)
        }
        (RawValue::Text(text), _) => Value::Text(text),
    }
}

fn record(
    table: &TableDef,
    row_number: usize,
    row: BTreeMap<String, Option<RawValue>>,
) -> Result<Record> {
    let id = match row.get("id") {
        Some(Some(RawValue::Integer(id))) => *id,
        _ => return Err(ParserError::missing_id(&table.name, row_number)),
    };

    let mut record = Record::new(&table.name, id);
    for (name, raw) in row.into_iter().filter(|(name, _)| name != "id") {
        let column_type = table.column(&name).map(|c| c.column_type);
        record.set(name, typed_value(raw, column_type));
    }
    Ok(record)
}

impl Snapshot {
    /// Builds a store holding every declared table of `schema`.
    ///
    /// # Errors
    ///
    /// Fails on tables the schema does not declare, rows without an integer
    /// id, and duplicate ids.
    pub fn into_store(self, schema: &DeclaredSchema) -> Result<MemoryStore> {
        let mut store = MemoryStore::new();
        store.set_version(self.schema_version);
        for table in schema.table_names() {
            store.declare_table(table);
        }

        for (name, rows) in self.tables {
            let table = schema
                .table(&name)
                .ok_or_else(|| ParserError::UnknownTable(name.clone()))?;
            for (index, row) in rows.into_iter().enumerate() {
                store.insert(record(table, index + 1, row)?)?;
            }
        }
        Ok(store)
    }
}

/// Parse a snapshot in the given format.
pub fn parse_snapshot(
    content: &str,
    format: FileFormat,
    schema: &DeclaredSchema,
) -> Result<MemoryStore> {
    let snapshot: Snapshot = from_format(content, format)?;
    snapshot.into_store(schema)
}

/// Parse a snapshot from a YAML string.
pub fn parse_snapshot_yaml(content: &str, schema: &DeclaredSchema) -> Result<MemoryStore> {
    parse_snapshot(content, FileFormat::Yaml, schema)
}

/// Parse a snapshot from a TOML string.
pub fn parse_snapshot_toml(content: &str, schema: &DeclaredSchema) -> Result<MemoryStore> {
    parse_snapshot(content, FileFormat::Toml, schema)
}

/// Parse a snapshot from a JSON string.
pub fn parse_snapshot_json(content: &str, schema: &DeclaredSchema) -> Result<MemoryStore> {
    parse_snapshot(content, FileFormat::Json, schema)
}

/// Load a snapshot file with automatic format detection.
///
/// # Example
///
/// ```no_run
/// use modelcheck_checks::model::declared_schema;
/// use modelcheck_parser::load_snapshot;
/// use std::path::Path;
///
/// let store = load_snapshot(Path::new("polder.yml"), &declared_schema()).unwrap();
/// println!("channels: {}", store.row_count("channel"));
/// ```
pub fn load_snapshot(path: &Path, schema: &DeclaredSchema) -> Result<MemoryStore> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_snapshot(&content, format, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcheck_core::{
        ColumnBuilder, GeometryType, Query, SchemaBuilder, Store, TableBuilder,
    };
    use pretty_assertions::assert_eq;

    fn schema() -> DeclaredSchema {
        SchemaBuilder::new(3)
            .table(
                TableBuilder::new("cross_section_definition")
                    .column(ColumnBuilder::new("shape", ColumnType::Integer))
                    .column(ColumnBuilder::new("width", ColumnType::Text))
                    .build(),
            )
            .table(
                TableBuilder::new("connection_node")
                    .column(ColumnBuilder::new("the_geom", ColumnType::Geometry(GeometryType::Point)))
                    .column(ColumnBuilder::new("storage_area", ColumnType::Real))
                    .column(ColumnBuilder::new("is_manhole", ColumnType::Boolean))
                    .build(),
            )
            .build()
    }

    fn rows(store: &MemoryStore, table: &str) -> Vec<Record> {
        store.select(&Query::new(table)).unwrap()
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(typed_value(None, Some(ColumnType::Integer)), Value::Null);
        assert_eq!(
            typed_value(Some(RawValue::Bool(true)), Some(ColumnType::Boolean)),
            Value::Integer(1)
        );
        assert_eq!(
            typed_value(Some(RawValue::Real(2.0)), Some(ColumnType::Text)),
            Value::Text("2".to_string())
        );
        assert_eq!(
            typed_value(Some(RawValue::Real(0.5)), Some(ColumnType::Text)),
            Value::Text("0.5".to_string())
        );
        assert_eq!(
            typed_value(Some(RawValue::Integer(4)), Some(ColumnType::Real)),
            Value::Integer(4)
        );
        assert_eq!(
            typed_value(Some(RawValue::Text("x".to_string())), None),
            Value::Text("x".to_string())
        );
    }

    #[test]
    fn test_malformed_wkt_is_kept_as_text() {
        let value = typed_value(
            Some(RawValue::Text("POINT (0".to_string())),
            Some(ColumnType::Geometry(GeometryType::Point)),
        );
        assert_eq!(value, Value::Text("POINT (0".to_string()));
    }

    #[test]
    fn test_parse_yaml_snapshot() {
        let yaml = r#"
schema_version: 3
tables:
  connection_node:
    - id: 2
      the_geom: POINT (1 2)
      storage_area: 3
      is_manhole: false
    - id: 1
      the_geom: POINT (0 0)
      storage_area: ~
"#;
        let store = parse_snapshot_yaml(yaml, &schema()).unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(3));

        let nodes = rows(&store, "connection_node");
        assert_eq!(nodes.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(nodes[0].get("storage_area"), &Value::Null);
        assert_eq!(nodes[1].real("storage_area"), Some(3.0));
        assert_eq!(nodes[1].integer("is_manhole"), Some(0));
        assert_eq!(
            nodes[1].geometry("the_geom").and_then(|g| g.as_point()),
            Some(modelcheck_core::Coord::new(1.0, 2.0))
        );

        // declared tables are present even without rows
        assert!(store.has_table("cross_section_definition"));
        assert_eq!(store.row_count("cross_section_definition"), 0);
    }

    #[test]
    fn test_parse_toml_snapshot() {
        let toml = r#"
schema_version = 3

[[tables.cross_section_definition]]
id = 1
shape = 6
width = "0 1 2"

[[tables.cross_section_definition]]
id = 2
shape = 0
width = 2.5
"#;
        let store = parse_snapshot_toml(toml, &schema()).unwrap();
        let definitions = rows(&store, "cross_section_definition");
        assert_eq!(definitions[0].text("width"), Some("0 1 2"));
        assert_eq!(definitions[1].text("width"), Some("2.5"));
    }

    #[test]
    fn test_parse_json_snapshot() {
        let json = r#"{
            "schema_version": 3,
            "tables": {
                "connection_node": [{"id": 1, "the_geom": "POINT (0 0)", "storage_area": 1.5}]
            }
        }"#;
        let store = parse_snapshot_json(json, &schema()).unwrap();
        assert_eq!(rows(&store, "connection_node")[0].real("storage_area"), Some(1.5));
    }

    #[test]
    fn test_missing_version() {
        let store = parse_snapshot_yaml("tables: {}", &schema()).unwrap();
        assert_eq!(store.schema_version().unwrap(), None);
    }

    #[test]
    fn test_unknown_table() {
        let yaml = "tables:\n  v2_channel:\n    - id: 1\n";
        assert!(matches!(
            parse_snapshot_yaml(yaml, &schema()),
            Err(ParserError::UnknownTable(table)) if table == "v2_channel"
        ));
    }

    #[test]
    fn test_missing_id() {
        let yaml = "tables:\n  connection_node:\n    - id: 1\n    - storage_area: 2\n";
        assert!(matches!(
            parse_snapshot_yaml(yaml, &schema()),
            Err(ParserError::MissingId { row: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let yaml = "tables:\n  connection_node:\n    - id: 1\n    - id: 1\n";
        assert!(matches!(
            parse_snapshot_yaml(yaml, &schema()),
            Err(ParserError::StoreError(_))
        ));
    }
}
