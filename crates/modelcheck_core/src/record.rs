//! Records and column references.

use crate::{Geometry, GeometryType, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static NULL: Value = Value::Null;

/// One row of a declared table.
///
/// Records are read-only snapshots: checks never mutate them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Owning table
    pub table: String,
    /// Stable integer identifier
    pub id: i64,
    /// Column values by name; missing columns read as null
    pub values: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new(table: impl Into<String>, id: i64) -> Self {
        Self {
            table: table.into(),
            id,
            values: BTreeMap::new(),
        }
    }

    /// Sets a column value, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Sets a column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// Returns the value of a column. The `id` column is always available.
    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&NULL)
    }

    /// Returns the value of a column as an owned value, resolving `id`.
    pub fn value(&self, column: &str) -> Value {
        if column == "id" {
            return Value::Integer(self.id);
        }
        self.get(column).clone()
    }

    /// Returns a text column, treating null as `None`.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).as_text()
    }

    /// Returns a numeric column as float.
    pub fn real(&self, column: &str) -> Option<f64> {
        self.get(column).as_f64()
    }

    /// Returns an integer column, resolving `id`.
    pub fn integer(&self, column: &str) -> Option<i64> {
        if column == "id" {
            return Some(self.id);
        }
        self.get(column).as_i64()
    }

    /// Returns a geometry column.
    pub fn geometry(&self, column: &str) -> Option<&Geometry> {
        self.get(column).as_geometry()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.table, self.id)
    }
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer column
    Integer,
    /// Floating point column; integers are accepted
    Real,
    /// Text column
    Text,
    /// Boolean column stored as integer 0/1
    Boolean,
    /// Spatial column with a fixed geometry type
    Geometry(GeometryType),
}

impl ColumnType {
    /// Returns true if the stored value matches this declared type.
    ///
    /// Null values always match: nullability is a separate concern.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Integer, Value::Integer(_)) => true,
            (ColumnType::Real, Value::Integer(_) | Value::Real(_)) => true,
            (ColumnType::Text, Value::Text(_)) => true,
            (ColumnType::Boolean, Value::Integer(i)) => *i == 0 || *i == 1,
            (ColumnType::Geometry(_), Value::Geometry(_)) => true,
            _ => false,
        }
    }

    /// Returns the geometry type for spatial columns.
    pub fn geometry_type(&self) -> Option<GeometryType> {
        match self {
            ColumnType::Geometry(g) => Some(*g),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Real => write!(f, "real"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Geometry(g) => write!(f, "geometry({g})"),
        }
    }
}

/// Identifies a (table, column, declared type) triple.
///
/// Used both to select what a check queries and, in reports, to explain which
/// field is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Owning table
    pub table: String,
    /// Column name
    pub name: String,
    /// Declared type
    pub column_type: ColumnType,
}

impl ColumnRef {
    /// Creates a new column reference.
    pub fn new(table: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            column_type,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_reads_null() {
        let record = Record::new("channel", 1).with("code", "a");
        assert_eq!(record.get("code"), &Value::from("a"));
        assert!(record.get("missing").is_null());
        assert_eq!(record.integer("id"), Some(1));
        assert_eq!(record.value("id"), Value::Integer(1));
    }

    #[test]
    fn test_declared_type_acceptance() {
        assert!(ColumnType::Real.accepts(&Value::Integer(1)));
        assert!(!ColumnType::Integer.accepts(&Value::Real(1.5)));
        assert!(!ColumnType::Integer.accepts(&Value::from("1")));
        assert!(ColumnType::Boolean.accepts(&Value::Integer(0)));
        assert!(!ColumnType::Boolean.accepts(&Value::Integer(2)));
        assert!(ColumnType::Text.accepts(&Value::Null));
    }

    #[test]
    fn test_display() {
        let column = ColumnRef::new("channel", "code", ColumnType::Text);
        assert_eq!(column.to_string(), "channel.code");
        assert_eq!(Record::new("channel", 3).to_string(), "channel 3");
        assert_eq!(
            ColumnType::Geometry(GeometryType::Point).to_string(),
            "geometry(POINT)"
        );
    }
}
