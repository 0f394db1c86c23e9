//! Declared schema types.
//!
//! The declared schema is the checker's view of the tables a schematisation
//! must contain. Generic checks are generated from it, and it pins the
//! structural version a store has to report before any check may run.

use crate::{ColumnRef, ColumnType};
use serde::{Deserialize, Serialize};

fn default_nullable() -> bool {
    true
}

/// The complete declared schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredSchema {
    /// Structural version the store must report
    pub version: u32,

    /// Spatial reference of all geometry columns, if known up front.
    /// When absent, spatial checks take it from the model itself.
    #[serde(default)]
    pub srid: Option<u32>,

    /// Declared tables, in catalogue order
    pub tables: Vec<TableDef>,
}

/// A declared table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name
    pub name: String,

    /// Declared columns; `id` is implicit
    pub columns: Vec<ColumnDef>,
}

/// A declared column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether null is allowed
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Whether non-null values must be unique across the table
    #[serde(default)]
    pub unique: bool,

    /// Foreign key target
    #[serde(default)]
    pub references: Option<ForeignKey>,

    /// Allowed integer codes for enumerated columns
    #[serde(default)]
    pub enumerants: Option<Vec<i64>>,
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub column: String,
}

impl DeclaredSchema {
    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns the table names in declaration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Builds a column reference for a declared column.
    pub fn column(&self, table: &str, column: &str) -> Option<ColumnRef> {
        let table = self.table(table)?;
        table.column_ref(column)
    }

    /// Iterates over every (table, column) pair in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&TableDef, &ColumnDef)> {
        self.tables
            .iter()
            .flat_map(|t| t.columns.iter().map(move |c| (t, c)))
    }

    /// Returns every column holding a foreign key to `table.column`.
    pub fn references_to(&self, table: &str, column: &str) -> Vec<ColumnRef> {
        self.columns()
            .filter(|(_, c)| {
                c.references
                    .as_ref()
                    .is_some_and(|fk| fk.table == table && fk.column == column)
            })
            .map(|(t, c)| ColumnRef::new(&t.name, &c.name, c.column_type))
            .collect()
    }
}

impl TableDef {
    /// Looks up a column definition.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Builds a column reference; `id` resolves to the implicit key.
    pub fn column_ref(&self, name: &str) -> Option<ColumnRef> {
        if name == "id" {
            return Some(ColumnRef::new(&self.name, "id", ColumnType::Integer));
        }
        self.column(name)
            .map(|c| ColumnRef::new(&self.name, &c.name, c.column_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnBuilder, GeometryType, SchemaBuilder, TableBuilder};

    fn schema() -> DeclaredSchema {
        SchemaBuilder::new(3)
            .table(
                TableBuilder::new("connection_node")
                    .column(
                        ColumnBuilder::new("the_geom", ColumnType::Geometry(GeometryType::Point))
                            .not_null(),
                    )
                    .build(),
            )
            .table(
                TableBuilder::new("channel")
                    .column(
                        ColumnBuilder::new("connection_node_start_id", ColumnType::Integer)
                            .references("connection_node", "id"),
                    )
                    .column(
                        ColumnBuilder::new("connection_node_end_id", ColumnType::Integer)
                            .references("connection_node", "id"),
                    )
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_lookup() {
        let schema = schema();
        assert_eq!(schema.srid, None);
        assert!(schema.table("channel").is_some());
        assert_eq!(
            schema.column("channel", "id").unwrap().column_type,
            ColumnType::Integer
        );
        assert!(schema.column("channel", "missing").is_none());
    }

    #[test]
    fn test_references_to() {
        let refs = schema().references_to("connection_node", "id");
        let names: Vec<String> = refs.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "channel.connection_node_start_id",
                "channel.connection_node_end_id"
            ]
        );
    }
}
