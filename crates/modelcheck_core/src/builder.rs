//! Builder pattern for declaring schemas.
//!
//! This module provides ergonomic builders for constructing declared schemas
//! with a fluent API.

use crate::{ColumnDef, ColumnType, DeclaredSchema, ForeignKey, TableDef};

/// Builder for a [`DeclaredSchema`].
///
/// # Example
///
/// ```rust
/// use modelcheck_core::{ColumnBuilder, ColumnType, SchemaBuilder, TableBuilder};
///
/// let schema = SchemaBuilder::new(219)
///     .srid(28992)
///     .table(
///         TableBuilder::new("channel")
///             .column(ColumnBuilder::new("code", ColumnType::Text).unique())
///             .build(),
///     )
///     .build();
///
/// assert_eq!(schema.version, 219);
/// assert_eq!(schema.srid, Some(28992));
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    version: u32,
    srid: Option<u32>,
    tables: Vec<TableDef>,
}

impl SchemaBuilder {
    /// Creates a builder for the given structural version.
    pub fn new(version: u32) -> Self {
        Self {
            version,
            srid: None,
            tables: Vec::new(),
        }
    }

    /// Sets the spatial reference of geometry columns.
    pub fn srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    /// Adds a table.
    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    /// Builds the schema.
    pub fn build(self) -> DeclaredSchema {
        DeclaredSchema {
            version: self.version,
            srid: self.srid,
            tables: self.tables,
        }
    }
}

/// Builder for a [`TableDef`].
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDef>,
}

impl TableBuilder {
    /// Creates a builder for a table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn column(mut self, column: impl Into<ColumnDef>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Builds the table definition.
    pub fn build(self) -> TableDef {
        TableDef {
            name: self.name,
            columns: self.columns,
        }
    }
}

/// Builder for a [`ColumnDef`].
#[derive(Debug)]
pub struct ColumnBuilder {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    unique: bool,
    references: Option<ForeignKey>,
    enumerants: Option<Vec<i64>>,
}

impl ColumnBuilder {
    /// Creates a nullable column of the given type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            unique: false,
            references: None,
            enumerants: None,
        }
    }

    /// Disallows null values.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Requires non-null values to be unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Declares a foreign key.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Restricts values to a set of integer codes.
    pub fn enumerants(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.enumerants = Some(values.into_iter().collect());
        self
    }

    /// Builds the column definition.
    pub fn build(self) -> ColumnDef {
        ColumnDef {
            name: self.name,
            column_type: self.column_type,
            nullable: self.nullable,
            unique: self.unique,
            references: self.references,
            enumerants: self.enumerants,
        }
    }
}

impl From<ColumnBuilder> for ColumnDef {
    fn from(builder: ColumnBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder_defaults() {
        let column = ColumnBuilder::new("code", ColumnType::Text).build();
        assert!(column.nullable);
        assert!(!column.unique);
        assert!(column.references.is_none());
        assert!(column.enumerants.is_none());
    }

    #[test]
    fn test_column_builder_full() {
        let column = ColumnBuilder::new("shape", ColumnType::Integer)
            .not_null()
            .enumerants([0, 1, 2])
            .build();
        assert!(!column.nullable);
        assert_eq!(column.enumerants, Some(vec![0, 1, 2]));
    }
}
