//! Schema-driven check generation.
//!
//! Every declared constraint becomes a check. Generated codes live in one
//! block of a hundred per check family, numbered by the check's position in
//! its family; hand-declared checks stay below [`GENERATED_CODE_START`].
//! Codes follow column declaration order, so new columns go at the end of
//! the last table to keep existing codes stable.

use crate::{
    Check, CheckBase, CheckerError, EnumCheck, ForeignKeyCheck, GeometryCheck, GeometryTypeCheck, NotNullCheck,
    TypeCheck, UniqueCheck,
};
use modelcheck_core::{ColumnDef, ColumnRef, ColumnType, DeclaredSchema, TableDef};

/// First code reserved for generated checks.
pub const GENERATED_CODE_START: u32 = 1000;

/// Code block of not-null checks.
pub const NOT_NULL_CODES: u32 = 1000;
/// Code block of foreign key checks.
pub const FOREIGN_KEY_CODES: u32 = 1100;
/// Code block of uniqueness checks.
pub const UNIQUE_CODES: u32 = 1200;
/// Code block of declared-type checks.
pub const TYPE_CODES: u32 = 1300;
/// Code block of enumerant checks.
pub const ENUM_CODES: u32 = 1400;
/// Code block of geometry validity checks.
pub const GEOMETRY_CODES: u32 = 1500;
/// Code block of geometry type checks.
pub const GEOMETRY_TYPE_CODES: u32 = 1600;

/// Number of codes in one family block.
pub const FAMILY_SIZE: u32 = 100;

type Factory = fn(u32, &TableDef, &ColumnDef) -> Option<Box<dyn Check>>;

fn column_ref(table: &TableDef, column: &ColumnDef) -> ColumnRef {
    ColumnRef::new(&table.name, &column.name, column.column_type)
}

fn not_null(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    (!column.nullable).then(|| {
        Box::new(NotNullCheck::new(CheckBase::new(code, column_ref(table, column))))
            as Box<dyn Check>
    })
}

fn foreign_key(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    let target = column.references.as_ref()?;
    let reference = ColumnRef::new(&target.table, &target.column, ColumnType::Integer);
    Some(Box::new(ForeignKeyCheck::new(
        CheckBase::new(code, column_ref(table, column)),
        reference,
    )))
}

fn unique(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    column.unique.then(|| {
        Box::new(UniqueCheck::new(CheckBase::new(code, column_ref(table, column))))
            as Box<dyn Check>
    })
}

fn declared_type(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    Some(Box::new(TypeCheck::new(CheckBase::new(
        code,
        column_ref(table, column),
    ))))
}

fn enumerant(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    let allowed = column.enumerants.clone()?;
    Some(Box::new(EnumCheck::new(
        CheckBase::new(code, column_ref(table, column)),
        allowed,
    )))
}

fn geometry(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    column.column_type.geometry_type()?;
    Some(Box::new(GeometryCheck::new(CheckBase::new(
        code,
        column_ref(table, column),
    ))))
}

fn geometry_type(code: u32, table: &TableDef, column: &ColumnDef) -> Option<Box<dyn Check>> {
    let expected = column.column_type.geometry_type()?;
    Some(Box::new(GeometryTypeCheck::new(
        CheckBase::new(code, column_ref(table, column)),
        expected,
    )))
}

/// Generates one family of checks, numbering them from `block + 1`.
fn family(
    schema: &DeclaredSchema,
    block: u32,
    factory: Factory,
) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let mut checks = Vec::new();
    for (table, column) in schema.columns() {
        let ordinal = checks.len() as u32 + 1;
        if let Some(check) = factory(block + ordinal, table, column) {
            if ordinal >= FAMILY_SIZE {
                return Err(CheckerError::CodeBlockFull { block });
            }
            checks.push(check);
        }
    }
    Ok(checks)
}

/// Generates the not-null, foreign key, unique, type, enumerant, geometry
/// and geometry type checks of every applicable declared column.
///
/// Fails when a family has more checks than its code block holds.
pub fn generate_checks(schema: &DeclaredSchema) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let families: [(u32, Factory); 7] = [
        (NOT_NULL_CODES, not_null),
        (FOREIGN_KEY_CODES, foreign_key),
        (UNIQUE_CODES, unique),
        (TYPE_CODES, declared_type),
        (ENUM_CODES, enumerant),
        (GEOMETRY_CODES, geometry),
        (GEOMETRY_TYPE_CODES, geometry_type),
    ];

    let mut checks = Vec::new();
    for (block, factory) in families {
        checks.extend(family(schema, block, factory)?);
    }
    Ok(checks)
}
