//! Generic check library.
//!
//! Reusable check kinds that apply to any declared column:
//! - Referential integrity, uniqueness and not-null
//! - Declared type and enumerant membership
//! - Geometry validity and geometry type
//! - Range and general comparisons, criterion-gated checks and raw queries

use crate::{Check, CheckBase};
use modelcheck_core::{
    CompareOp, ColumnRef, GeometryType, Predicate, Query, Record, Store, StoreResult, Value,
    ValueKey,
};
use std::collections::{HashMap, HashSet};

/// A non-null value must appear in the referenced column.
#[derive(Debug, Clone)]
pub struct ForeignKeyCheck {
    base: CheckBase,
    reference: ColumnRef,
}

impl ForeignKeyCheck {
    /// Creates a new foreign key check.
    pub fn new(base: CheckBase, reference: ColumnRef) -> Self {
        Self { base, reference }
    }

    /// The referenced column.
    pub fn reference(&self) -> &ColumnRef {
        &self.reference
    }
}

impl Check for ForeignKeyCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} refers to a non-existing {}",
            self.base.column, self.reference.table
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let referenced = Query::new(&self.reference.table).select(&self.reference.name);
        store.select(&self.base.to_check_where(
            Predicate::not_null(column).and(!Predicate::in_query(column, referenced)),
        ))
    }
}

/// Non-null values must not repeat; every row sharing a duplicate is reported.
#[derive(Debug, Clone)]
pub struct UniqueCheck {
    base: CheckBase,
}

impl UniqueCheck {
    /// Creates a new uniqueness check.
    pub fn new(base: CheckBase) -> Self {
        Self { base }
    }
}

impl Check for UniqueCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!("{} should be unique", self.base.column)
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;

        let mut counts: HashMap<ValueKey, usize> = HashMap::new();
        for key in rows.iter().filter_map(|r| r.value(column).key()) {
            *counts.entry(key).or_default() += 1;
        }

        Ok(rows
            .into_iter()
            .filter(|r| {
                r.value(column)
                    .key()
                    .is_some_and(|k| counts.get(&k).is_some_and(|n| *n > 1))
            })
            .collect())
    }
}

/// The value must not be null.
#[derive(Debug, Clone)]
pub struct NotNullCheck {
    base: CheckBase,
}

impl NotNullCheck {
    /// Creates a new not-null check.
    pub fn new(base: CheckBase) -> Self {
        Self { base }
    }
}

impl Check for NotNullCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!("{} cannot be null", self.base.column)
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        store.select(
            &self
                .base
                .to_check_where(Predicate::is_null(self.base.column_name())),
        )
    }
}

/// The stored value must match the column's declared type.
#[derive(Debug, Clone)]
pub struct TypeCheck {
    base: CheckBase,
}

impl TypeCheck {
    /// Creates a new type check.
    pub fn new(base: CheckBase) -> Self {
        Self { base }
    }
}

impl Check for TypeCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} is not of type {}",
            self.base.column, self.base.column.column_type
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let declared = self.base.column.column_type;
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        Ok(rows
            .into_iter()
            .filter(|r| !declared.accepts(r.get(column)))
            .collect())
    }
}

/// A non-null value must be one of the declared enumerants.
#[derive(Debug, Clone)]
pub struct EnumCheck {
    base: CheckBase,
    allowed: Vec<Value>,
}

impl EnumCheck {
    /// Creates a new enumerant check.
    pub fn new<V: Into<Value>>(base: CheckBase, allowed: impl IntoIterator<Item = V>) -> Self {
        Self {
            base,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Check for EnumCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        let allowed: Vec<String> = self.allowed.iter().map(ToString::to_string).collect();
        format!(
            "{} is not one of [{}]",
            self.base.column,
            allowed.join(", ")
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        store.select(&self.base.to_check_where(
            Predicate::not_null(column).and(!Predicate::is_in(column, self.allowed.clone())),
        ))
    }
}

/// A geometry value must be topologically valid.
#[derive(Debug, Clone)]
pub struct GeometryCheck {
    base: CheckBase,
}

impl GeometryCheck {
    /// Creates a new geometry validity check.
    pub fn new(base: CheckBase) -> Self {
        Self { base }
    }
}

impl Check for GeometryCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!("{} is an invalid geometry", self.base.column)
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        Ok(rows
            .into_iter()
            .filter(|r| r.geometry(column).is_some_and(|g| !g.is_valid()))
            .collect())
    }
}

/// A geometry's runtime type must equal the declared geometry type.
#[derive(Debug, Clone)]
pub struct GeometryTypeCheck {
    base: CheckBase,
    expected: GeometryType,
}

impl GeometryTypeCheck {
    /// Creates a new geometry type check.
    pub fn new(base: CheckBase, expected: GeometryType) -> Self {
        Self { base, expected }
    }
}

impl Check for GeometryTypeCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} has invalid geometry type, expected {}",
            self.base.column, self.expected
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        Ok(rows
            .into_iter()
            .filter(|r| {
                r.geometry(column)
                    .is_some_and(|g| g.geometry_type() != self.expected)
            })
            .collect())
    }
}

/// A non-null numeric value must lie within bounds (inclusive by default).
#[derive(Debug, Clone)]
pub struct RangeCheck {
    base: CheckBase,
    min: Option<f64>,
    max: Option<f64>,
    left_inclusive: bool,
    right_inclusive: bool,
}

impl RangeCheck {
    /// Creates an unbounded range check; add bounds with the setters.
    pub fn new(base: CheckBase) -> Self {
        Self {
            base,
            min: None,
            max: None,
            left_inclusive: true,
            right_inclusive: true,
        }
    }

    /// Sets the lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Excludes the lower bound itself.
    pub fn exclusive_min(mut self) -> Self {
        self.left_inclusive = false;
        self
    }

    /// Excludes the upper bound itself.
    pub fn exclusive_max(mut self) -> Self {
        self.right_inclusive = false;
        self
    }

    fn valid(&self) -> Predicate {
        let column = self.base.column_name();
        let mut parts = Vec::new();
        if let Some(min) = self.min {
            let op = if self.left_inclusive {
                CompareOp::Ge
            } else {
                CompareOp::Gt
            };
            parts.push(Predicate::compare(column, op, min));
        }
        if let Some(max) = self.max {
            let op = if self.right_inclusive {
                CompareOp::Le
            } else {
                CompareOp::Lt
            };
            parts.push(Predicate::compare(column, op, max));
        }
        Predicate::all(parts)
    }
}

impl Check for RangeCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(min) = self.min {
            let word = if self.left_inclusive {
                "greater than or equal to"
            } else {
                "greater than"
            };
            parts.push(format!("{word} {min}"));
        }
        if let Some(max) = self.max {
            let word = if self.right_inclusive {
                "less than or equal to"
            } else {
                "less than"
            };
            parts.push(format!("{word} {max}"));
        }
        format!("{} must be {}", self.base.column, parts.join(" and "))
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        store.select(
            &self
                .base
                .to_check_where(Predicate::not_null(column).and(!self.valid())),
        )
    }
}

/// Records for which a validity predicate is false are reported.
///
/// Follows three-valued logic: a record for which the predicate is unknown
/// (because of nulls) is not reported.
#[derive(Debug, Clone)]
pub struct GeneralCheck {
    base: CheckBase,
    valid: Predicate,
}

impl GeneralCheck {
    /// Creates a check from an arbitrary validity predicate.
    pub fn new(base: CheckBase, valid: Predicate) -> Self {
        Self { base, valid }
    }

    /// `column <op> value` must hold.
    pub fn compare(base: CheckBase, op: CompareOp, value: impl Into<Value>) -> Self {
        let valid = Predicate::compare(base.column_name(), op, value);
        Self::new(base, valid)
    }

    /// `column <op> other` must hold.
    pub fn compare_columns(base: CheckBase, op: CompareOp, other: impl Into<String>) -> Self {
        let valid = Predicate::compare_columns(base.column_name(), op, other);
        Self::new(base, valid)
    }
}

impl Check for GeneralCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!("{} is invalid: expected {}", self.base.column, self.valid)
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        store.select(&self.base.to_check_where(!self.valid.clone()))
    }
}

/// Runs an inner check only on records satisfying a criterion.
///
/// The inner check's violations are intersected with the records of the same
/// table for which the criterion is true. Level, code and description are
/// those of the inner check.
#[derive(Debug)]
pub struct ConditionalCheck {
    criterion: Predicate,
    inner: Box<dyn Check>,
}

impl ConditionalCheck {
    /// Creates a new conditional check.
    pub fn new(criterion: Predicate, inner: impl Check + 'static) -> Self {
        Self {
            criterion,
            inner: Box::new(inner),
        }
    }

    /// The gating criterion.
    pub fn criterion(&self) -> &Predicate {
        &self.criterion
    }
}

impl Check for ConditionalCheck {
    fn base(&self) -> &CheckBase {
        self.inner.base()
    }

    fn description(&self) -> String {
        self.inner.description()
    }

    fn default_description(&self) -> String {
        self.inner.default_description()
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let violating = self.inner.evaluate(store)?;
        if violating.is_empty() {
            return Ok(violating);
        }

        let query = Query::new(self.inner.base().table()).filter(self.criterion.clone());
        let satisfying: HashSet<i64> = store.select(&query)?.iter().map(|r| r.id).collect();
        Ok(violating
            .into_iter()
            .filter(|r| satisfying.contains(&r.id))
            .collect())
    }
}

/// Reports every record returned by a pre-built query of invalid rows.
#[derive(Debug, Clone)]
pub struct QueryCheck {
    base: CheckBase,
    invalid: Query,
}

impl QueryCheck {
    /// Creates a new query check; `invalid` selects the violating records.
    pub fn new(base: CheckBase, invalid: Query) -> Self {
        Self { base, invalid }
    }
}

impl Check for QueryCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!("{} is invalid", self.base.column)
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        store.select(&self.invalid)
    }
}

/// Reports all records when a column holds one and the same value everywhere.
///
/// Intended for INFO-level hints about unedited default values.
#[derive(Debug, Clone)]
pub struct AllEqualCheck {
    base: CheckBase,
    min_rows: usize,
}

impl AllEqualCheck {
    /// Creates a new all-equal check requiring at least two values.
    pub fn new(base: CheckBase) -> Self {
        Self { base, min_rows: 2 }
    }

    /// Sets the minimum number of non-null values before the check applies.
    pub fn min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows.max(2);
        self
    }
}

impl Check for AllEqualCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} has the same value in all records; is this correct?",
            self.base.column
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        if rows.len() < self.min_rows {
            return Ok(Vec::new());
        }

        let first = rows[0].value(column);
        let all_equal = rows
            .iter()
            .all(|r| r.value(column).compare(&first) == Some(std::cmp::Ordering::Equal));
        Ok(if all_equal { rows } else { Vec::new() })
    }
}
