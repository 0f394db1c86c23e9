//! The check contract.
//!
//! A [`Check`] is an immutable rule: it knows its severity, its stable error
//! code and how to describe itself, and it produces the records that violate
//! it. Checks never mutate the store and can be evaluated any number of times.
//!
//! Concrete checks hold a [`CheckBase`], which carries the shared metadata
//! and the query selecting the records a check examines.

use modelcheck_core::{ColumnRef, Level, Predicate, Query, Record, Store, StoreResult};
use std::fmt;

/// A validation rule over a store.
pub trait Check: Send + Sync + fmt::Debug {
    /// Shared metadata and record selection.
    fn base(&self) -> &CheckBase;

    /// Severity of a violation.
    fn level(&self) -> Level {
        self.base().level
    }

    /// Stable, globally unique error code.
    fn error_code(&self) -> u32 {
        self.base().error_code
    }

    /// The column a violation is reported on.
    fn column(&self) -> &ColumnRef {
        &self.base().column
    }

    /// Human readable message, including interpolated parameters.
    fn description(&self) -> String {
        match &self.base().message {
            Some(message) => message.clone(),
            None => self.default_description(),
        }
    }

    /// Message used when no explicit message was configured.
    fn default_description(&self) -> String;

    /// Returns the violating records, ordered by id.
    ///
    /// A store without rows in the relevant tables yields no violations.
    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>>;
}

/// Metadata and record selection shared by all checks.
///
/// The selection is a base query over the column's table, optionally
/// narrowed by an extra predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckBase {
    /// Column the check reports on
    pub column: ColumnRef,

    /// Severity
    pub level: Level,

    /// Stable error code
    pub error_code: u32,

    /// Narrows the examined records
    pub filter: Option<Predicate>,

    /// Overrides the generated description
    pub message: Option<String>,
}

impl CheckBase {
    /// Creates an ERROR-level base without filter.
    pub fn new(error_code: u32, column: ColumnRef) -> Self {
        Self {
            column,
            level: Level::Error,
            error_code,
            filter: None,
            message: None,
        }
    }

    /// Sets the severity.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Narrows the examined records; filters are AND-combined.
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Sets a fixed message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Name of the table the check examines.
    pub fn table(&self) -> &str {
        &self.column.table
    }

    /// Name of the examined column.
    pub fn column_name(&self) -> &str {
        &self.column.name
    }

    /// The records this check examines.
    pub fn to_check(&self) -> Query {
        Query::new(&self.column.table).filter_opt(self.filter.clone())
    }

    /// The examined records narrowed by an additional predicate.
    pub fn to_check_where(&self, predicate: Predicate) -> Query {
        self.to_check().filter(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcheck_core::ColumnType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_check_combines_filters() {
        let base = CheckBase::new(1, ColumnRef::new("channel", "code", ColumnType::Text))
            .with_filter(Predicate::eq("calculation_type", 102))
            .with_filter(Predicate::not_null("code"));
        assert_eq!(
            base.to_check().to_string(),
            "SELECT * FROM channel WHERE (calculation_type = 102 AND code IS NOT NULL)"
        );
        assert_eq!(base.level, Level::Error);
    }

    #[test]
    fn test_to_check_without_filter() {
        let base = CheckBase::new(1, ColumnRef::new("pipe", "code", ColumnType::Text));
        assert_eq!(base.to_check(), Query::new("pipe"));
    }
}
