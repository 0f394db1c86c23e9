//! Store abstraction.
//!
//! The checker only ever reads. A [`Store`] answers filtered selections over
//! declared tables and reports its structural schema version. The in-memory
//! [`MemoryStore`] evaluates predicates in process and backs both the tests and
//! the snapshot loader.

use crate::{Query, Record, StoreError, StoreResult};
use std::collections::BTreeMap;

/// Read-only access to the rows of a schematisation.
pub trait Store: Send + Sync {
    /// Returns the rows of `query.table` for which `query.filter` is true,
    /// ordered by record id.
    fn select(&self, query: &Query) -> StoreResult<Vec<Record>>;

    /// Returns true if the table exists in the store.
    fn has_table(&self, table: &str) -> bool;

    /// Structural schema version of the store, if recorded.
    fn schema_version(&self) -> StoreResult<Option<u32>>;
}

/// In-memory store keyed by table name.
///
/// # Example
///
/// ```rust
/// use modelcheck_core::{MemoryStore, Predicate, Query, Record, Store};
///
/// let mut store = MemoryStore::new();
/// store.declare_table("channel");
/// store.insert(Record::new("channel", 1).with("code", "a")).unwrap();
/// store.insert(Record::new("channel", 2)).unwrap();
///
/// let rows = store
///     .select(&Query::new("channel").filter(Predicate::not_null("code")))
///     .unwrap();
/// assert_eq!(rows.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    version: Option<u32>,
    tables: BTreeMap<String, BTreeMap<i64, Record>>,
}

impl MemoryStore {
    /// Creates an empty store without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recorded schema version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the recorded schema version.
    pub fn set_version(&mut self, version: Option<u32>) {
        self.version = version;
    }

    /// Declares an (empty) table. Declaring an existing table is a no-op.
    pub fn declare_table(&mut self, table: impl Into<String>) {
        self.tables.entry(table.into()).or_default();
    }

    /// Inserts a record, declaring its table when needed.
    pub fn insert(&mut self, record: Record) -> StoreResult<()> {
        let table = self.tables.entry(record.table.clone()).or_default();
        if table.contains_key(&record.id) {
            return Err(StoreError::DuplicateId {
                table: record.table,
                id: record.id,
            });
        }
        table.insert(record.id, record);
        Ok(())
    }

    /// Inserts many records.
    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) -> StoreResult<()> {
        records.into_iter().try_for_each(|r| self.insert(r))
    }

    /// Returns the declared table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Returns the number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, BTreeMap::len)
    }
}

impl Store for MemoryStore {
    fn select(&self, query: &Query) -> StoreResult<Vec<Record>> {
        let rows = self
            .tables
            .get(&query.table)
            .ok_or_else(|| StoreError::unknown_table(&query.table))?;

        match &query.filter {
            None => Ok(rows.values().cloned().collect()),
            Some(filter) => {
                let resolved = filter.resolve(self)?;
                Ok(rows
                    .values()
                    .filter(|r| resolved.matches(r))
                    .cloned()
                    .collect())
            }
        }
    }

    fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn schema_version(&self) -> StoreResult<Option<u32>> {
        Ok(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Predicate, Value};
    use pretty_assertions::assert_eq;

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn sample_store() -> MemoryStore {
        let mut store = MemoryStore::new().with_version(1);
        store
            .extend([
                Record::new("channel", 1).with("calculation_type", 102),
                Record::new("channel", 2).with("calculation_type", 101),
                Record::new("location", 10).with("channel_id", 1),
                Record::new("location", 11).with("channel_id", 2),
                Record::new("location", 12).with("channel_id", Value::Null),
                Record::new("location", 13).with("channel_id", 99),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        let store = MemoryStore::new();
        assert_eq!(
            store.select(&Query::new("missing")),
            Err(StoreError::UnknownTable("missing".to_string()))
        );
    }

    #[test]
    fn test_empty_table_selects_nothing() {
        let mut store = MemoryStore::new();
        store.declare_table("channel");
        assert!(store.select(&Query::new("channel")).unwrap().is_empty());
    }

    #[test]
    fn test_rows_are_ordered_by_id() {
        let mut store = MemoryStore::new();
        store
            .extend([Record::new("t", 3), Record::new("t", 1), Record::new("t", 2)])
            .unwrap();
        assert_eq!(ids(&store.select(&Query::new("t")).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = MemoryStore::new();
        store.insert(Record::new("t", 1)).unwrap();
        assert!(matches!(
            store.insert(Record::new("t", 1)),
            Err(StoreError::DuplicateId { id: 1, .. })
        ));
    }

    #[test]
    fn test_in_query_ignores_null_probe() {
        let store = sample_store();
        let query = Query::new("location")
            .filter(!Predicate::in_query("channel_id", Query::new("channel").select("id")));
        // 12 has a null key (unknown), 13 is a dangling reference.
        assert_eq!(ids(&store.select(&query).unwrap()), vec![13]);
    }

    #[test]
    fn test_exists_join_with_filter() {
        let store = sample_store();
        let related = Query::new("channel")
            .filter(Predicate::eq("calculation_type", 102))
            .select("id");
        let query = Query::new("location").filter(Predicate::exists("channel_id", related.clone()));
        assert_eq!(ids(&store.select(&query).unwrap()), vec![10]);

        let negated = Query::new("location").filter(!Predicate::exists("channel_id", related));
        assert_eq!(ids(&store.select(&negated).unwrap()), vec![11, 12, 13]);
    }

    #[test]
    fn test_subquery_on_unknown_table_fails() {
        let store = sample_store();
        let query = Query::new("location")
            .filter(Predicate::in_query("channel_id", Query::new("nope").select("id")));
        assert!(store.select(&query).is_err());
    }
}
