//! The check registry.
//!
//! A [`Registry`] is built once from a declared schema and holds every check
//! ordered by error code. Violations are produced lazily: a check is only
//! evaluated when iteration reaches it, so callers that stop early pay
//! nothing for the remaining checks.

use crate::catalogue::{declared_checks, raster_checks};
use crate::factories::generate_checks;
use crate::raster::RasterInterface;
use crate::{Check, CheckerError};
use modelcheck_core::{CheckerConfig, DeclaredSchema, Level, Record, Store, Thresholds};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An ordered collection of checks with unique error codes.
#[derive(Debug)]
pub struct Registry {
    checks: Vec<Box<dyn Check>>,
}

impl Registry {
    /// Builds the full catalogue for a schema: hand-declared checks followed
    /// by the generated ones.
    pub fn build(schema: &DeclaredSchema, thresholds: &Thresholds) -> Result<Self, CheckerError> {
        Self::builder(schema).thresholds(*thresholds).build()
    }

    /// Starts a builder for a schema.
    pub fn builder(schema: &DeclaredSchema) -> RegistryBuilder<'_> {
        RegistryBuilder::new(schema)
    }

    /// Creates a registry from an explicit list of checks.
    ///
    /// Checks are sorted by error code; a code used twice is an error.
    pub fn from_checks(mut checks: Vec<Box<dyn Check>>) -> Result<Self, CheckerError> {
        checks.sort_by_key(|c| c.error_code());
        if let Some(pair) = checks
            .windows(2)
            .find(|w| w[0].error_code() == w[1].error_code())
        {
            return Err(CheckerError::DuplicateErrorCode {
                code: pair[0].error_code(),
            });
        }
        Ok(Self { checks })
    }

    /// All checks, ordered by error code.
    pub fn all(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(AsRef::as_ref)
    }

    /// Checks whose level is at or above `level`.
    pub fn checks(&self, level: Level) -> impl Iterator<Item = &dyn Check> {
        self.all().filter(move |c| c.level() >= level)
    }

    /// Looks up a check by error code.
    pub fn get(&self, code: u32) -> Option<&dyn Check> {
        self.checks
            .binary_search_by_key(&code, |c| c.error_code())
            .ok()
            .map(|i| self.checks[i].as_ref())
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns true if no check is registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Lazily evaluates the checks selected by `config` against `store`.
    pub fn errors<'a>(&'a self, store: &'a dyn Store, config: &'a CheckerConfig) -> Violations<'a> {
        Violations {
            checks: self.checks.iter(),
            store,
            config,
            current: None,
            failed: false,
        }
    }
}

/// Builder for a [`Registry`] with optional collaborators.
#[derive(Debug)]
pub struct RegistryBuilder<'s> {
    schema: &'s DeclaredSchema,
    thresholds: Thresholds,
    raster: Option<Arc<dyn RasterInterface>>,
    extra: Vec<Box<dyn Check>>,
}

impl<'s> RegistryBuilder<'s> {
    /// Creates a new builder with default thresholds and no raster access.
    pub fn new(schema: &'s DeclaredSchema) -> Self {
        Self {
            schema,
            thresholds: Thresholds::default(),
            raster: None,
            extra: Vec::new(),
        }
    }

    /// Sets the thresholds used by size and distance checks.
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Enables the raster checks.
    pub fn raster(mut self, raster: Arc<dyn RasterInterface>) -> Self {
        self.raster = Some(raster);
        self
    }

    /// Adds a custom check.
    pub fn check(mut self, check: Box<dyn Check>) -> Self {
        self.extra.push(check);
        self
    }

    /// Builds the registry.
    pub fn build(self) -> Result<Registry, CheckerError> {
        let mut checks = declared_checks(self.schema, &self.thresholds)?;
        if let Some(raster) = self.raster {
            checks.extend(raster_checks(self.schema, raster)?);
        }
        checks.extend(generate_checks(self.schema)?);
        checks.extend(self.extra);
        Registry::from_checks(checks)
    }
}

/// A record violating a check.
#[derive(Debug, Clone)]
pub struct Violation<'a> {
    /// The violated check
    pub check: &'a dyn Check,
    /// The offending record
    pub record: Record,
}

impl Violation<'_> {
    /// Error code of the violated check.
    pub fn error_code(&self) -> u32 {
        self.check.error_code()
    }

    /// Severity of the violated check.
    pub fn level(&self) -> Level {
        self.check.level()
    }

    /// Description of the violated check.
    pub fn description(&self) -> String {
        self.check.description()
    }
}

impl fmt::Display for Violation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {}",
            self.record,
            self.check.error_code(),
            self.check.description()
        )
    }
}

/// Lazy iterator over violations, in check order then record id.
///
/// A store failure is yielded once, after which the iterator is exhausted.
pub struct Violations<'a> {
    checks: std::slice::Iter<'a, Box<dyn Check>>,
    store: &'a dyn Store,
    config: &'a CheckerConfig,
    current: Option<(&'a dyn Check, std::vec::IntoIter<Record>)>,
    failed: bool,
}

impl<'a> Iterator for Violations<'a> {
    type Item = Result<Violation<'a>, CheckerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some((check, records)) = &mut self.current {
                if let Some(record) = records.next() {
                    return Some(Ok(Violation {
                        check: *check,
                        record,
                    }));
                }
                self.current = None;
            }

            let check = self.checks.next()?.as_ref();
            let code = check.error_code();
            if self.config.is_ignored(code) || !self.config.reports(check.level()) {
                continue;
            }
            debug!(code, column = %check.column(), "running check");
            match check.evaluate(self.store) {
                Ok(mut records) => {
                    records.sort_by_key(|r| r.id);
                    self.current = Some((check, records.into_iter()));
                }
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckBase, NotNullCheck, QueryCheck};
    use modelcheck_core::{ColumnRef, ColumnType, MemoryStore, Predicate, Query};
    use pretty_assertions::assert_eq;

    fn not_null(code: u32, column: &str) -> Box<dyn Check> {
        Box::new(NotNullCheck::new(CheckBase::new(
            code,
            ColumnRef::new("channel", column, ColumnType::Text),
        )))
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .extend([
                Record::new("channel", 3).with("code", "c"),
                Record::new("channel", 1),
                Record::new("channel", 2).with("code", "b"),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_from_checks_sorts_by_code() {
        let registry =
            Registry::from_checks(vec![not_null(7, "code"), not_null(3, "display_name")]).unwrap();
        let codes: Vec<u32> = registry.all().map(|c| c.error_code()).collect();
        assert_eq!(codes, vec![3, 7]);
        assert_eq!(registry.get(7).map(|c| c.error_code()), Some(7));
        assert!(registry.get(5).is_none());
    }

    #[test]
    fn test_duplicate_codes_are_rejected() {
        let err = Registry::from_checks(vec![not_null(7, "code"), not_null(7, "display_name")])
            .unwrap_err();
        assert_eq!(err, CheckerError::DuplicateErrorCode { code: 7 });
    }

    #[test]
    fn test_level_filter() {
        let warning: Box<dyn Check> = Box::new(NotNullCheck::new(
            CheckBase::new(2, ColumnRef::new("channel", "code", ColumnType::Text))
                .with_level(Level::Warning),
        ));
        let registry = Registry::from_checks(vec![not_null(1, "display_name"), warning]).unwrap();
        assert_eq!(registry.checks(Level::Info).count(), 2);
        assert_eq!(registry.checks(Level::Warning).count(), 2);
        assert_eq!(registry.checks(Level::Error).count(), 1);
    }

    #[test]
    fn test_violations_are_ordered_by_record_id() {
        let registry = Registry::from_checks(vec![not_null(1, "display_name")]).unwrap();
        let store = store();
        let config = CheckerConfig::new();
        let ids: Vec<i64> = registry
            .errors(&store, &config)
            .map(|v| v.unwrap().record.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_ignored_codes_are_skipped() {
        let registry =
            Registry::from_checks(vec![not_null(1, "display_name"), not_null(2, "code")]).unwrap();
        let store = store();
        let config = CheckerConfig::new().with_ignored_code(1);
        let found: Vec<(u32, i64)> = registry
            .errors(&store, &config)
            .map(|v| v.unwrap())
            .map(|v| (v.error_code(), v.record.id))
            .collect();
        assert_eq!(found, vec![(2, 1)]);
    }

    #[test]
    fn test_store_failure_is_yielded_once() {
        let broken: Box<dyn Check> = Box::new(QueryCheck::new(
            CheckBase::new(1, ColumnRef::new("channel", "id", ColumnType::Integer)),
            Query::new("missing_table").filter(Predicate::not_null("id")),
        ));
        let registry = Registry::from_checks(vec![broken, not_null(2, "display_name")]).unwrap();
        let store = store();
        let config = CheckerConfig::new();
        let results: Vec<_> = registry.errors(&store, &config).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(CheckerError::Store(_))));
    }

    #[test]
    fn test_violation_display() {
        let registry = Registry::from_checks(vec![not_null(1, "display_name")]).unwrap();
        let store = store();
        let config = CheckerConfig::new();
        let first = registry.errors(&store, &config).next().unwrap().unwrap();
        assert_eq!(
            first.to_string(),
            "channel 1: [1] channel.display_name cannot be null"
        );
    }
}
