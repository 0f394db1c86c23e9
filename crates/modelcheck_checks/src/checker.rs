//! Checker entry point.

use crate::raster::RasterInterface;
use crate::{CheckerError, Registry, Violations};
use modelcheck_core::{CheckerConfig, DeclaredSchema, Store};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Verifies that a store matches a declared schema.
///
/// The store must report the declared schema version and hold every declared
/// table.
pub fn verify_store(store: &dyn Store, schema: &DeclaredSchema) -> Result<(), CheckerError> {
    let found = store.schema_version()?;
    if found != Some(schema.version) {
        warn!(expected = schema.version, ?found, "schema version mismatch");
        return Err(CheckerError::version_mismatch(schema.version, found));
    }
    if let Some(table) = schema.table_names().find(|t| !store.has_table(t)) {
        warn!(table, "declared table missing from store");
        return Err(CheckerError::missing_table(table));
    }
    Ok(())
}

/// Runs the catalogue of a schema against a store.
///
/// # Example
///
/// ```rust
/// use modelcheck_checks::{model, ModelChecker};
/// use modelcheck_core::{CheckerConfig, MemoryStore};
///
/// let schema = model::declared_schema();
/// let mut store = MemoryStore::new().with_version(schema.version);
/// for table in schema.table_names() {
///     store.declare_table(table);
/// }
///
/// let checker = ModelChecker::new(&store, &schema, CheckerConfig::new()).unwrap();
/// assert_eq!(checker.errors().count(), 0);
/// ```
pub struct ModelChecker<'a> {
    store: &'a dyn Store,
    registry: Registry,
    config: CheckerConfig,
}

impl<'a> ModelChecker<'a> {
    /// Creates a checker with the full catalogue, after verifying the store.
    pub fn new(
        store: &'a dyn Store,
        schema: &DeclaredSchema,
        config: CheckerConfig,
    ) -> Result<Self, CheckerError> {
        verify_store(store, schema)?;
        let registry = Registry::build(schema, &config.thresholds)?;
        Ok(Self::with_registry(store, registry, config))
    }

    /// Creates a checker that also runs the raster checks.
    pub fn with_raster(
        store: &'a dyn Store,
        schema: &DeclaredSchema,
        config: CheckerConfig,
        raster: Arc<dyn RasterInterface>,
    ) -> Result<Self, CheckerError> {
        verify_store(store, schema)?;
        let registry = Registry::builder(schema)
            .thresholds(config.thresholds)
            .raster(raster)
            .build()?;
        Ok(Self::with_registry(store, registry, config))
    }

    /// Creates a checker around a prepared registry. The store is not verified.
    pub fn with_registry(store: &'a dyn Store, registry: Registry, config: CheckerConfig) -> Self {
        info!(
            checks = registry.len(),
            min_level = %config.min_level,
            ignored = config.ignored_codes.len(),
            "model checker ready"
        );
        Self {
            store,
            registry,
            config,
        }
    }

    /// Lazily yields the violations at or above the configured level.
    pub fn errors(&self) -> Violations<'_> {
        self.registry.errors(self.store, &self.config)
    }

    /// The checks this checker runs.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Level filter, ignored codes and thresholds in use.
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }
}

impl fmt::Debug for ModelChecker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelChecker")
            .field("checks", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
