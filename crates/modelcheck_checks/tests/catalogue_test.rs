//! Tests of the catalogue as a whole: code uniqueness, ordering and the
//! shape of the registry.

use modelcheck_checks::catalogue::{declared_checks, TIMESERIES_TABLES};
use modelcheck_checks::model::{declared_schema, MODEL_SETTINGS};
use modelcheck_checks::raster::RasterInterface;
use modelcheck_checks::{
    generate_checks, CheckBase, CheckerError, NotNullCheck, Registry, FAMILY_SIZE,
    GENERATED_CODE_START,
};
use modelcheck_core::{ColumnRef, ColumnType, Level, Thresholds};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug)]
struct NoRasters;

impl RasterInterface for NoRasters {
    fn is_valid(&self, _path: &str) -> bool {
        false
    }
    fn band_count(&self, _path: &str) -> Option<usize> {
        None
    }
    fn is_geographic(&self, _path: &str) -> Option<bool> {
        None
    }
    fn pixel_size(&self, _path: &str) -> Option<(f64, f64)> {
        None
    }
    fn min_max(&self, _path: &str) -> Option<(f64, f64)> {
        None
    }
}

fn full_registry() -> Registry {
    Registry::builder(&declared_schema())
        .raster(Arc::new(NoRasters))
        .build()
        .unwrap()
}

#[test]
fn test_error_codes_are_globally_unique() {
    let registry = full_registry();
    let codes: Vec<u32> = registry.all().map(|c| c.error_code()).collect();
    let unique: BTreeSet<u32> = codes.iter().copied().collect();
    assert_eq!(codes.len(), unique.len());
}

#[test]
fn test_registry_is_ordered_by_code() {
    let registry = full_registry();
    let codes: Vec<u32> = registry.all().map(|c| c.error_code()).collect();
    let mut sorted = codes.clone();
    sorted.sort_unstable();
    assert_eq!(codes, sorted);
}

#[test]
fn test_hand_declared_codes_stay_below_generated_block() {
    let schema = declared_schema();
    let declared = declared_checks(&schema, &Thresholds::default()).unwrap();
    assert!(declared
        .iter()
        .all(|c| c.error_code() < GENERATED_CODE_START));

    let generated = generate_checks(&schema).unwrap();
    assert!(generated.iter().all(|c| {
        let offset = (c.error_code() - GENERATED_CODE_START) % FAMILY_SIZE;
        c.error_code() >= GENERATED_CODE_START && offset > 0
    }));
}

#[test]
fn test_raster_checks_are_opt_in() {
    let schema = declared_schema();
    let plain = Registry::build(&schema, &Thresholds::default()).unwrap();
    let with_raster = full_registry();
    assert_eq!(with_raster.len(), plain.len() + 5);
    assert!(plain.get(501).is_none());
    assert_eq!(
        with_raster.get(501).map(|c| c.column().to_string()),
        Some(format!("{MODEL_SETTINGS}.dem_file"))
    );
}

#[test]
fn test_every_timeseries_table_is_covered() {
    let registry = full_registry();
    for (table, offset) in TIMESERIES_TABLES {
        let check = registry.get(offset + 1).unwrap();
        assert_eq!(check.column().table, table);
        assert_eq!(check.description(), format!("{table}.timeseries cannot be empty"));
    }
}

#[test]
fn test_descriptions_are_not_empty() {
    for check in full_registry().all() {
        assert!(!check.description().trim().is_empty(), "{check:?}");
    }
}

#[test]
fn test_level_ordering_of_filtered_checks() {
    let registry = full_registry();
    let all = registry.checks(Level::Info).count();
    let warnings = registry.checks(Level::Warning).count();
    let errors = registry.checks(Level::Error).count();
    assert_eq!(all, registry.len());
    assert!(errors < warnings && warnings < all);
    assert!(registry.checks(Level::Error).all(|c| c.level() == Level::Error));
}

#[test]
fn test_custom_check_with_taken_code_is_rejected() {
    let duplicate = NotNullCheck::new(CheckBase::new(
        21,
        ColumnRef::new(MODEL_SETTINGS, "name", ColumnType::Text),
    ));
    let err = Registry::builder(&declared_schema())
        .check(Box::new(duplicate))
        .build()
        .unwrap_err();
    assert_eq!(err, CheckerError::DuplicateErrorCode { code: 21 });
}
