//! End-to-end tests of the full catalogue against small schematisations.
//!
//! Every test starts from a clean model that raises no violation at any
//! level and breaks exactly the thing it is about.

use modelcheck_checks::model::{
    declared_schema, BOUNDARY_CONDITION_1D, BOUNDARY_CONDITION_2D, CHANNEL, CONNECTION_NODE,
    CROSS_SECTION_DEFINITION, CROSS_SECTION_LOCATION, MODEL_SETTINGS,
};
use modelcheck_checks::{CheckerError, ModelChecker};
use modelcheck_core::{
    CheckerConfig, DeclaredSchema, Geometry, Level, MemoryStore, Record, Value,
};
use pretty_assertions::assert_eq;

const RD_NEW: u32 = 28992;

fn schema() -> DeclaredSchema {
    let mut schema = declared_schema();
    schema.srid = Some(RD_NEW);
    schema
}

fn wkt(text: &str) -> Geometry {
    Geometry::from_wkt(text).unwrap()
}

fn definition(id: i64, shape: i64, width: &str, height: &str) -> Record {
    Record::new(CROSS_SECTION_DEFINITION, id)
        .with("code", format!("def{id}"))
        .with("shape", shape)
        .with("width", width)
        .with("height", height)
}

fn location(id: i64, channel: i64, definition: i64, x: f64) -> Record {
    Record::new(CROSS_SECTION_LOCATION, id)
        .with("code", format!("loc{id}"))
        .with("channel_id", channel)
        .with("definition_id", definition)
        .with("reference_level", 0.0)
        .with("bank_level", 2.0)
        .with("friction_type", 2)
        .with("friction_value", 0.03 + id as f64 / 1000.0)
        .with("the_geom", wkt(&format!("POINT ({x} 0)")))
}

fn clean_records() -> Vec<Record> {
    vec![
        Record::new(MODEL_SETTINGS, 1)
            .with("name", "polder")
            .with("epsg_code", 28992)
            .with("friction_type", 2)
            .with("friction_coefficient", 0.03)
            .with("minimum_cell_size", 20.0)
            .with("use_2d_flow", true),
        Record::new(CONNECTION_NODE, 1)
            .with("storage_area", 1.0)
            .with("the_geom", wkt("POINT (0 0)")),
        Record::new(CONNECTION_NODE, 2)
            .with("storage_area", 2.0)
            .with("the_geom", wkt("POINT (100 0)")),
        channel(102),
        definition(1, 5, "2 4", "0 1.5"),
        location(1, 1, 1, 50.0),
        Record::new(BOUNDARY_CONDITION_1D, 1)
            .with("connection_node_id", 1)
            .with("boundary_type", 1)
            .with("timeseries", "0,1.0\n60,1.5"),
    ]
}

fn channel(calculation_type: i64) -> Record {
    Record::new(CHANNEL, 1)
        .with("code", "ch1")
        .with("calculation_type", calculation_type)
        .with("connection_node_start_id", 1)
        .with("connection_node_end_id", 2)
        .with("the_geom", wkt("LINESTRING (0 0, 100 0)"))
}

/// Clean records with some replaced (same table and id) or added.
fn model(changes: impl IntoIterator<Item = Record>) -> MemoryStore {
    let mut records = clean_records();
    for change in changes {
        records.retain(|r| !(r.table == change.table && r.id == change.id));
        records.push(change);
    }

    let schema = schema();
    let mut store = MemoryStore::new().with_version(schema.version);
    for table in schema.table_names() {
        store.declare_table(table);
    }
    store.extend(records).unwrap();
    store
}

fn violations(store: &MemoryStore) -> Vec<(u32, String, i64)> {
    violations_in(store, &schema())
}

fn violations_in(store: &MemoryStore, schema: &DeclaredSchema) -> Vec<(u32, String, i64)> {
    let config = CheckerConfig::new().with_min_level(Level::Info);
    let checker = ModelChecker::new(store, schema, config).unwrap();
    checker
        .errors()
        .map(|v| v.unwrap())
        .map(|v| (v.error_code(), v.record.table.clone(), v.record.id))
        .collect()
}

fn codes(store: &MemoryStore) -> Vec<u32> {
    let mut codes: Vec<u32> = violations(store).into_iter().map(|(c, _, _)| c).collect();
    codes.dedup();
    codes
}

#[test]
fn test_clean_model_has_no_violations() {
    let found = violations(&model(Vec::<Record>::new()));
    assert!(found.is_empty(), "{found:?}");
}

#[test]
fn test_tabulated_lists_of_equal_length_pass() {
    let store = model([definition(1, 6, "0 1 2", "0 2 5")]);
    assert!(!codes(&store).contains(&66));
}

#[test]
fn test_tabulated_lists_of_different_length_fail() {
    let store = model([definition(1, 6, "0 1", "0 2 5")]);
    let found = violations(&store);
    assert!(found.contains(&(66, CROSS_SECTION_DEFINITION.to_string(), 1)));
}

#[test]
fn test_decreasing_heights_hint_at_interchanged_columns() {
    let store = model([definition(1, 5, "2 4", "1.5 0")]);
    let schema = schema();
    let checker = ModelChecker::new(&store, &schema, CheckerConfig::new()).unwrap();
    let violation = checker
        .errors()
        .map(|v| v.unwrap())
        .find(|v| v.error_code() == 67)
        .unwrap();
    assert!(violation.description().contains("interchanged"));
}

#[test]
fn test_closed_rectangle_below_minimum_size() {
    let too_small = model([definition(1, 0, "0.05", "0.2")]);
    assert!(codes(&too_small).contains(&74));

    let large_enough = model([definition(1, 0, "0.1", "0.2")]);
    assert!(!codes(&large_enough).contains(&74));
}

#[test]
fn test_unreferenced_definitions_are_not_checked() {
    let store = model([definition(2, 6, "0 1", "0 2 5")]);
    assert!(!codes(&store).contains(&66));
}

#[test]
fn test_definition_from_table_takes_precedence() {
    let store = model([definition(1, 6, "", "").with("cross_section_table", "0, 2\n1.5, 4")]);
    let found = violations(&store);
    assert!(found.is_empty(), "{found:?}");
}

#[test]
fn test_single_column_table_is_reported() {
    let store = model([definition(1, 5, "", "").with("cross_section_table", "1\n2")]);
    let found = violations(&store);
    assert!(
        found.contains(&(61, CROSS_SECTION_DEFINITION.to_string(), 1)),
        "{found:?}"
    );
}

#[test]
fn test_mixed_configurations_on_one_channel() {
    // a closed tabulated rectangle: top width zero
    let store = model([definition(2, 5, "2 0", "0 1.5"), location(2, 1, 2, 60.0)]);
    let found = violations(&store);
    assert!(found.contains(&(75, CHANNEL.to_string(), 1)));
}

#[test]
fn test_bank_level_required_on_connected_channels() {
    let connected = model([location(1, 1, 1, 50.0).with("bank_level", Value::Null)]);
    assert!(codes(&connected).contains(&22));

    let isolated = model([
        channel(101),
        location(1, 1, 1, 50.0).with("bank_level", Value::Null),
    ]);
    assert!(!codes(&isolated).contains(&22));
}

#[test]
fn test_generated_checks_run_with_the_catalogue() {
    let store = model([location(1, 1, 99, 50.0)]);
    let found = violations(&store);
    assert!(found.iter().any(|(code, table, id)| (1100..1200).contains(code)
        && table == CROSS_SECTION_LOCATION
        && *id == 1));
}

#[test]
fn test_timeseries_across_boundary_tables() {
    let store = model([Record::new(BOUNDARY_CONDITION_2D, 1)
        .with("boundary_type", 1)
        .with("timeseries", "0,1.0\n30,1.5")
        .with("the_geom", wkt("LINESTRING (0 10, 0 20)"))]);
    // the 1D series anchors; the 2D series deviates
    assert!(violations(&store).contains(&(317, BOUNDARY_CONDITION_2D.to_string(), 1)));
}

#[test]
fn test_ignored_codes_and_level_filter() {
    let store = model([definition(1, 6, "0 1", "0 2 5")]);
    let schema = schema();

    let ignoring = CheckerConfig::new().with_ignored_code(66);
    let checker = ModelChecker::new(&store, &schema, ignoring).unwrap();
    assert!(checker.errors().all(|v| v.unwrap().error_code() != 66));

    let errors_only = CheckerConfig::new().with_min_level(Level::Error);
    let checker = ModelChecker::new(&store, &schema, errors_only).unwrap();
    assert!(checker.errors().all(|v| v.unwrap().level() == Level::Error));
}

#[test]
fn test_stopping_early() {
    // unconnected nodes, far apart
    let nodes = (3..20).map(|id| {
        Record::new(CONNECTION_NODE, id).with("the_geom", wkt(&format!("POINT ({} 50)", id * 10)))
    });
    let store = model(nodes);
    let schema = schema();
    let checker = ModelChecker::new(&store, &schema, CheckerConfig::new()).unwrap();

    let first: Vec<(u32, i64)> = checker
        .errors()
        .take(3)
        .map(|v| v.unwrap())
        .map(|v| (v.error_code(), v.record.id))
        .collect();
    assert_eq!(first, vec![(30, 3), (30, 4), (30, 5)]);
    assert_eq!(checker.errors().count(), 17);
}

#[test]
fn test_version_mismatch_is_rejected_before_checks_run() {
    let store = model(Vec::<Record>::new());
    let mut schema = schema();
    schema.version += 1;
    let err = ModelChecker::new(&store, &schema, CheckerConfig::new()).unwrap_err();
    assert!(matches!(err, CheckerError::SchemaVersionMismatch { .. }));
}

#[test]
fn test_spatial_reference_taken_from_model_settings() {
    // 0.5 mm from node 2
    let store = model([Record::new(CONNECTION_NODE, 3)
        .with("storage_area", 1.0)
        .with("the_geom", wkt("POINT (100.0005 0)"))]);
    let found = violations_in(&store, &declared_schema());
    assert!(found.contains(&(402, CONNECTION_NODE.to_string(), 2)), "{found:?}");
    assert!(found.contains(&(402, CONNECTION_NODE.to_string(), 3)), "{found:?}");
}

#[test]
fn test_missing_epsg_code_is_reported_and_distances_skipped() {
    let settings = clean_records()[0].clone().with("epsg_code", Value::Null);
    let store = model([
        settings,
        Record::new(CONNECTION_NODE, 3)
            .with("storage_area", 1.0)
            .with("the_geom", wkt("POINT (100.0005 0)")),
    ]);
    let found = violations_in(&store, &declared_schema());
    assert!(found.contains(&(34, MODEL_SETTINGS.to_string(), 1)), "{found:?}");
    assert!(found.iter().all(|(code, _, _)| *code != 402), "{found:?}");
}
