//! The declared schema of a hydraulic schematisation.
//!
//! Tables and columns the checker expects, with the constraints from which
//! the generic checks are generated.

use crate::constants::{BoundaryType, CalculationType, CrestType, CrossSectionShape, FrictionType};
use modelcheck_core::{
    ColumnBuilder, ColumnType, DeclaredSchema, GeometryType, Query, SchemaBuilder, Store,
    StoreResult, TableBuilder, TableDef,
};

/// Structural version of the declared schema.
pub const SCHEMA_VERSION: u32 = 219;

pub const MODEL_SETTINGS: &str = "model_settings";
pub const CONNECTION_NODE: &str = "connection_node";
pub const CHANNEL: &str = "channel";
pub const CROSS_SECTION_DEFINITION: &str = "cross_section_definition";
pub const CROSS_SECTION_LOCATION: &str = "cross_section_location";
pub const PIPE: &str = "pipe";
pub const CULVERT: &str = "culvert";
pub const WEIR: &str = "weir";
pub const ORIFICE: &str = "orifice";
pub const BOUNDARY_CONDITION_1D: &str = "boundary_condition_1d";
pub const BOUNDARY_CONDITION_2D: &str = "boundary_condition_2d";
pub const LATERAL_1D: &str = "lateral_1d";
pub const LATERAL_2D: &str = "lateral_2d";

const POINT: ColumnType = ColumnType::Geometry(GeometryType::Point);
const LINESTRING: ColumnType = ColumnType::Geometry(GeometryType::LineString);
const POLYGON: ColumnType = ColumnType::Geometry(GeometryType::Polygon);

fn codes<T: Copy>(all: &[T], code: impl Fn(T) -> i64) -> Vec<i64> {
    all.iter().map(|t| code(*t)).collect()
}

fn code(name: &str) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Text)
}

fn node_ref(name: &str) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Integer)
        .not_null()
        .references(CONNECTION_NODE, "id")
}

fn definition_ref() -> ColumnBuilder {
    ColumnBuilder::new("cross_section_definition_id", ColumnType::Integer)
        .not_null()
        .references(CROSS_SECTION_DEFINITION, "id")
}

fn model_settings() -> TableDef {
    TableBuilder::new(MODEL_SETTINGS)
        .column(code("name"))
        .column(ColumnBuilder::new("dem_file", ColumnType::Text))
        .column(ColumnBuilder::new("epsg_code", ColumnType::Integer))
        .column(
            ColumnBuilder::new("friction_type", ColumnType::Integer)
                .not_null()
                .enumerants(codes(&FrictionType::ALL, FrictionType::code)),
        )
        .column(ColumnBuilder::new("friction_coefficient", ColumnType::Real).not_null())
        .column(ColumnBuilder::new("minimum_cell_size", ColumnType::Real))
        .column(ColumnBuilder::new("use_2d_flow", ColumnType::Boolean).not_null())
        .build()
}

fn connection_node() -> TableDef {
    TableBuilder::new(CONNECTION_NODE)
        .column(code("code"))
        .column(ColumnBuilder::new("storage_area", ColumnType::Real))
        .column(ColumnBuilder::new("the_geom", POINT).not_null())
        .build()
}

fn channel() -> TableDef {
    TableBuilder::new(CHANNEL)
        .column(code("code"))
        .column(code("display_name"))
        .column(
            ColumnBuilder::new("calculation_type", ColumnType::Integer)
                .not_null()
                .enumerants(codes(&CalculationType::ALL, CalculationType::code)),
        )
        .column(node_ref("connection_node_start_id"))
        .column(node_ref("connection_node_end_id"))
        .column(ColumnBuilder::new("the_geom", LINESTRING).not_null())
        .build()
}

fn cross_section_definition() -> TableDef {
    TableBuilder::new(CROSS_SECTION_DEFINITION)
        .column(code("code").unique())
        .column(
            ColumnBuilder::new("shape", ColumnType::Integer)
                .not_null()
                .enumerants(codes(&CrossSectionShape::ALL, CrossSectionShape::code)),
        )
        .column(ColumnBuilder::new("width", ColumnType::Text))
        .column(ColumnBuilder::new("height", ColumnType::Text))
        .column(ColumnBuilder::new("cross_section_table", ColumnType::Text))
        .column(ColumnBuilder::new("friction_values", ColumnType::Text))
        .build()
}

fn cross_section_location() -> TableDef {
    TableBuilder::new(CROSS_SECTION_LOCATION)
        .column(code("code"))
        .column(
            ColumnBuilder::new("channel_id", ColumnType::Integer)
                .not_null()
                .references(CHANNEL, "id"),
        )
        .column(
            ColumnBuilder::new("definition_id", ColumnType::Integer)
                .not_null()
                .references(CROSS_SECTION_DEFINITION, "id"),
        )
        .column(ColumnBuilder::new("reference_level", ColumnType::Real).not_null())
        .column(ColumnBuilder::new("bank_level", ColumnType::Real))
        .column(
            ColumnBuilder::new("friction_type", ColumnType::Integer)
                .not_null()
                .enumerants(codes(&FrictionType::ALL, FrictionType::code)),
        )
        .column(ColumnBuilder::new("friction_value", ColumnType::Real))
        .column(ColumnBuilder::new("the_geom", POINT).not_null())
        .build()
}

fn pipe() -> TableDef {
    TableBuilder::new(PIPE)
        .column(code("code"))
        .column(node_ref("connection_node_start_id"))
        .column(node_ref("connection_node_end_id"))
        .column(definition_ref())
        .column(ColumnBuilder::new("invert_level_start_point", ColumnType::Real).not_null())
        .column(ColumnBuilder::new("invert_level_end_point", ColumnType::Real).not_null())
        .column(ColumnBuilder::new("friction_value", ColumnType::Real).not_null())
        .build()
}

fn culvert() -> TableDef {
    TableBuilder::new(CULVERT)
        .column(code("code"))
        .column(node_ref("connection_node_start_id"))
        .column(node_ref("connection_node_end_id"))
        .column(definition_ref())
        .column(ColumnBuilder::new("invert_level_start_point", ColumnType::Real))
        .column(ColumnBuilder::new("invert_level_end_point", ColumnType::Real))
        .column(ColumnBuilder::new("discharge_coefficient_positive", ColumnType::Real))
        .column(ColumnBuilder::new("the_geom", LINESTRING))
        .build()
}

fn structure(name: &str) -> TableDef {
    TableBuilder::new(name)
        .column(code("code"))
        .column(node_ref("connection_node_start_id"))
        .column(node_ref("connection_node_end_id"))
        .column(definition_ref())
        .column(ColumnBuilder::new("crest_level", ColumnType::Real).not_null())
        .column(
            ColumnBuilder::new("crest_type", ColumnType::Integer)
                .not_null()
                .enumerants(codes(&CrestType::ALL, CrestType::code)),
        )
        .build()
}

fn boundary_type() -> ColumnBuilder {
    ColumnBuilder::new("boundary_type", ColumnType::Integer)
        .not_null()
        .enumerants(codes(&BoundaryType::ALL, BoundaryType::code))
}

fn boundary_condition_1d() -> TableDef {
    TableBuilder::new(BOUNDARY_CONDITION_1D)
        .column(
            ColumnBuilder::new("connection_node_id", ColumnType::Integer)
                .not_null()
                .unique()
                .references(CONNECTION_NODE, "id"),
        )
        .column(boundary_type())
        .column(ColumnBuilder::new("timeseries", ColumnType::Text))
        .build()
}

fn boundary_condition_2d() -> TableDef {
    TableBuilder::new(BOUNDARY_CONDITION_2D)
        .column(code("display_name"))
        .column(boundary_type())
        .column(ColumnBuilder::new("timeseries", ColumnType::Text))
        .column(ColumnBuilder::new("the_geom", LINESTRING).not_null())
        .build()
}

fn lateral_1d() -> TableDef {
    TableBuilder::new(LATERAL_1D)
        .column(
            ColumnBuilder::new("connection_node_id", ColumnType::Integer)
                .not_null()
                .references(CONNECTION_NODE, "id"),
        )
        .column(ColumnBuilder::new("timeseries", ColumnType::Text))
        .build()
}

fn lateral_2d() -> TableDef {
    TableBuilder::new(LATERAL_2D)
        .column(ColumnBuilder::new("type", ColumnType::Integer).enumerants([1, 2]))
        .column(ColumnBuilder::new("timeseries", ColumnType::Text))
        .column(ColumnBuilder::new("the_geom", POINT).not_null())
        .column(ColumnBuilder::new("area", POLYGON))
        .build()
}

/// Builds the declared schema of a schematisation.
///
/// # Example
///
/// ```rust
/// use modelcheck_checks::model::{declared_schema, SCHEMA_VERSION};
///
/// let schema = declared_schema();
/// assert_eq!(schema.version, SCHEMA_VERSION);
/// assert!(schema.table("channel").is_some());
/// ```
pub fn declared_schema() -> DeclaredSchema {
    SchemaBuilder::new(SCHEMA_VERSION)
        .table(model_settings())
        .table(connection_node())
        .table(channel())
        .table(cross_section_definition())
        .table(cross_section_location())
        .table(pipe())
        .table(culvert())
        .table(structure(WEIR))
        .table(structure(ORIFICE))
        .table(boundary_condition_1d())
        .table(boundary_condition_2d())
        .table(lateral_1d())
        .table(lateral_2d())
        .build()
}

/// Spatial reference recorded in the model settings, if any.
///
/// The first settings row with a positive `epsg_code` wins.
pub fn model_srid(store: &dyn Store) -> StoreResult<Option<u32>> {
    Ok(store
        .select(&Query::new(MODEL_SETTINGS))?
        .iter()
        .filter_map(|r| r.integer("epsg_code"))
        .find_map(|code| u32::try_from(code).ok().filter(|c| *c > 0)))
}
