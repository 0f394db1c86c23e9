//! Hand-declared checks.
//!
//! Codes are grouped by area: general rules in the 20s and 30s, cross-section
//! rules from 51, timeseries rules in the 300s (ten per table), spatial rules
//! in the 400s and raster rules in the 500s.

use crate::constants::{CalculationType, CrossSectionShape, FrictionType};
use crate::cross_section::{referenced_definitions, ProfileCheck, ProfileRule, SameConfigurationCheck};
use crate::model::{
    BOUNDARY_CONDITION_1D, BOUNDARY_CONDITION_2D, CHANNEL, CONNECTION_NODE,
    CROSS_SECTION_DEFINITION, CROSS_SECTION_LOCATION, CULVERT, LATERAL_1D, LATERAL_2D,
    MODEL_SETTINGS, PIPE,
};
use crate::raster::{RasterCheck, RasterInterface, RasterRule};
use crate::spatial::{LineLengthCheck, LocationDistanceCheck, NodeDistanceCheck};
use crate::timeseries::{EqualTimestepsCheck, TimeseriesCheck, TimeseriesRule};
use crate::{
    AllEqualCheck, Check, CheckBase, CheckerError, ConditionalCheck, GeneralCheck, NotNullCheck,
    QueryCheck, RangeCheck,
};
use modelcheck_core::{
    ColumnRef, CompareOp, DeclaredSchema, Level, Predicate, Query, Thresholds,
};
use std::sync::Arc;
use CrossSectionShape::*;

const SCALAR_SHAPES: &[CrossSectionShape] = &[ClosedRectangle, Rectangle, Circle, Egg, InvertedEgg];
const HEIGHT_IGNORED: &[CrossSectionShape] = &[Rectangle, Circle, Egg, InvertedEgg];
const TABULATED: &[CrossSectionShape] = &[TabulatedRectangle, TabulatedTrapezium, TabulatedYz];
const TABULATED_RT: &[CrossSectionShape] = &[TabulatedRectangle, TabulatedTrapezium];
const ALL_SHAPES: &[CrossSectionShape] = &CrossSectionShape::ALL;

/// Tables carrying a `timeseries` column, with their code offset.
pub const TIMESERIES_TABLES: [(&str, u32); 4] = [
    (BOUNDARY_CONDITION_1D, 300),
    (BOUNDARY_CONDITION_2D, 310),
    (LATERAL_1D, 320),
    (LATERAL_2D, 330),
];

/// Plausible range of elevation rasters in m.
pub const DEM_RANGE: (f64, f64) = (-9998.0, 8848.0);

fn column(schema: &DeclaredSchema, table: &str, name: &str) -> Result<ColumnRef, CheckerError> {
    schema
        .column(table, name)
        .ok_or_else(|| CheckerError::unknown_column(table, name))
}

fn base(
    schema: &DeclaredSchema,
    code: u32,
    table: &str,
    name: &str,
) -> Result<CheckBase, CheckerError> {
    Ok(CheckBase::new(code, column(schema, table, name)?))
}

fn boxed(check: impl Check + 'static) -> Box<dyn Check> {
    Box::new(check)
}

fn connected_channel() -> Predicate {
    Predicate::exists(
        "channel_id",
        Query::new(CHANNEL)
            .filter(Predicate::is_in(
                "calculation_type",
                [
                    CalculationType::Connected.code(),
                    CalculationType::DoubleConnected.code(),
                ],
            ))
            .select("id"),
    )
}

/// General rules on channels, locations, nodes and settings.
pub fn general_checks(schema: &DeclaredSchema) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let unconnected_node = schema.references_to(CONNECTION_NODE, "id").into_iter().fold(
        Query::new(CONNECTION_NODE),
        |query, reference| {
            query.filter(!Predicate::in_query(
                "id",
                Query::new(&reference.table).select(&reference.name),
            ))
        },
    );
    let channel_without_location = Query::new(CHANNEL).filter(!Predicate::in_query(
        "id",
        Query::new(CROSS_SECTION_LOCATION).select("channel_id"),
    ));

    Ok(vec![
        boxed(GeneralCheck::compare_columns(
            base(schema, 21, CHANNEL, "connection_node_end_id")?
                .with_message("A channel cannot start and end at the same connection_node"),
            CompareOp::Ne,
            "connection_node_start_id",
        )),
        boxed(ConditionalCheck::new(
            connected_channel(),
            NotNullCheck::new(base(schema, 22, CROSS_SECTION_LOCATION, "bank_level")?.with_message(
                "cross_section_location.bank_level cannot be null for (double) connected channels",
            )),
        )),
        boxed(GeneralCheck::compare_columns(
            base(schema, 23, CROSS_SECTION_LOCATION, "bank_level")?
                .with_level(Level::Warning)
                .with_message(
                    "cross_section_location.bank_level should be higher than or equal to cross_section_location.reference_level",
                ),
            CompareOp::Ge,
            "reference_level",
        )),
        boxed(ConditionalCheck::new(
            Predicate::eq("friction_type", FrictionType::Manning.code()),
            RangeCheck::new(
                base(schema, 24, MODEL_SETTINGS, "friction_coefficient")?
                    .with_level(Level::Warning),
            )
            .min(0.0)
            .max(1.0),
        )),
        boxed(RangeCheck::new(base(schema, 25, CROSS_SECTION_LOCATION, "friction_value")?).min(0.0)),
        boxed(RangeCheck::new(base(schema, 26, CONNECTION_NODE, "storage_area")?).min(0.0)),
        boxed(
            RangeCheck::new(base(schema, 27, MODEL_SETTINGS, "minimum_cell_size")?)
                .min(0.0)
                .exclusive_min(),
        ),
        boxed(RangeCheck::new(base(schema, 28, CULVERT, "discharge_coefficient_positive")?).min(0.0)),
        boxed(RangeCheck::new(base(schema, 29, PIPE, "friction_value")?).min(0.0)),
        boxed(QueryCheck::new(
            base(schema, 30, CONNECTION_NODE, "id")?
                .with_level(Level::Warning)
                .with_message("connection_node is not connected to any other feature"),
            unconnected_node,
        )),
        boxed(QueryCheck::new(
            base(schema, 31, CHANNEL, "id")?
                .with_message("channel has no cross_section_location"),
            channel_without_location,
        )),
        boxed(AllEqualCheck::new(
            base(schema, 32, CROSS_SECTION_LOCATION, "friction_value")?.with_level(Level::Info),
        )),
        boxed(AllEqualCheck::new(
            base(schema, 33, CROSS_SECTION_LOCATION, "bank_level")?.with_level(Level::Info),
        )),
        boxed(NotNullCheck::new(base(schema, 34, MODEL_SETTINGS, "epsg_code")?.with_message(
            "model_settings.epsg_code cannot be null, distances cannot be checked without it",
        ))),
    ])
}

/// Cross-section definition rules.
pub fn cross_section_checks(
    schema: &DeclaredSchema,
    thresholds: &Thresholds,
) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let referenced = referenced_definitions(schema);
    let profile = |code: u32, name: &str, shapes: &[CrossSectionShape], rule: ProfileRule| {
        base(schema, code, CROSS_SECTION_DEFINITION, name)
            .map(|b| b.with_filter(referenced.clone()))
            .map(|b| boxed(ProfileCheck::new(b, shapes, rule)))
    };
    let from_lists = |code: u32, name: &str, shapes: &[CrossSectionShape], rule: ProfileRule| {
        base(schema, code, CROSS_SECTION_DEFINITION, name)
            .map(|b| {
                b.with_filter(referenced.clone())
                    .with_filter(Predicate::is_blank("cross_section_table"))
            })
            .map(|b| boxed(ProfileCheck::new(b, shapes, rule)))
    };

    use ProfileRule::*;
    let mut checks = vec![
        profile(51, "width", SCALAR_SHAPES, NotEmpty)?,
        profile(52, "height", &[ClosedRectangle], NotEmpty)?,
        from_lists(53, "width", TABULATED, NotEmpty)?,
        from_lists(54, "height", TABULATED, NotEmpty)?,
        profile(57, "width", SCALAR_SHAPES, Number)?,
        profile(58, "height", &[ClosedRectangle], Number)?,
        profile(59, "width", TABULATED, NumberList)?,
        profile(60, "height", TABULATED, NumberList)?,
        profile(61, "cross_section_table", TABULATED, NumberList)?,
        profile(62, "width", SCALAR_SHAPES, Positive)?,
        profile(63, "height", &[ClosedRectangle], Positive)?,
        profile(64, "width", TABULATED_RT, NonNegative)?,
        profile(65, "height", TABULATED_RT, NonNegative)?,
        profile(66, "width", TABULATED, EqualElements)?,
        profile(67, "height", TABULATED_RT, Increasing)?,
        profile(68, "height", TABULATED_RT, FirstElementZero)?,
        profile(69, "width", &[TabulatedRectangle], FirstElementPositive)?,
        profile(70, "height", &[TabulatedYz], YzHeight)?,
        profile(71, "width", &[TabulatedYz], YzCoordinateCount)?,
        profile(72, "width", &[TabulatedYz], YzIncreasingIfOpen)?,
        profile(73, "friction_values", &[TabulatedYz], FrictionValues)?,
    ];

    // rules that hint rather than block
    for (code, name, shapes, rule) in [
        (55, "height", HEIGHT_IGNORED, ExpectEmpty),
        (56, "cross_section_table", SCALAR_SHAPES, ExpectEmpty),
        (
            74,
            "width",
            ALL_SHAPES,
            MinimumSize(thresholds.min_cross_section_size),
        ),
    ] {
        let b = base(schema, code, CROSS_SECTION_DEFINITION, name)?
            .with_level(Level::Warning)
            .with_filter(referenced.clone());
        checks.push(boxed(ProfileCheck::new(b, shapes, rule)));
    }

    checks.push(boxed(SameConfigurationCheck::new(base(schema, 75, CHANNEL, "id")?)));
    Ok(checks)
}

/// Timeseries rules on boundary conditions and laterals.
pub fn timeseries_checks(schema: &DeclaredSchema) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let rules = [
        TimeseriesRule::Exists,
        TimeseriesRule::RowShape,
        TimeseriesRule::Timestep,
        TimeseriesRule::Value,
        TimeseriesRule::Increasing,
        TimeseriesRule::StartsWithZero,
    ];
    let boundary_tables = [BOUNDARY_CONDITION_1D, BOUNDARY_CONDITION_2D];

    let mut checks = Vec::new();
    for (table, offset) in TIMESERIES_TABLES {
        for (index, rule) in rules.into_iter().enumerate() {
            let code = offset + index as u32 + 1;
            checks.push(boxed(TimeseriesCheck::new(
                base(schema, code, table, "timeseries")?,
                rule,
            )));
        }
        if boundary_tables.contains(&table) {
            let code = offset + rules.len() as u32 + 1;
            checks.push(boxed(EqualTimestepsCheck::new(
                base(schema, code, table, "timeseries")?,
                boundary_tables,
            )));
        }
    }
    Ok(checks)
}

/// Distance and length rules.
pub fn spatial_checks(
    schema: &DeclaredSchema,
    thresholds: &Thresholds,
) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    Ok(vec![
        boxed(LocationDistanceCheck::new(
            base(schema, 401, CROSS_SECTION_LOCATION, "the_geom")?.with_level(Level::Warning),
            thresholds.max_location_distance,
            schema.srid,
        )),
        boxed(NodeDistanceCheck::new(
            base(schema, 402, CONNECTION_NODE, "the_geom")?,
            thresholds.min_node_distance,
            schema.srid,
        )),
        boxed(LineLengthCheck::new(
            base(schema, 403, CHANNEL, "the_geom")?.with_level(Level::Warning),
            thresholds.min_channel_length,
            schema.srid,
        )),
    ])
}

/// Rules on the elevation raster.
pub fn raster_checks(
    schema: &DeclaredSchema,
    raster: Arc<dyn RasterInterface>,
) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let (min, max) = DEM_RANGE;
    let rules = [
        (501, Level::Error, RasterRule::Valid),
        (502, Level::Error, RasterRule::SingleBand),
        (503, Level::Error, RasterRule::Projected),
        (504, Level::Error, RasterRule::SquarePixels),
        (505, Level::Warning, RasterRule::ValueRange { min, max }),
    ];
    rules
        .into_iter()
        .map(|(code, level, rule)| {
            let b = base(schema, code, MODEL_SETTINGS, "dem_file")?.with_level(level);
            Ok(boxed(RasterCheck::new(b, raster.clone(), rule)))
        })
        .collect()
}

/// Every hand-declared check that needs no external collaborator.
pub fn declared_checks(
    schema: &DeclaredSchema,
    thresholds: &Thresholds,
) -> Result<Vec<Box<dyn Check>>, CheckerError> {
    let mut checks = general_checks(schema)?;
    checks.extend(cross_section_checks(schema, thresholds)?);
    checks.extend(timeseries_checks(schema)?);
    checks.extend(spatial_checks(schema, thresholds)?);
    Ok(checks)
}
