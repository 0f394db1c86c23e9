//! Spatial helpers and the checks built on them.
//!
//! Distances are in metres. Geographic spatial references use great-circle
//! distances; everything else is treated as a projected plane. A check
//! without a configured spatial reference takes the model's `epsg_code`, and
//! reports nothing when the model has none either.

use crate::model::{model_srid, CHANNEL, CROSS_SECTION_LOCATION};
use crate::{Check, CheckBase};
use modelcheck_core::{Coord, Predicate, Query, Record, Store, StoreResult};
use std::collections::HashMap;
use tracing::warn;

/// Mean earth radius in m.
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Returns true for geographic (longitude/latitude) spatial references.
///
/// Only WGS 84 (4326), ETRS89 (4258) and NAD83 (4269) are recognised. Any
/// other geographic reference is measured as if it were projected.
pub fn is_geographic(srid: u32) -> bool {
    matches!(srid, 4326 | 4258 | 4269)
}

/// Distance between two points.
pub fn distance(a: Coord, b: Coord, srid: u32) -> f64 {
    if !is_geographic(srid) {
        return (a.x - b.x).hypot(a.y - b.y);
    }
    let (lat1, lat2) = (a.y.to_radians(), b.y.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.x - a.x).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
}

/// Length of a line string.
pub fn line_length(line: &[Coord], srid: u32) -> f64 {
    line.windows(2).map(|w| distance(w[0], w[1], srid)).sum()
}

/// The configured spatial reference, or else the one the model declares.
fn resolve_srid(
    base: &CheckBase,
    srid: Option<u32>,
    store: &dyn Store,
) -> StoreResult<Option<u32>> {
    let resolved = match srid {
        Some(srid) => Some(srid),
        None => model_srid(store)?,
    };
    if resolved.is_none() {
        warn!(
            code = base.error_code,
            column = %base.column,
            "no spatial reference known, skipping distance check"
        );
    }
    Ok(resolved)
}

fn point_segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0)
    };
    (p.x - (a.x + t * dx)).hypot(p.y - (a.y + t * dy))
}

/// Shortest distance from a point to a line string.
///
/// Geographic coordinates are first projected onto a local plane centred on
/// the point.
pub fn point_line_distance(point: Coord, line: &[Coord], srid: u32) -> f64 {
    let project = |c: Coord| {
        if is_geographic(srid) {
            let scale = EARTH_RADIUS * std::f64::consts::PI / 180.0;
            Coord::new(
                (c.x - point.x) * point.y.to_radians().cos() * scale,
                (c.y - point.y) * scale,
            )
        } else {
            c
        }
    };
    let p = project(point);
    match line {
        [] => f64::INFINITY,
        [single] => {
            let q = project(*single);
            (p.x - q.x).hypot(p.y - q.y)
        }
        _ => line
            .windows(2)
            .map(|w| point_segment_distance(p, project(w[0]), project(w[1])))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Cross-section locations must lie on their channel.
#[derive(Debug, Clone)]
pub struct LocationDistanceCheck {
    base: CheckBase,
    max_distance: f64,
    srid: Option<u32>,
}

impl LocationDistanceCheck {
    /// Creates a new check on `cross_section_location.the_geom`.
    pub fn new(base: CheckBase, max_distance: f64, srid: Option<u32>) -> Self {
        Self {
            base,
            max_distance,
            srid,
        }
    }
}

impl Check for LocationDistanceCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} is more than {}m away from its {}",
            CROSS_SECTION_LOCATION, self.max_distance, CHANNEL
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let Some(srid) = resolve_srid(&self.base, self.srid, store)? else {
            return Ok(Vec::new());
        };
        let channels: HashMap<i64, Record> = store
            .select(&Query::new(CHANNEL).filter(Predicate::not_null("the_geom")))?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        Ok(rows
            .into_iter()
            .filter(|location| {
                let Some(point) = location.geometry(column).and_then(|g| g.as_point()) else {
                    return false;
                };
                let Some(line) = location
                    .integer("channel_id")
                    .and_then(|id| channels.get(&id))
                    .and_then(|c| c.geometry("the_geom"))
                    .and_then(|g| g.as_line())
                else {
                    return false;
                };
                point_line_distance(point, line, srid) > self.max_distance
            })
            .collect())
    }
}

/// Connection nodes must not lie on top of each other.
#[derive(Debug, Clone)]
pub struct NodeDistanceCheck {
    base: CheckBase,
    min_distance: f64,
    srid: Option<u32>,
}

impl NodeDistanceCheck {
    /// Creates a new check on `connection_node.the_geom`.
    pub fn new(base: CheckBase, min_distance: f64, srid: Option<u32>) -> Self {
        Self {
            base,
            min_distance,
            srid,
        }
    }
}

impl Check for NodeDistanceCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} is within {}m of another {}",
            self.base.table(),
            self.min_distance,
            self.base.table()
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let Some(srid) = resolve_srid(&self.base, self.srid, store)? else {
            return Ok(Vec::new());
        };
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        let points: Vec<Option<Coord>> = rows
            .iter()
            .map(|r| r.geometry(column).and_then(|g| g.as_point()))
            .collect();

        let mut close = vec![false; rows.len()];
        for i in 0..points.len() {
            let Some(a) = points[i] else { continue };
            for j in (i + 1)..points.len() {
                let Some(b) = points[j] else { continue };
                if distance(a, b, srid) < self.min_distance {
                    close[i] = true;
                    close[j] = true;
                }
            }
        }

        Ok(rows
            .into_iter()
            .zip(close)
            .filter_map(|(r, is_close)| is_close.then_some(r))
            .collect())
    }
}

/// Line features must not be shorter than a minimum length.
#[derive(Debug, Clone)]
pub struct LineLengthCheck {
    base: CheckBase,
    min_length: f64,
    srid: Option<u32>,
}

impl LineLengthCheck {
    /// Creates a new minimum length check on a line string column.
    pub fn new(base: CheckBase, min_length: f64, srid: Option<u32>) -> Self {
        Self {
            base,
            min_length,
            srid,
        }
    }
}

impl Check for LineLengthCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "The length of {} is very short (< {}m). A length of at least 1.0m is recommended.",
            self.base.table(),
            self.min_length
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let Some(srid) = resolve_srid(&self.base, self.srid, store)? else {
            return Ok(Vec::new());
        };
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_null(column)))?;
        Ok(rows
            .into_iter()
            .filter(|r| {
                r.geometry(column)
                    .and_then(|g| g.as_line())
                    .is_some_and(|line| line_length(line, srid) < self.min_length)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MODEL_SETTINGS;
    use modelcheck_core::{ColumnRef, ColumnType, Geometry, GeometryType, MemoryStore};
    use pretty_assertions::assert_eq;

    const RD_NEW: u32 = 28992;

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn wkt(text: &str) -> Geometry {
        Geometry::from_wkt(text).unwrap()
    }

    fn base(table: &str, geometry_type: GeometryType) -> CheckBase {
        CheckBase::new(
            1,
            ColumnRef::new(table, "the_geom", ColumnType::Geometry(geometry_type)),
        )
    }

    #[test]
    fn test_projected_distance() {
        assert_eq!(
            distance(Coord::new(0.0, 0.0), Coord::new(3.0, 4.0), RD_NEW),
            5.0
        );
    }

    #[test]
    fn test_recognised_geographic_references() {
        assert!([4326, 4258, 4269].into_iter().all(is_geographic));
        assert!(!is_geographic(RD_NEW));
        // Amersfoort geographic is not in the list and measured as projected
        assert!(!is_geographic(4289));
    }

    #[test]
    fn test_geographic_distance() {
        // one degree of latitude is about 111.2 km
        let d = distance(Coord::new(5.0, 52.0), Coord::new(5.0, 53.0), 4326);
        assert!((d - 111_195.0).abs() < 10.0, "{d}");
    }

    #[test]
    fn test_point_line_distance() {
        let line = [Coord::new(0.0, 0.0), Coord::new(10.0, 0.0)];
        assert_eq!(point_line_distance(Coord::new(5.0, 2.0), &line, RD_NEW), 2.0);
        assert_eq!(point_line_distance(Coord::new(13.0, 4.0), &line, RD_NEW), 5.0);

        let geographic = [Coord::new(5.0, 52.0), Coord::new(5.0, 53.0)];
        let d = point_line_distance(Coord::new(5.0, 52.5), &geographic, 4326);
        assert!(d < 1e-6, "{d}");
    }

    #[test]
    fn test_location_distance_check() {
        let mut store = MemoryStore::new();
        store
            .extend([
                Record::new(CHANNEL, 1).with("the_geom", wkt("LINESTRING (0 0, 10 0)")),
                Record::new(CROSS_SECTION_LOCATION, 1)
                    .with("channel_id", 1)
                    .with("the_geom", wkt("POINT (5 0.05)")),
                Record::new(CROSS_SECTION_LOCATION, 2)
                    .with("channel_id", 1)
                    .with("the_geom", wkt("POINT (5 1)")),
                Record::new(CROSS_SECTION_LOCATION, 3)
                    .with("channel_id", 99)
                    .with("the_geom", wkt("POINT (5 1)")),
            ])
            .unwrap();
        let check = LocationDistanceCheck::new(
            base(CROSS_SECTION_LOCATION, GeometryType::Point),
            0.1,
            Some(RD_NEW),
        );
        assert_eq!(ids(&check.evaluate(&store).unwrap()), vec![2]);
        assert_eq!(
            check.description(),
            "cross_section_location is more than 0.1m away from its channel"
        );
    }

    #[test]
    fn test_node_distance_check_reports_both_nodes() {
        let mut store = MemoryStore::new();
        store
            .extend([
                Record::new("connection_node", 1).with("the_geom", wkt("POINT (0 0)")),
                Record::new("connection_node", 2).with("the_geom", wkt("POINT (0 0.0005)")),
                Record::new("connection_node", 3).with("the_geom", wkt("POINT (10 10)")),
            ])
            .unwrap();
        let check = NodeDistanceCheck::new(
            base("connection_node", GeometryType::Point),
            0.001,
            Some(RD_NEW),
        );
        assert_eq!(ids(&check.evaluate(&store).unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_line_length_check() {
        let mut store = MemoryStore::new();
        store
            .extend([
                Record::new(CHANNEL, 1).with("the_geom", wkt("LINESTRING (0 0, 0.01 0)")),
                Record::new(CHANNEL, 2).with("the_geom", wkt("LINESTRING (0 0, 10 0)")),
            ])
            .unwrap();
        let check = LineLengthCheck::new(base(CHANNEL, GeometryType::LineString), 0.05, Some(RD_NEW));
        assert_eq!(ids(&check.evaluate(&store).unwrap()), vec![1]);
    }

    #[test]
    fn test_empty_store() {
        let mut store = MemoryStore::new();
        store.declare_table(CHANNEL);
        store.declare_table(CROSS_SECTION_LOCATION);
        store.declare_table("connection_node");
        let checks: Vec<Box<dyn Check>> = vec![
            Box::new(LocationDistanceCheck::new(
                base(CROSS_SECTION_LOCATION, GeometryType::Point),
                0.1,
                Some(RD_NEW),
            )),
            Box::new(NodeDistanceCheck::new(
                base("connection_node", GeometryType::Point),
                0.001,
                Some(RD_NEW),
            )),
            Box::new(LineLengthCheck::new(
                base(CHANNEL, GeometryType::LineString),
                0.05,
                Some(RD_NEW),
            )),
        ];
        for check in checks {
            assert!(check.evaluate(&store).unwrap().is_empty());
        }
    }

    fn close_nodes(settings: Option<Record>) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.declare_table(MODEL_SETTINGS);
        store
            .extend([
                Record::new("connection_node", 7).with("the_geom", wkt("POINT (155000 463000)")),
                Record::new("connection_node", 8)
                    .with("the_geom", wkt("POINT (155000.0005 463000)")),
            ])
            .unwrap();
        if let Some(settings) = settings {
            store.insert(settings).unwrap();
        }
        store
    }

    #[test]
    fn test_srid_taken_from_model_settings() {
        let settings = Record::new(MODEL_SETTINGS, 1).with("epsg_code", 28992);
        let store = close_nodes(Some(settings));
        let check =
            NodeDistanceCheck::new(base("connection_node", GeometryType::Point), 0.001, None);
        assert_eq!(ids(&check.evaluate(&store).unwrap()), vec![7, 8]);
    }

    #[test]
    fn test_unknown_srid_skips_instead_of_assuming_degrees() {
        let check =
            NodeDistanceCheck::new(base("connection_node", GeometryType::Point), 0.001, None);
        assert!(check.evaluate(&close_nodes(None)).unwrap().is_empty());

        let settings = Record::new(MODEL_SETTINGS, 1).with("name", "no epsg");
        assert!(check.evaluate(&close_nodes(Some(settings))).unwrap().is_empty());
    }

    #[test]
    fn test_configured_srid_wins_over_model_settings() {
        let settings = Record::new(MODEL_SETTINGS, 1).with("epsg_code", 4326);
        let store = close_nodes(Some(settings));
        let check = NodeDistanceCheck::new(
            base("connection_node", GeometryType::Point),
            0.001,
            Some(RD_NEW),
        );
        assert_eq!(ids(&check.evaluate(&store).unwrap()), vec![7, 8]);
    }
}
