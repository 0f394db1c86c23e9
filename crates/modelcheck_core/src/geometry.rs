//! Minimal planar geometry model.
//!
//! Geometries are exchanged as Well-Known Text. Only the three types a
//! schematisation uses are supported: points (nodes), line strings (channels,
//! culverts) and polygons (surfaces, obstacles).

use crate::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single 2D position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    /// Easting or longitude
    pub x: f64,
    /// Northing or latitude
    pub y: f64,
}

impl Coord {
    /// Creates a new coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Declared geometry type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    /// A single position
    Point,
    /// An ordered sequence of positions
    LineString,
    /// An exterior ring with optional holes
    Polygon,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "POINT"),
            Self::LineString => write!(f, "LINESTRING"),
            Self::Polygon => write!(f, "POLYGON"),
        }
    }
}

impl FromStr for GeometryType {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POINT" => Ok(Self::Point),
            "LINESTRING" => Ok(Self::LineString),
            "POLYGON" => Ok(Self::Polygon),
            other => Err(GeometryError::UnsupportedType(other.to_string())),
        }
    }
}

/// A geometry value stored in a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position
    Point(Coord),
    /// An ordered sequence of positions
    LineString(Vec<Coord>),
    /// Rings; the first is the exterior ring
    Polygon(Vec<Vec<Coord>>),
}

impl Geometry {
    /// Returns the runtime type of this geometry.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point(_) => GeometryType::Point,
            Self::LineString(_) => GeometryType::LineString,
            Self::Polygon(_) => GeometryType::Polygon,
        }
    }

    /// Returns the point position, if this is a point.
    pub fn as_point(&self) -> Option<Coord> {
        match self {
            Self::Point(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the positions of a line string.
    pub fn as_line(&self) -> Option<&[Coord]> {
        match self {
            Self::LineString(coords) => Some(coords),
            _ => None,
        }
    }

    /// Parses a geometry from Well-Known Text.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modelcheck_core::{Geometry, GeometryType};
    ///
    /// let geom = Geometry::from_wkt("LINESTRING (0 0, 10 0)").unwrap();
    /// assert_eq!(geom.geometry_type(), GeometryType::LineString);
    /// ```
    pub fn from_wkt(text: &str) -> Result<Self, GeometryError> {
        let mut reader = WktReader::new(text);
        let geometry = reader.geometry()?;
        reader.skip_whitespace();
        if reader.pos < reader.text.len() {
            return Err(GeometryError::malformed(reader.pos, "trailing characters"));
        }
        Ok(geometry)
    }

    /// Serializes the geometry as Well-Known Text.
    pub fn to_wkt(&self) -> String {
        fn coords(list: &[Coord]) -> String {
            list.iter()
                .map(|c| format!("{} {}", c.x, c.y))
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::Point(c) => format!("POINT ({} {})", c.x, c.y),
            Self::LineString(list) => format!("LINESTRING ({})", coords(list)),
            Self::Polygon(rings) => format!(
                "POLYGON ({})",
                rings
                    .iter()
                    .map(|r| format!("({})", coords(r)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Returns true if the geometry is topologically valid.
    pub fn is_valid(&self) -> bool {
        self.invalid_reason().is_none()
    }

    /// Explains why the geometry is invalid, or `None` if it is valid.
    pub fn invalid_reason(&self) -> Option<String> {
        match self {
            Self::Point(c) => (!c.is_finite()).then(|| "non-finite coordinate".to_string()),
            Self::LineString(coords) => line_invalid_reason(coords),
            Self::Polygon(rings) => {
                if rings.is_empty() {
                    return Some("polygon without rings".to_string());
                }
                rings
                    .iter()
                    .enumerate()
                    .find_map(|(i, ring)| ring_invalid_reason(ring).map(|r| format!("ring {i}: {r}")))
            }
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wkt())
    }
}

impl FromStr for Geometry {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wkt(s)
    }
}

fn line_invalid_reason(coords: &[Coord]) -> Option<String> {
    if coords.iter().any(|c| !c.is_finite()) {
        return Some("non-finite coordinate".to_string());
    }
    if coords.len() < 2 {
        return Some("line string needs at least 2 positions".to_string());
    }
    if coords.iter().all(|c| *c == coords[0]) {
        return Some("line string has zero length".to_string());
    }
    None
}

fn ring_invalid_reason(ring: &[Coord]) -> Option<String> {
    if ring.iter().any(|c| !c.is_finite()) {
        return Some("non-finite coordinate".to_string());
    }
    if ring.len() < 4 {
        return Some("ring needs at least 4 positions".to_string());
    }
    if ring.first() != ring.last() {
        return Some("ring is not closed".to_string());
    }
    let segments = ring.len() - 1;
    for i in 0..segments {
        for j in (i + 1)..segments {
            let adjacent = j == i + 1 || (i == 0 && j == segments - 1);
            if adjacent {
                continue;
            }
            if segments_intersect(ring[i], ring[i + 1], ring[j], ring[j + 1]) {
                return Some(format!("self-intersection between segments {i} and {j}"));
            }
        }
    }
    if signed_area(ring) == 0.0 {
        return Some("ring has zero area".to_string());
    }
    None
}

fn signed_area(ring: &[Coord]) -> f64 {
    ring.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        / 2.0
}

fn orientation(a: Coord, b: Coord, c: Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn within_bounds(a: Coord, b: Coord, p: Coord) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    let straddles = |a: f64, b: f64| (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1 == 0.0 && within_bounds(q1, q2, p1))
        || (d2 == 0.0 && within_bounds(q1, q2, p2))
        || (d3 == 0.0 && within_bounds(p1, p2, q1))
        || (d4 == 0.0 && within_bounds(p1, p2, q2))
}

/// Cursor over a WKT string.
struct WktReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> WktReader<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        let text = self.text;
        &text[start..self.pos]
    }

    fn expect(&mut self, expected: char) -> Result<(), GeometryError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            _ => Err(GeometryError::malformed(
                self.pos,
                format!("expected '{expected}'"),
            )),
        }
    }

    fn geometry(&mut self) -> Result<Geometry, GeometryError> {
        self.skip_whitespace();
        let keyword = self.take_while(|c| c.is_ascii_alphabetic());
        let geometry_type: GeometryType = keyword.parse()?;

        // Optional dimension marker, e.g. "POINT Z (1 2 3)"
        self.skip_whitespace();
        self.take_while(|c| matches!(c, 'Z' | 'z' | 'M' | 'm'));

        match geometry_type {
            GeometryType::Point => {
                self.expect('(')?;
                let coord = self.coord()?;
                self.expect(')')?;
                Ok(Geometry::Point(coord))
            }
            GeometryType::LineString => Ok(Geometry::LineString(self.coord_list()?)),
            GeometryType::Polygon => {
                self.expect('(')?;
                let mut rings = vec![self.coord_list()?];
                loop {
                    self.skip_whitespace();
                    if self.peek() == Some(',') {
                        self.pos += 1;
                        rings.push(self.coord_list()?);
                    } else {
                        break;
                    }
                }
                self.expect(')')?;
                Ok(Geometry::Polygon(rings))
            }
        }
    }

    fn coord_list(&mut self) -> Result<Vec<Coord>, GeometryError> {
        self.expect('(')?;
        let mut coords = vec![self.coord()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    coords.push(self.coord()?);
                }
                Some(')') => {
                    self.pos += 1;
                    return Ok(coords);
                }
                _ => return Err(GeometryError::malformed(self.pos, "expected ',' or ')'")),
            }
        }
    }

    fn coord(&mut self) -> Result<Coord, GeometryError> {
        let x = self.number()?;
        let y = self.number()?;
        // Drop Z / M ordinates.
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                    self.number()?;
                }
                _ => break,
            }
        }
        Ok(Coord { x, y })
    }

    fn number(&mut self) -> Result<f64, GeometryError> {
        self.skip_whitespace();
        let token = self.take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if token.is_empty() {
            return Err(GeometryError::malformed(self.pos, "expected a number"));
        }
        token
            .parse()
            .map_err(|_| GeometryError::InvalidCoordinate(token.to_string()))
    }
}
