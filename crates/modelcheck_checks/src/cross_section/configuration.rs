//! Profiles and their open/closed configuration.

use super::parse::{parse_list, parse_scalar, parse_table, table_columns, ProfileParseError};
use crate::constants::CrossSectionShape;
use modelcheck_core::Record;
use std::fmt;

/// Hydraulic configuration of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Configuration {
    Open,
    Closed,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configuration::Open => f.write_str("open"),
            Configuration::Closed => f.write_str("closed"),
        }
    }
}

/// Classifies a profile as open or closed.
///
/// For YZ profiles `widths` holds the y and `heights` the z coordinates.
/// Returns `None` when the lists are too short to decide.
///
/// # Example
///
/// ```rust
/// use modelcheck_checks::constants::CrossSectionShape;
/// use modelcheck_checks::cross_section::{configuration, Configuration};
///
/// assert_eq!(
///     configuration(CrossSectionShape::TabulatedTrapezium, &[0.0, 2.0, 0.0], &[0.0, 1.0, 2.0]),
///     Some(Configuration::Closed)
/// );
/// ```
pub fn configuration(
    shape: CrossSectionShape,
    widths: &[f64],
    heights: &[f64],
) -> Option<Configuration> {
    if shape.is_closed_by_definition() {
        return Some(Configuration::Closed);
    }
    let closed = match shape {
        CrossSectionShape::TabulatedRectangle | CrossSectionShape::TabulatedTrapezium => {
            *widths.last()? == 0.0
        }
        CrossSectionShape::TabulatedYz => {
            if widths.len() != heights.len() {
                return None;
            }
            (widths.first()?, heights.first()?) == (widths.last()?, heights.last()?)
        }
        _ => false,
    };
    Some(if closed {
        Configuration::Closed
    } else {
        Configuration::Open
    })
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn span(values: &[f64]) -> Option<f64> {
    let lowest = values.iter().copied().reduce(f64::min)?;
    Some(max(values)? - lowest)
}

/// Width and (derived) height of a profile's bounding extent.
///
/// Scalar shapes use their width and height, synthesizing the height of
/// circles and eggs from the width; tabulated rectangles and trapezia use the
/// largest width and height; YZ profiles use the span of their coordinates.
pub fn extent(
    shape: CrossSectionShape,
    widths: &[f64],
    heights: &[f64],
) -> Option<(f64, Option<f64>)> {
    match shape {
        CrossSectionShape::TabulatedRectangle | CrossSectionShape::TabulatedTrapezium => {
            Some((max(widths)?, max(heights)))
        }
        CrossSectionShape::TabulatedYz => Some((span(widths)?, span(heights))),
        _ => {
            let width = *widths.first()?;
            let height = match shape.height_ratio() {
                Some(ratio) => Some(width * ratio),
                None => heights.first().copied(),
            };
            Some((width, height))
        }
    }
}

/// A cross-section definition with its numeric profile resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    /// Shape of the profile
    pub shape: CrossSectionShape,
    /// Widths, or y coordinates for YZ profiles
    pub widths: Vec<f64>,
    /// Heights, or z coordinates for YZ profiles
    pub heights: Vec<f64>,
}

impl CrossSection {
    /// Resolves the profile of a `cross_section_definition` record.
    ///
    /// Returns `Ok(None)` when the shape is missing or unknown. A populated
    /// `cross_section_table` takes precedence over the width and height
    /// fields of tabulated shapes.
    pub fn from_record(record: &Record) -> Result<Option<Self>, ProfileParseError> {
        let Some(shape) = record
            .integer("shape")
            .and_then(CrossSectionShape::from_code)
        else {
            return Ok(None);
        };

        let text = |column: &str| record.text(column).unwrap_or("").to_string();
        let table = text("cross_section_table");

        let (widths, heights) = if shape.is_tabulated() && !table.trim().is_empty() {
            let rows = parse_table(&table)?;
            match shape {
                // rows are y,z
                CrossSectionShape::TabulatedYz => table_columns(&rows, 0, 1)?,
                // rows are height,width
                _ => {
                    let (heights, widths) = table_columns(&rows, 0, 1)?;
                    (widths, heights)
                }
            }
        } else if shape.is_tabulated() {
            (parse_list(&text("width"))?, parse_list(&text("height"))?)
        } else {
            (
                parse_scalar(&text("width"))?.into_iter().collect(),
                parse_scalar(&text("height"))?.into_iter().collect(),
            )
        };

        Ok(Some(Self {
            shape,
            widths,
            heights,
        }))
    }

    /// Returns true if the profile came from the table field.
    pub fn uses_table(record: &Record) -> bool {
        record
            .text("cross_section_table")
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Open/closed classification.
    pub fn configuration(&self) -> Option<Configuration> {
        configuration(self.shape, &self.widths, &self.heights)
    }

    /// Bounding width and height.
    pub fn extent(&self) -> Option<(f64, Option<f64>)> {
        extent(self.shape, &self.widths, &self.heights)
    }

    /// Returns true if the profile meets the minimum size: closed profiles
    /// need both width and height, open profiles only width, of at least
    /// `min_size`. `None` when the extent cannot be determined.
    pub fn meets_minimum_size(&self, min_size: f64) -> Option<bool> {
        let (width, height) = self.extent()?;
        match self.configuration()? {
            Configuration::Open => Some(width >= min_size),
            Configuration::Closed => Some(width >= min_size && height? >= min_size),
        }
    }

    /// Coordinate pairs of a YZ profile.
    pub fn coordinates(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.widths.iter().copied().zip(self.heights.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CrossSectionShape::*;
    use pretty_assertions::assert_eq;

    fn definition(shape: CrossSectionShape) -> Record {
        Record::new("cross_section_definition", 1).with("shape", shape.code())
    }

    #[test]
    fn test_configuration_is_pure() {
        let first = configuration(TabulatedYz, &[0.0, 1.0, 2.0], &[1.0, 0.0, 1.0]);
        let second = configuration(TabulatedYz, &[0.0, 1.0, 2.0], &[1.0, 0.0, 1.0]);
        assert_eq!(first, second);
        assert_eq!(first, Some(Configuration::Open));
    }

    #[test]
    fn test_scalar_configurations() {
        assert_eq!(
            configuration(ClosedRectangle, &[1.0], &[2.0]),
            Some(Configuration::Closed)
        );
        assert_eq!(
            configuration(Rectangle, &[1.0], &[]),
            Some(Configuration::Open)
        );
        assert_eq!(configuration(Circle, &[1.0], &[]), Some(Configuration::Closed));
        assert_eq!(
            configuration(InvertedEgg, &[1.0], &[]),
            Some(Configuration::Closed)
        );
    }

    #[test]
    fn test_tabulated_configurations() {
        assert_eq!(
            configuration(TabulatedRectangle, &[1.0, 2.0, 0.0], &[0.0, 1.0, 2.0]),
            Some(Configuration::Closed)
        );
        assert_eq!(
            configuration(TabulatedTrapezium, &[1.0, 2.0], &[0.0, 1.0]),
            Some(Configuration::Open)
        );
        assert_eq!(configuration(TabulatedTrapezium, &[], &[]), None);
        assert_eq!(
            configuration(TabulatedYz, &[0.0, 1.0, 2.0, 0.0], &[1.0, 0.0, 1.0, 1.0]),
            Some(Configuration::Closed)
        );
        assert_eq!(configuration(TabulatedYz, &[0.0, 1.0], &[1.0]), None);
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent(Circle, &[0.5], &[]), Some((0.5, Some(0.5))));
        assert_eq!(extent(Egg, &[1.0], &[]), Some((1.0, Some(1.5))));
        assert_eq!(extent(Rectangle, &[2.0], &[]), Some((2.0, None)));
        assert_eq!(
            extent(TabulatedTrapezium, &[1.0, 3.0, 2.0], &[0.0, 0.5, 1.0]),
            Some((3.0, Some(1.0)))
        );
        assert_eq!(
            extent(TabulatedYz, &[2.0, 3.0, 4.5], &[1.0, -0.5, 1.0]),
            Some((2.5, Some(1.5)))
        );
    }

    #[test]
    fn test_minimum_size_closed_rectangle() {
        let small = CrossSection {
            shape: ClosedRectangle,
            widths: vec![0.05],
            heights: vec![0.2],
        };
        assert_eq!(small.meets_minimum_size(0.1), Some(false));

        let enough = CrossSection {
            widths: vec![0.1],
            ..small
        };
        assert_eq!(enough.meets_minimum_size(0.1), Some(true));
    }

    #[test]
    fn test_minimum_size_open_ignores_height() {
        let open = CrossSection {
            shape: TabulatedTrapezium,
            widths: vec![0.5, 1.0],
            heights: vec![0.0, 0.05],
        };
        assert_eq!(open.meets_minimum_size(0.1), Some(true));
    }

    #[test]
    fn test_from_record_scalar_and_lists() {
        let record = definition(Rectangle).with("width", "1.5");
        let profile = CrossSection::from_record(&record).unwrap().unwrap();
        assert_eq!(profile.widths, vec![1.5]);
        assert!(profile.heights.is_empty());

        let record = definition(TabulatedTrapezium)
            .with("width", "0 1 2")
            .with("height", "0 2 5");
        let profile = CrossSection::from_record(&record).unwrap().unwrap();
        assert_eq!(profile.widths, vec![0.0, 1.0, 2.0]);
        assert_eq!(profile.heights, vec![0.0, 2.0, 5.0]);
    }

    #[test]
    fn test_from_record_table_takes_precedence() {
        let record = definition(TabulatedRectangle)
            .with("width", "9 9")
            .with("height", "9 9")
            .with("cross_section_table", "0,1.5\n1,2.5");
        let profile = CrossSection::from_record(&record).unwrap().unwrap();
        assert_eq!(profile.heights, vec![0.0, 1.0]);
        assert_eq!(profile.widths, vec![1.5, 2.5]);

        let yz = definition(TabulatedYz).with("cross_section_table", "0,2\n1,0\n2,2");
        let profile = CrossSection::from_record(&yz).unwrap().unwrap();
        assert_eq!(profile.widths, vec![0.0, 1.0, 2.0]);
        assert_eq!(profile.heights, vec![2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_from_record_unknown_shape() {
        let record = Record::new("cross_section_definition", 1).with("shape", 4);
        assert_eq!(CrossSection::from_record(&record), Ok(None));
        let record = Record::new("cross_section_definition", 1);
        assert_eq!(CrossSection::from_record(&record), Ok(None));
    }

    #[test]
    fn test_from_record_parse_failure() {
        let record = definition(Circle).with("width", "wide");
        assert!(CrossSection::from_record(&record).is_err());
    }
}
