//! Cross-section checks.
//!
//! Format rules look at the raw text of one column. Semantic rules work on
//! the resolved [`CrossSection`] and skip definitions whose text does not
//! parse; the format rules report those.

use super::configuration::{Configuration, CrossSection};
use super::parse::{parse_list, parse_scalar, parse_table, table_columns};
use crate::constants::CrossSectionShape;
use crate::model::{CHANNEL, CROSS_SECTION_DEFINITION, CROSS_SECTION_LOCATION};
use crate::{Check, CheckBase};
use modelcheck_core::{DeclaredSchema, Predicate, Query, Record, Store, StoreResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Selects definitions referenced by any foreign key in the schema.
pub fn referenced_definitions(schema: &DeclaredSchema) -> Predicate {
    Predicate::any(
        schema
            .references_to(CROSS_SECTION_DEFINITION, "id")
            .into_iter()
            .map(|column| {
                Predicate::in_query("id", Query::new(&column.table).select(&column.name))
            }),
    )
}

/// Rule applied by a [`ProfileCheck`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileRule {
    /// The column must hold text
    NotEmpty,
    /// The column must be blank
    ExpectEmpty,
    /// The column must hold a single number
    Number,
    /// The column must hold a list (or, for the table column, a table of at
    /// least two columns)
    NumberList,
    /// Every value must be zero or more
    NonNegative,
    /// Every value must be more than zero
    Positive,
    /// Width and height lists must have the same length
    EqualElements,
    /// Values must not decrease
    Increasing,
    /// The first value must be 0
    FirstElementZero,
    /// The first value must be more than 0
    FirstElementPositive,
    /// Heights must contain exactly one zero and no negatives
    YzHeight,
    /// A YZ profile needs at least three distinct coordinates
    YzCoordinateCount,
    /// Open YZ profiles must have non-decreasing y
    YzIncreasingIfOpen,
    /// One non-negative friction value per YZ segment
    FrictionValues,
    /// Minimum width and, for closed profiles, height in m
    MinimumSize(f64),
}

/// A rule on one column of cross-section definitions of given shapes.
#[derive(Debug, Clone)]
pub struct ProfileCheck {
    base: CheckBase,
    shapes: Vec<CrossSectionShape>,
    rule: ProfileRule,
}

fn blank(record: &Record, column: &str) -> bool {
    record.text(column).is_none_or(|t| t.trim().is_empty())
}

fn shape_names(shapes: &[CrossSectionShape]) -> String {
    shapes
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProfileCheck {
    /// Creates a new profile check on `base.column` for the given shapes.
    pub fn new(base: CheckBase, shapes: &[CrossSectionShape], rule: ProfileRule) -> Self {
        Self {
            base,
            shapes: shapes.to_vec(),
            rule,
        }
    }

    /// The rule applied.
    pub fn rule(&self) -> ProfileRule {
        self.rule
    }

    fn values<'a>(&self, profile: &'a CrossSection) -> &'a [f64] {
        match self.base.column_name() {
            "height" => &profile.heights,
            _ => &profile.widths,
        }
    }

    fn violates(&self, record: &Record) -> bool {
        let column = self.base.column_name();
        match self.rule {
            ProfileRule::NotEmpty => return blank(record, column),
            ProfileRule::ExpectEmpty => return !blank(record, column),
            ProfileRule::Number => {
                return !blank(record, column)
                    && parse_scalar(record.text(column).unwrap_or("")).is_err();
            }
            ProfileRule::NumberList => {
                let text = record.text(column).unwrap_or("");
                return match column {
                    // every row needs at least the two profile columns
                    "cross_section_table" => parse_table(text)
                        .and_then(|rows| table_columns(&rows, 0, 1))
                        .is_err(),
                    _ => parse_list(text).is_err(),
                };
            }
            ProfileRule::FrictionValues => return self.violates_friction(record),
            _ => {}
        }

        match CrossSection::from_record(record) {
            Ok(Some(profile)) => self.violates_profile(&profile),
            Ok(None) => false,
            Err(err) => {
                debug!(
                    code = self.base.error_code,
                    record = %record,
                    "skipping unparsable cross-section: {err}"
                );
                false
            }
        }
    }

    fn violates_profile(&self, profile: &CrossSection) -> bool {
        let values = self.values(profile);
        match self.rule {
            ProfileRule::NonNegative => values.iter().any(|v| *v < 0.0),
            ProfileRule::Positive => values.iter().any(|v| *v <= 0.0),
            ProfileRule::EqualElements => {
                !profile.widths.is_empty()
                    && !profile.heights.is_empty()
                    && profile.widths.len() != profile.heights.len()
            }
            ProfileRule::Increasing => values.windows(2).any(|w| w[1] < w[0]),
            ProfileRule::FirstElementZero => values.first().is_some_and(|v| *v != 0.0),
            ProfileRule::FirstElementPositive => values.first().is_some_and(|v| *v <= 0.0),
            ProfileRule::YzHeight => {
                !profile.heights.is_empty()
                    && (profile.heights.iter().any(|z| *z < 0.0)
                        || profile.heights.iter().filter(|z| **z == 0.0).count() != 1)
            }
            ProfileRule::YzCoordinateCount => {
                if profile.widths.len() != profile.heights.len() {
                    return false;
                }
                let distinct: BTreeSet<(u64, u64)> = profile
                    .coordinates()
                    .map(|(y, z)| (y.to_bits(), z.to_bits()))
                    .collect();
                let closed = profile.configuration() == Some(Configuration::Closed);
                distinct.len() < 3 || (closed && profile.widths.len() < 4)
            }
            ProfileRule::YzIncreasingIfOpen => {
                profile.configuration() == Some(Configuration::Open)
                    && profile.widths.windows(2).any(|w| w[1] < w[0])
            }
            ProfileRule::MinimumSize(min_size) => {
                profile.meets_minimum_size(min_size) == Some(false)
            }
            ProfileRule::NotEmpty
            | ProfileRule::ExpectEmpty
            | ProfileRule::Number
            | ProfileRule::NumberList
            | ProfileRule::FrictionValues => false,
        }
    }

    fn violates_friction(&self, record: &Record) -> bool {
        if blank(record, "friction_values") {
            return false;
        }
        let Ok(friction) = parse_list(record.text("friction_values").unwrap_or("")) else {
            return true;
        };
        match CrossSection::from_record(record) {
            Ok(Some(profile)) if !profile.widths.is_empty() => {
                friction.len() + 1 != profile.widths.len() || friction.iter().any(|v| *v < 0.0)
            }
            _ => false,
        }
    }
}

impl Check for ProfileCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        let column = &self.base.column;
        let table = self.base.table();
        let shapes = shape_names(&self.shapes);
        match self.rule {
            ProfileRule::NotEmpty => {
                format!("{column} cannot be null or empty for shapes {shapes}")
            }
            ProfileRule::ExpectEmpty => {
                format!("{column} should be null or empty for shapes {shapes}")
            }
            ProfileRule::Number => {
                format!("{column} should contain a single number for shapes {shapes}")
            }
            ProfileRule::NumberList => format!(
                "{column} should contain a space separated list of numbers for shapes {shapes}"
            ),
            ProfileRule::NonNegative => {
                format!("{column} should be greater than or equal to 0 for shapes {shapes}")
            }
            ProfileRule::Positive => {
                format!("{column} should be greater than 0 for shapes {shapes}")
            }
            ProfileRule::EqualElements => format!(
                "{table}.width and {table}.height should contain the same number of elements for shapes {shapes}"
            ),
            ProfileRule::Increasing => format!(
                "{column} should be monotonically increasing for shapes {shapes}. Maybe the width and height have been interchanged?"
            ),
            ProfileRule::FirstElementZero => format!(
                "The first element of {column} should equal 0 for shapes {shapes}. Note that heights are relative to 'reference_level'."
            ),
            ProfileRule::FirstElementPositive => format!(
                "The first element of {column} must be larger than 0 for shapes {shapes}. Consider using a tabulated trapezium."
            ),
            ProfileRule::YzHeight => format!(
                "{column} for YZ profiles should include exactly one 0.0 and no negative values"
            ),
            ProfileRule::YzCoordinateCount => format!(
                "{table}.width and {table}.height should contain at least 3 distinct coordinates (4 positions when closed) for YZ profiles"
            ),
            ProfileRule::YzIncreasingIfOpen => format!(
                "{column} should be monotonically increasing for open YZ profiles. Perhaps this is actually a closed profile?"
            ),
            ProfileRule::FrictionValues => format!(
                "{table}.friction_values should contain one non-negative value per YZ profile segment"
            ),
            ProfileRule::MinimumSize(min_size) => format!(
                "{table}.width and/or {table}.height should be at least {min_size}m"
            ),
        }
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let shapes = Predicate::is_in("shape", CrossSectionShape::codes(&self.shapes));
        let rows = store.select(&self.base.to_check_where(shapes))?;
        Ok(rows.into_iter().filter(|r| self.violates(r)).collect())
    }
}

/// All cross-sections located on one channel must share a configuration.
///
/// Reports the channel record.
#[derive(Debug, Clone)]
pub struct SameConfigurationCheck {
    base: CheckBase,
}

impl SameConfigurationCheck {
    /// Creates a new same-configuration check; `base.column` should be
    /// `channel.id`.
    pub fn new(base: CheckBase) -> Self {
        Self { base }
    }
}

impl Check for SameConfigurationCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} has both open and closed cross-sections along its length. All cross-sections on a {} should be either open or closed.",
            self.base.column, CHANNEL
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let configurations: HashMap<i64, Configuration> = store
            .select(&Query::new(CROSS_SECTION_DEFINITION))?
            .iter()
            .filter_map(|r| {
                let profile = CrossSection::from_record(r).ok().flatten()?;
                Some((r.id, profile.configuration()?))
            })
            .collect();

        let mut per_channel: BTreeMap<i64, BTreeSet<Configuration>> = BTreeMap::new();
        for location in store.select(&Query::new(CROSS_SECTION_LOCATION))? {
            let (Some(channel), Some(definition)) = (
                location.integer("channel_id"),
                location.integer("definition_id"),
            ) else {
                continue;
            };
            if let Some(config) = configurations.get(&definition) {
                per_channel.entry(channel).or_default().insert(*config);
            }
        }

        let mixed: Vec<i64> = per_channel
            .into_iter()
            .filter(|(_, configs)| configs.len() > 1)
            .map(|(channel, _)| channel)
            .collect();
        if mixed.is_empty() {
            return Ok(Vec::new());
        }
        store.select(&self.base.to_check_where(Predicate::is_in("id", mixed)))
    }
}
