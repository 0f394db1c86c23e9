//! Parsing of cross-section text encodings.
//!
//! Scalar fields hold a single number. List fields hold numbers separated by
//! commas and/or whitespace. Tables hold one row per line, each row a list of
//! equally many numbers. All functions here are pure.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("Invalid delimiter regex pattern"));

/// Errors raised while parsing a cross-section encoding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileParseError {
    /// A token is not a finite number
    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    /// A scalar field holds more than one number
    #[error("expected a single number, found {0}")]
    NotAScalar(usize),

    /// A table row has a different number of columns than the first row
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// A table has fewer columns than required
    #[error("expected at least {expected} values per row, found {found}")]
    TooFewColumns { found: usize, expected: usize },
}

impl ProfileParseError {
    /// Creates a new invalid number error.
    pub fn invalid_number(token: impl Into<String>) -> Self {
        Self::InvalidNumber(token.into())
    }
}

fn parse_number(token: &str) -> Result<f64, ProfileParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProfileParseError::invalid_number(token))
}

/// Parses a list of numbers separated by commas and/or whitespace.
///
/// Blank text yields an empty list.
///
/// # Example
///
/// ```rust
/// use modelcheck_checks::cross_section::parse_list;
///
/// assert_eq!(parse_list("0 1.5, 2").unwrap(), vec![0.0, 1.5, 2.0]);
/// assert!(parse_list("0 one").is_err());
/// ```
pub fn parse_list(text: &str) -> Result<Vec<f64>, ProfileParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    DELIMITER.split(text).map(parse_number).collect()
}

/// Parses an optional scalar field. Blank text yields `None`.
pub fn parse_scalar(text: &str) -> Result<Option<f64>, ProfileParseError> {
    let values = parse_list(text)?;
    match values.as_slice() {
        [] => Ok(None),
        [value] => Ok(Some(*value)),
        more => Err(ProfileParseError::NotAScalar(more.len())),
    }
}

/// Parses a table of rows, one per line. Blank lines are ignored and every
/// row must have as many values as the first.
pub fn parse_table(text: &str) -> Result<Vec<Vec<f64>>, ProfileParseError> {
    let rows: Vec<Vec<f64>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_list)
        .collect::<Result<_, _>>()?;

    if let Some(expected) = rows.first().map(Vec::len) {
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(ProfileParseError::RaggedRow {
                row: row + 1,
                found,
                expected,
            });
        }
    }
    Ok(rows)
}

/// Splits a table into two of its columns.
pub fn table_columns(
    rows: &[Vec<f64>],
    first: usize,
    second: usize,
) -> Result<(Vec<f64>, Vec<f64>), ProfileParseError> {
    let needed = first.max(second) + 1;
    if let Some(row) = rows.iter().find(|r| r.len() < needed) {
        return Err(ProfileParseError::TooFewColumns {
            found: row.len(),
            expected: needed,
        });
    }
    Ok((
        rows.iter().map(|r| r[first]).collect(),
        rows.iter().map(|r| r[second]).collect(),
    ))
}

/// Formats a list as space separated numbers.
pub fn format_list(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a table as comma separated rows.
pub fn format_table(rows: &[Vec<f64>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
