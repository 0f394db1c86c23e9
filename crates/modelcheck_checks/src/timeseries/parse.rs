//! Parsing of `timestep,value` series.

use thiserror::Error;

/// Errors raised while parsing a timeseries. Lines are numbered from 1.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimeseriesError {
    /// The line does not hold exactly two comma separated tokens
    #[error("line {line}: expected 'timestep,value'")]
    RowShape { line: usize },

    /// The timestep is not a non-negative integer
    #[error("line {line}: '{token}' is not a non-negative integer timestep")]
    InvalidTimestep { line: usize, token: String },

    /// The value is not a finite number
    #[error("line {line}: '{token}' is not a finite value")]
    InvalidValue { line: usize, token: String },
}

/// The lines of a series, with surrounding whitespace removed.
pub fn series_lines(text: &str) -> impl Iterator<Item = &str> {
    text.trim().lines().map(str::trim)
}

/// Splits a line into its timestep and value tokens.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let (timestep, value) = line.split_once(',')?;
    if value.contains(',') {
        return None;
    }
    Some((timestep.trim(), value.trim()))
}

/// Parses a timestep token.
pub fn parse_timestep(token: &str) -> Option<u64> {
    token.parse().ok()
}

/// Parses a value token, rejecting `nan` and infinities.
pub fn parse_value(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a whole series. Blank text yields an empty series.
///
/// # Example
///
/// ```rust
/// use modelcheck_checks::timeseries::parse_timeseries;
///
/// assert_eq!(parse_timeseries("0,0\n60,1.5").unwrap(), vec![(0, 0.0), (60, 1.5)]);
/// assert!(parse_timeseries("0,0\n60").is_err());
/// ```
pub fn parse_timeseries(text: &str) -> Result<Vec<(u64, f64)>, TimeseriesError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    series_lines(text)
        .enumerate()
        .map(|(index, line)| {
            let line_no = index + 1;
            let (timestep, value) =
                split_line(line).ok_or(TimeseriesError::RowShape { line: line_no })?;
            let timestep =
                parse_timestep(timestep).ok_or_else(|| TimeseriesError::InvalidTimestep {
                    line: line_no,
                    token: timestep.to_string(),
                })?;
            let value = parse_value(value).ok_or_else(|| TimeseriesError::InvalidValue {
                line: line_no,
                token: value.to_string(),
            })?;
            Ok((timestep, value))
        })
        .collect()
}

/// Formats a series, one `timestep,value` pair per line.
pub fn format_timeseries(rows: &[(u64, f64)]) -> String {
    rows.iter()
        .map(|(timestep, value)| format!("{timestep},{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
