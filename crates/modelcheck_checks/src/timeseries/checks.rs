//! Timeseries checks.
//!
//! A blank series is reported only by [`TimeseriesRule::Exists`]; every other
//! rule skips it. Ordering rules additionally skip series that do not parse.

use super::parse::{parse_timeseries, parse_timestep, parse_value, series_lines, split_line};
use crate::{Check, CheckBase};
use modelcheck_core::{Predicate, Query, Record, Store, StoreResult};
use std::collections::BTreeSet;
use tracing::debug;

/// Rule applied by a [`TimeseriesCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeseriesRule {
    /// The series must not be blank
    Exists,
    /// Every line must hold exactly two comma separated tokens
    RowShape,
    /// Every timestep must be a non-negative integer
    Timestep,
    /// Every value must be a finite number
    Value,
    /// Timesteps must strictly increase
    Increasing,
    /// The first timestep must be 0
    StartsWithZero,
}

/// A rule on the `timeseries` column of one table.
#[derive(Debug, Clone)]
pub struct TimeseriesCheck {
    base: CheckBase,
    rule: TimeseriesRule,
}

fn series(record: &Record, column: &str) -> Option<String> {
    record
        .text(column)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

impl TimeseriesCheck {
    /// Creates a new timeseries check.
    pub fn new(base: CheckBase, rule: TimeseriesRule) -> Self {
        Self { base, rule }
    }

    /// The rule applied.
    pub fn rule(&self) -> TimeseriesRule {
        self.rule
    }

    fn violates(&self, record: &Record) -> bool {
        let Some(text) = series(record, self.base.column_name()) else {
            return self.rule == TimeseriesRule::Exists;
        };

        let mut tokens = series_lines(&text).map(split_line);
        match self.rule {
            TimeseriesRule::Exists => false,
            TimeseriesRule::RowShape => tokens.any(|t| t.is_none()),
            TimeseriesRule::Timestep => {
                tokens.any(|t| t.is_some_and(|(step, _)| parse_timestep(step).is_none()))
            }
            TimeseriesRule::Value => {
                tokens.any(|t| t.is_some_and(|(_, value)| parse_value(value).is_none()))
            }
            TimeseriesRule::Increasing | TimeseriesRule::StartsWithZero => {
                let rows = match parse_timeseries(&text) {
                    Ok(rows) => rows,
                    Err(err) => {
                        debug!(
                            code = self.base.error_code,
                            record = %record,
                            "skipping unparsable timeseries: {err}"
                        );
                        return false;
                    }
                };
                if self.rule == TimeseriesRule::Increasing {
                    rows.windows(2).any(|w| w[1].0 <= w[0].0)
                } else {
                    rows.first().is_some_and(|(step, _)| *step != 0)
                }
            }
        }
    }
}

impl Check for TimeseriesCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        let column = &self.base.column;
        match self.rule {
            TimeseriesRule::Exists => format!("{column} cannot be empty"),
            TimeseriesRule::RowShape => format!(
                "{column} should contain one 'timestep,value' pair per line"
            ),
            TimeseriesRule::Timestep => {
                format!("{column} contains a timestep that is not a non-negative integer")
            }
            TimeseriesRule::Value => format!("{column} contains a value that is not a finite number"),
            TimeseriesRule::Increasing => {
                format!("{column} should be monotonically increasing in its timesteps")
            }
            TimeseriesRule::StartsWithZero => format!("{column} should start at timestep 0"),
        }
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let rows = store.select(&self.base.to_check())?;
        Ok(rows.into_iter().filter(|r| self.violates(r)).collect())
    }
}

/// Every boundary series must use the timesteps of the first boundary series.
///
/// The anchor is the first record (by id) of the first anchor table holding
/// a parsable series; later tables are consulted only when earlier ones hold
/// none.
#[derive(Debug, Clone)]
pub struct EqualTimestepsCheck {
    base: CheckBase,
    anchor_tables: Vec<String>,
}

fn timesteps(record: &Record, column: &str) -> Option<BTreeSet<u64>> {
    let text = series(record, column)?;
    let rows = parse_timeseries(&text).ok()?;
    Some(rows.into_iter().map(|(step, _)| step).collect())
}

impl EqualTimestepsCheck {
    /// Creates a new equal-timesteps check; `anchor_tables` are searched in
    /// order for the reference series.
    pub fn new<S: Into<String>>(base: CheckBase, anchor_tables: impl IntoIterator<Item = S>) -> Self {
        Self {
            base,
            anchor_tables: anchor_tables.into_iter().map(Into::into).collect(),
        }
    }

    fn anchor(&self, store: &dyn Store) -> StoreResult<Option<(String, i64, BTreeSet<u64>)>> {
        let column = self.base.column_name();
        for table in &self.anchor_tables {
            let rows = store.select(&Query::new(table).filter(Predicate::not_blank(column)))?;
            if let Some((id, steps)) = rows
                .iter()
                .find_map(|r| timesteps(r, column).map(|steps| (r.id, steps)))
            {
                return Ok(Some((table.clone(), id, steps)));
            }
        }
        Ok(None)
    }
}

impl Check for EqualTimestepsCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        format!(
            "{} should use the same timesteps as the first boundary condition",
            self.base.column
        )
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let Some((anchor_table, anchor_id, expected)) = self.anchor(store)? else {
            return Ok(Vec::new());
        };
        debug!(table = %anchor_table, id = anchor_id, "anchoring boundary timesteps");

        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check())?;
        Ok(rows
            .into_iter()
            .filter(|r| !(r.table == anchor_table && r.id == anchor_id))
            .filter(|r| timesteps(r, column).is_some_and(|steps| steps != expected))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcheck_core::{ColumnRef, ColumnType, MemoryStore};
    use pretty_assertions::assert_eq;

    const BC_1D: &str = "boundary_condition_1d";
    const BC_2D: &str = "boundary_condition_2d";

    fn base(table: &str) -> CheckBase {
        CheckBase::new(1, ColumnRef::new(table, "timeseries", ColumnType::Text))
    }

    fn store(series: &[(&str, i64, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.declare_table(BC_1D);
        store.declare_table(BC_2D);
        for (table, id, text) in series {
            store
                .insert(Record::new(*table, *id).with("timeseries", *text))
                .unwrap();
        }
        store
    }

    fn violating(rule: TimeseriesRule, text: &str) -> bool {
        let check = TimeseriesCheck::new(base(BC_1D), rule);
        !check.evaluate(&store(&[(BC_1D, 1, text)])).unwrap().is_empty()
    }

    #[test]
    fn test_monotonic_series_passes() {
        assert!(!violating(TimeseriesRule::Increasing, "0,0\n1,1\n2,2"));
        assert!(!violating(TimeseriesRule::StartsWithZero, "0,0\n1,1\n2,2"));
    }

    #[test]
    fn test_decreasing_timestep_fails() {
        assert!(violating(TimeseriesRule::Increasing, "0,0\n2,1\n1,2"));
        assert!(violating(TimeseriesRule::Increasing, "0,0\n1,1\n1,2"));
    }

    #[test]
    fn test_series_not_starting_at_zero_fails() {
        assert!(violating(TimeseriesRule::StartsWithZero, "1,0\n2,1"));
    }

    #[test]
    fn test_structural_rules() {
        assert!(violating(TimeseriesRule::RowShape, "0,0\n1"));
        assert!(violating(TimeseriesRule::Timestep, "0,0\n-1,1"));
        assert!(violating(TimeseriesRule::Value, "0,0\n1,nan"));
        assert!(!violating(TimeseriesRule::Value, "0,0\n1"));
        // unparsable series are left to the structural rules
        assert!(!violating(TimeseriesRule::Increasing, "5,0\n1,x"));
    }

    #[test]
    fn test_blank_series_only_fails_existence() {
        for rule in [
            TimeseriesRule::RowShape,
            TimeseriesRule::Timestep,
            TimeseriesRule::Value,
            TimeseriesRule::Increasing,
            TimeseriesRule::StartsWithZero,
        ] {
            assert!(!violating(rule, "  "), "{rule:?}");
        }
        assert!(violating(TimeseriesRule::Exists, ""));
        assert!(!violating(TimeseriesRule::Exists, "0,0"));
    }

    #[test]
    fn test_equal_timesteps_flags_only_the_deviating_series() {
        let store = store(&[(BC_1D, 1, "0,1\n1,2"), (BC_1D, 2, "0,1\n1,2\n2,3")]);
        let check = EqualTimestepsCheck::new(base(BC_1D), [BC_1D, BC_2D]);
        let ids: Vec<i64> = check.evaluate(&store).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_equal_timesteps_compares_sets_across_tables() {
        let store = store(&[
            (BC_1D, 1, "0,1\n60,2"),
            (BC_2D, 1, "0,5\n60,6"),
            (BC_2D, 2, "0,5\n30,6"),
        ]);
        let check = EqualTimestepsCheck::new(base(BC_2D), [BC_1D, BC_2D]);
        let ids: Vec<i64> = check.evaluate(&store).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_equal_timesteps_falls_back_to_2d_anchor() {
        let store = store(&[(BC_2D, 4, "0,5\n60,6"), (BC_2D, 5, "0,5")]);
        let check = EqualTimestepsCheck::new(base(BC_2D), [BC_1D, BC_2D]);
        let ids: Vec<i64> = check.evaluate(&store).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5]);
    }
}
