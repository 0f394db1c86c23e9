//! Predicates and queries.
//!
//! A [`Predicate`] is a closed sum type describing a boolean filter over the
//! columns of one table, optionally reaching into other tables through
//! sub-queries. Every check's filter logic is expressed with it, so it can be
//! inspected and printed without a live store.
//!
//! Evaluation follows SQL three-valued logic: comparisons involving `NULL`
//! are *unknown*, and a query keeps only the rows for which its filter is
//! *true*.
//!
//! ## Example
//!
//! ```rust
//! use modelcheck_core::{Predicate, Query};
//!
//! let query = Query::new("cross_section_definition")
//!     .filter(Predicate::is_in("shape", [5, 6]))
//!     .filter(Predicate::not_null("width"));
//!
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT * FROM cross_section_definition WHERE (shape IN (5, 6) AND width IS NOT NULL)"
//! );
//! ```

use crate::{Record, Store, StoreResult, Value, ValueKey};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::ops::Not;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Applies the operator to an ordering.
    pub fn test(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    /// SQL spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A constant
    Value(Value),
    /// Another column of the same record
    Column(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Column(c) => write!(f, "{c}"),
        }
    }
}

/// A boolean filter over the columns of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Compare a column against a constant or another column
    Compare {
        /// Left-hand column
        column: String,
        /// Operator
        op: CompareOp,
        /// Right-hand side
        operand: Operand,
    },

    /// Inclusive range `low <= column <= high`
    Between {
        /// Tested column
        column: String,
        /// Lower bound
        low: Value,
        /// Upper bound
        high: Value,
    },

    /// Membership in a constant set
    In {
        /// Tested column
        column: String,
        /// Allowed values
        values: Vec<Value>,
    },

    /// Column is null
    IsNull(String),

    /// Membership in the result of another query
    InQuery {
        /// Tested column
        column: String,
        /// Sub-query producing the allowed values
        subquery: Box<SubQuery>,
    },

    /// Join existence: some row of the sub-query's table has its projected
    /// column equal to `local` and satisfies the sub-query filter
    Exists {
        /// Join key on the filtered table
        local: String,
        /// Related rows; `column` is the join key on the related table
        subquery: Box<SubQuery>,
    },

    /// Conjunction; empty means true
    And(Vec<Predicate>),

    /// Disjunction; empty means false
    Or(Vec<Predicate>),

    /// Negation
    Not(Box<Predicate>),
}

impl Predicate {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column != value`
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    /// `column <= value`
    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// `column >= value`
    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    /// `column <op> value`
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            operand: Operand::Value(value.into()),
        }
    }

    /// `column <op> other_column`
    pub fn compare_columns(
        column: impl Into<String>,
        op: CompareOp,
        other: impl Into<String>,
    ) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            operand: Operand::Column(other.into()),
        }
    }

    /// `column BETWEEN low AND high`
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// `column IN (values...)`
    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    /// `column IS NOT NULL`
    pub fn not_null(column: impl Into<String>) -> Self {
        !Self::IsNull(column.into())
    }

    /// Column is null or empty text.
    pub fn is_blank(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::IsNull(column.clone()).or(Self::eq(column, ""))
    }

    /// Column is neither null nor empty text.
    pub fn not_blank(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::not_null(column.clone()).and(Self::ne(column, ""))
    }

    /// `column IN (SELECT ...)`
    pub fn in_query(column: impl Into<String>, subquery: SubQuery) -> Self {
        Self::InQuery {
            column: column.into(),
            subquery: Box::new(subquery),
        }
    }

    /// `EXISTS (SELECT 1 FROM related WHERE related.key = local AND ...)`
    pub fn exists(local: impl Into<String>, subquery: SubQuery) -> Self {
        Self::Exists {
            local: local.into(),
            subquery: Box::new(subquery),
        }
    }

    /// Conjunction of all predicates.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(predicates.into_iter().collect())
    }

    /// Disjunction of all predicates.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(predicates.into_iter().collect())
    }

    /// Combines with another predicate using AND, flattening nested
    /// conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// Combines with another predicate using OR, flattening nested
    /// disjunctions.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (this, other) => Self::Or(vec![this, other]),
        }
    }

    /// Columns of the filtered table referenced by this predicate.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out.dedup();
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare {
                column, operand, ..
            } => {
                out.push(column);
                if let Operand::Column(other) = operand {
                    out.push(other);
                }
            }
            Self::Between { column, .. }
            | Self::In { column, .. }
            | Self::IsNull(column)
            | Self::InQuery { column, .. } => out.push(column),
            Self::Exists { local, .. } => out.push(local),
            Self::And(items) | Self::Or(items) => {
                items.iter().for_each(|p| p.collect_columns(out))
            }
            Self::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Resolves all sub-queries against a store, producing a filter that can
    /// be tested record by record without further store access.
    pub fn resolve(&self, store: &dyn Store) -> StoreResult<ResolvedPredicate<'_>> {
        Ok(ResolvedPredicate {
            node: Node::resolve(self, store)?,
        })
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                column,
                op,
                operand,
            } => write!(f, "{column} {op} {operand}"),
            Self::Between { column, low, high } => {
                write!(f, "{column} BETWEEN {low} AND {high}")
            }
            Self::In { column, values } => {
                write!(f, "{column} IN (")?;
                write_list(f, values, ", ")?;
                write!(f, ")")
            }
            Self::IsNull(column) => write!(f, "{column} IS NULL"),
            Self::InQuery { column, subquery } => write!(f, "{column} IN ({subquery})"),
            Self::Exists { local, subquery } => {
                let query = &subquery.query;
                write!(
                    f,
                    "EXISTS (SELECT 1 FROM {table} WHERE {table}.{key} = {local}",
                    table = query.table,
                    key = subquery.column
                )?;
                if let Some(filter) = &query.filter {
                    write!(f, " AND {filter}")?;
                }
                write!(f, ")")
            }
            Self::And(items) if items.is_empty() => write!(f, "TRUE"),
            Self::Or(items) if items.is_empty() => write!(f, "FALSE"),
            Self::And(items) => {
                write!(f, "(")?;
                write_list(f, items, " AND ")?;
                write!(f, ")")
            }
            Self::Or(items) => {
                write!(f, "(")?;
                write_list(f, items, " OR ")?;
                write!(f, ")")
            }
            Self::Not(inner) => match inner.as_ref() {
                Self::IsNull(column) => write!(f, "{column} IS NOT NULL"),
                other => write!(f, "NOT ({other})"),
            },
        }
    }
}

/// Selection of rows from one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Table to select from
    pub table: String,
    /// Optional row filter
    pub filter: Option<Predicate>,
}

impl Query {
    /// Selects all rows of a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
        }
    }

    /// Narrows the query; successive filters are AND-combined.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Narrows the query with an optional filter.
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.filter(p),
            None => self,
        }
    }

    /// Projects the query onto one column, for use in sub-query predicates.
    pub fn select(self, column: impl Into<String>) -> SubQuery {
        SubQuery {
            query: self,
            column: column.into(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {}", self.table)?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        Ok(())
    }
}

/// A query projected onto a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    /// Rows to project
    pub query: Query,
    /// Projected column
    pub column: String,
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.column, self.query.table)?;
        if let Some(filter) = &self.query.filter {
            write!(f, " WHERE {filter}")?;
        }
        Ok(())
    }
}

/// A predicate whose sub-queries have been executed.
#[derive(Debug)]
pub struct ResolvedPredicate<'p> {
    node: Node<'p>,
}

impl ResolvedPredicate<'_> {
    /// Three-valued result for a record: `None` means unknown.
    pub fn truth(&self, record: &Record) -> Option<bool> {
        self.node.truth(record)
    }

    /// Returns true only if the predicate is definitely true.
    pub fn matches(&self, record: &Record) -> bool {
        self.truth(record) == Some(true)
    }
}

#[derive(Debug)]
enum Node<'p> {
    Compare {
        column: &'p str,
        op: CompareOp,
        operand: &'p Operand,
    },
    Between {
        column: &'p str,
        low: &'p Value,
        high: &'p Value,
    },
    In {
        column: &'p str,
        keys: HashSet<ValueKey>,
    },
    IsNull(&'p str),
    Exists {
        local: &'p str,
        keys: HashSet<ValueKey>,
    },
    And(Vec<Node<'p>>),
    Or(Vec<Node<'p>>),
    Not(Box<Node<'p>>),
}

fn subquery_keys(subquery: &SubQuery, store: &dyn Store) -> StoreResult<HashSet<ValueKey>> {
    Ok(store
        .select(&subquery.query)?
        .iter()
        .filter_map(|r| r.value(&subquery.column).key())
        .collect())
}

impl<'p> Node<'p> {
    fn resolve(predicate: &'p Predicate, store: &dyn Store) -> StoreResult<Self> {
        Ok(match predicate {
            Predicate::Compare {
                column,
                op,
                operand,
            } => Node::Compare {
                column,
                op: *op,
                operand,
            },
            Predicate::Between { column, low, high } => Node::Between { column, low, high },
            Predicate::In { column, values } => Node::In {
                column,
                keys: values.iter().filter_map(Value::key).collect(),
            },
            Predicate::IsNull(column) => Node::IsNull(column),
            Predicate::InQuery { column, subquery } => Node::In {
                column,
                keys: subquery_keys(subquery, store)?,
            },
            Predicate::Exists { local, subquery } => Node::Exists {
                local,
                keys: subquery_keys(subquery, store)?,
            },
            Predicate::And(items) => Node::And(
                items
                    .iter()
                    .map(|p| Node::resolve(p, store))
                    .collect::<StoreResult<_>>()?,
            ),
            Predicate::Or(items) => Node::Or(
                items
                    .iter()
                    .map(|p| Node::resolve(p, store))
                    .collect::<StoreResult<_>>()?,
            ),
            Predicate::Not(inner) => Node::Not(Box::new(Node::resolve(inner, store)?)),
        })
    }

    fn truth(&self, record: &Record) -> Option<bool> {
        match self {
            Node::Compare {
                column,
                op,
                operand,
            } => {
                let left = record.value(column);
                let right = match operand {
                    Operand::Value(v) => v.clone(),
                    Operand::Column(c) => record.value(c),
                };
                left.compare(&right).map(|ord| op.test(ord))
            }
            Node::Between { column, low, high } => {
                let value = record.value(column);
                let above = value.compare(low).map(|o| o != Ordering::Less);
                let below = value.compare(high).map(|o| o != Ordering::Greater);
                and3(above, below)
            }
            Node::In { column, keys } => record.value(column).key().map(|k| keys.contains(&k)),
            Node::IsNull(column) => Some(record.value(column).is_null()),
            Node::Exists { local, keys } => Some(
                record
                    .value(local)
                    .key()
                    .is_some_and(|k| keys.contains(&k)),
            ),
            Node::And(items) => items
                .iter()
                .fold(Some(true), |acc, n| and3(acc, n.truth(record))),
            Node::Or(items) => items
                .iter()
                .fold(Some(false), |acc, n| or3(acc, n.truth(record))),
            Node::Not(inner) => inner.truth(record).map(|b| !b),
        }
    }
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}
