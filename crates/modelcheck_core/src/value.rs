//! Dynamically typed column values.
//!
//! A relational store keeps a runtime storage class next to every value,
//! independent of the type the schema declares for the column. Several checks
//! depend on that distinction, so [`Value`] preserves it.

use crate::Geometry;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A single column value as stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value
    Null,
    /// 64-bit integer storage
    Integer(i64),
    /// Floating point storage
    Real(f64),
    /// Text storage
    Text(String),
    /// Raw bytes
    Blob(Vec<u8>),
    /// Spatial value
    Geometry(Geometry),
}

/// Runtime storage class of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// `NULL`
    Null,
    /// Integer storage
    Integer,
    /// Floating point storage
    Real,
    /// Text storage
    Text,
    /// Raw bytes
    Blob,
    /// Spatial value
    Geometry,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Geometry => "geometry",
        };
        write!(f, "{name}")
    }
}

/// Hashable identity of a non-null value, used for set membership and
/// grouping. Integral reals collapse onto integers so that `1` and `1.0`
/// compare equal, matching numeric comparison in SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    /// Integer or integral real
    Integer(i64),
    /// Non-integral real, by bit pattern
    Real(u64),
    /// Text
    Text(String),
    /// Bytes
    Blob(Vec<u8>),
    /// Geometry, by WKT
    Geometry(String),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the runtime storage class.
    pub fn storage_type(&self) -> StorageType {
        match self {
            Value::Null => StorageType::Null,
            Value::Integer(_) => StorageType::Integer,
            Value::Real(_) => StorageType::Real,
            Value::Text(_) => StorageType::Text,
            Value::Blob(_) => StorageType::Blob,
            Value::Geometry(_) => StorageType::Geometry,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempts to get this value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to get this value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as a geometry.
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the hashable identity of the value, `None` for null.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(ValueKey::Integer(*i)),
            Value::Real(f) => {
                if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                    Some(ValueKey::Integer(*f as i64))
                } else {
                    Some(ValueKey::Real(f.to_bits()))
                }
            }
            Value::Text(s) => Some(ValueKey::Text(s.clone())),
            Value::Blob(b) => Some(ValueKey::Blob(b.clone())),
            Value::Geometry(g) => Some(ValueKey::Geometry(g.to_wkt())),
        }
    }

    /// SQL-style comparison.
    ///
    /// Returns `None` (unknown) when either side is null or when the storage
    /// classes cannot be compared. Integers and reals compare numerically.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Geometry(a), Value::Geometry(b)) => (a == b).then_some(Ordering::Equal),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Geometry(g) => write!(f, "{g}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => serializer.serialize_bytes(b),
            Value::Geometry(g) => serializer.serialize_str(&g.to_wkt()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(i64::from(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Geometry> for Value {
    fn from(g: Geometry) -> Self {
        Value::Geometry(g)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
