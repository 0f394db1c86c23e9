//! # Model Checker Core
//!
//! Core data structures and types for the hydraulic model checker.
//!
//! This crate provides the building blocks the checks are written against:
//! the values and records of a schematisation, geometries, column references,
//! a closed predicate/query language and the read-only [`Store`] abstraction
//! that evaluates it.
//!
//! ## Key Concepts
//!
//! - **Record**: one row of a declared table, identified by an integer id
//! - **Predicate**: a statically inspectable boolean filter, evaluated with
//!   SQL three-valued logic
//! - **Store**: read-only access to the rows of a schematisation
//! - **Declared schema**: the tables and columns the checker expects
//!
//! ## Example
//!
//! ```rust
//! use modelcheck_core::{MemoryStore, Predicate, Query, Record, Store};
//!
//! let mut store = MemoryStore::new();
//! store
//!     .extend([
//!         Record::new("channel", 1).with("calculation_type", 102),
//!         Record::new("channel", 2).with("calculation_type", 105),
//!     ])
//!     .unwrap();
//!
//! let embedded = store
//!     .select(&Query::new("channel").filter(Predicate::eq("calculation_type", 102)))
//!     .unwrap();
//! assert_eq!(embedded[0].id, 1);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod geometry;
pub mod level;
pub mod predicate;
pub mod record;
pub mod schema;
pub mod store;
pub mod value;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
pub use level::*;
pub use predicate::*;
pub use record::*;
pub use schema::*;
pub use store::*;
pub use value::*;
