//! # Model Checker Checks
//!
//! The rule catalogue of the hydraulic model checker. This crate provides:
//!
//! - The [`Check`] contract and [`CheckBase`] record selection
//! - A library of generic checks (foreign keys, uniqueness, nullability,
//!   types, enumerants, geometries, ranges, comparisons)
//! - Factories generating generic checks from a declared schema
//! - Cross-section, timeseries, spatial and raster validation
//! - The [`Registry`] of all checks and the [`ModelChecker`] that runs it
//!
//! ## Example
//!
//! ```rust
//! use modelcheck_checks::{model, Registry};
//! use modelcheck_core::{Level, Thresholds};
//!
//! let schema = model::declared_schema();
//! let registry = Registry::build(&schema, &Thresholds::default()).unwrap();
//!
//! for check in registry.checks(Level::Error).take(3) {
//!     println!("{}: {}", check.error_code(), check.description());
//! }
//! ```

pub mod catalogue;
mod check;
mod checker;
pub mod constants;
pub mod cross_section;
mod error;
mod factories;
mod generic;
pub mod model;
pub mod raster;
mod registry;
pub mod spatial;
pub mod timeseries;

pub use check::*;
pub use checker::*;
pub use error::*;
pub use factories::*;
pub use generic::*;
pub use registry::*;
