//! Timeseries validation.
//!
//! Boundary conditions and laterals carry a `timeseries` text column with one
//! `timestep,value` pair per line.

mod checks;
mod parse;

pub use checks::*;
pub use parse::*;
