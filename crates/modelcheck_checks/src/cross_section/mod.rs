//! Cross-section validation.
//!
//! Cross-section definitions describe their profile either with scalar
//! `width`/`height` fields, with space separated lists in the same fields, or
//! with a `cross_section_table` text. This module parses those encodings,
//! classifies profiles as open or closed and provides the checks on top.

mod checks;
mod configuration;
mod parse;

pub use checks::*;
pub use configuration::*;
pub use parse::*;
