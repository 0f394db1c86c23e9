//! Checker configuration.

use crate::Level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Numeric thresholds interpolated into check rules and their descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum width (and, for closed profiles, height) of a cross-section in m
    pub min_cross_section_size: f64,

    /// Maximum distance between a cross-section location and its channel in m
    pub max_location_distance: f64,

    /// Minimum distance between two connection nodes in m
    pub min_node_distance: f64,

    /// Minimum length of a channel in m
    pub min_channel_length: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_cross_section_size: 0.1,
            max_location_distance: 0.1,
            min_node_distance: 0.001,
            min_channel_length: 0.05,
        }
    }
}

/// Options for a checker run.
///
/// # Example
///
/// ```rust
/// use modelcheck_core::{CheckerConfig, Level};
///
/// let config = CheckerConfig::new()
///     .with_min_level(Level::Warning)
///     .with_ignored_code(21);
///
/// assert!(config.is_ignored(21));
/// assert!(!config.reports(Level::Info));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Minimum severity to run
    pub min_level: Level,

    /// Error codes to skip
    pub ignored_codes: BTreeSet<u32>,

    /// Rule thresholds
    pub thresholds: Thresholds,
}

impl CheckerConfig {
    /// Creates a configuration that runs every check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum severity.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Suppresses one error code.
    pub fn with_ignored_code(mut self, code: u32) -> Self {
        self.ignored_codes.insert(code);
        self
    }

    /// Suppresses several error codes.
    pub fn with_ignored_codes(mut self, codes: impl IntoIterator<Item = u32>) -> Self {
        self.ignored_codes.extend(codes);
        self
    }

    /// Replaces the thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Returns true if checks of this level are run.
    pub fn reports(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Returns true if the code is suppressed.
    pub fn is_ignored(&self, code: u32) -> bool {
        self.ignored_codes.contains(&code)
    }
}
