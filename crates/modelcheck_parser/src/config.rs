//! Checker configuration loading.

use crate::{detect_format, from_format, FileFormat, Result};
use modelcheck_core::CheckerConfig;
use std::path::Path;

/// Parse a checker configuration from a YAML string.
///
/// # Example
///
/// ```rust
/// use modelcheck_core::Level;
/// use modelcheck_parser::parse_config_yaml;
///
/// let config = parse_config_yaml("min_level: warning\nignored_codes: [30, 1201]\n").unwrap();
/// assert_eq!(config.min_level, Level::Warning);
/// assert!(config.is_ignored(1201));
/// ```
pub fn parse_config_yaml(content: &str) -> Result<CheckerConfig> {
    from_format(content, FileFormat::Yaml)
}

/// Parse a checker configuration from a TOML string.
///
/// Missing keys take their default values.
///
/// ```rust
/// use modelcheck_parser::parse_config_toml;
///
/// let config = parse_config_toml("[thresholds]\nmin_node_distance = 0.01\n").unwrap();
/// assert_eq!(config.thresholds.min_node_distance, 0.01);
/// assert_eq!(config.thresholds.min_cross_section_size, 0.1);
/// ```
pub fn parse_config_toml(content: &str) -> Result<CheckerConfig> {
    from_format(content, FileFormat::Toml)
}

/// Load a checker configuration file with automatic format detection.
pub fn parse_config_file(path: &Path) -> Result<CheckerConfig> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    from_format(&content, format)
}
