use anyhow::{anyhow, Context, Result};
use modelcheck_checks::model::declared_schema;
use modelcheck_checks::ModelChecker;
use modelcheck_core::{CheckerConfig, Level};
use modelcheck_parser::{load_snapshot, parse_config_file};
use std::path::Path;
use tracing::info;

use crate::output::{self, ReportRow};

fn load_config(
    config_path: Option<&str>,
    level: Option<&str>,
    ignore: &[u32],
) -> Result<CheckerConfig> {
    let mut config = match config_path {
        Some(path) => parse_config_file(Path::new(path))
            .with_context(|| format!("Failed to parse config file: {}", path))?,
        None => CheckerConfig::new(),
    };

    if let Some(level) = level {
        let level: Level = level.parse().map_err(|e: String| anyhow!(e))?;
        config = config.with_min_level(level);
    }
    Ok(config.with_ignored_codes(ignore.iter().copied()))
}

pub fn execute(
    snapshot_path: &str,
    config_path: Option<&str>,
    level: Option<&str>,
    ignore: &[u32],
    format: &str,
    limit: Option<usize>,
) -> Result<()> {
    info!("Checking model snapshot: {}", snapshot_path);

    let config = load_config(config_path, level, ignore)?;
    let schema = declared_schema();
    let store = load_snapshot(Path::new(snapshot_path), &schema)
        .with_context(|| format!("Failed to load snapshot: {}", snapshot_path))?;

    let checker = ModelChecker::new(&store, &schema, config)
        .context("Snapshot does not match the declared schema")?;

    let mut rows = Vec::new();
    for violation in checker.errors().take(limit.unwrap_or(usize::MAX)) {
        rows.push(ReportRow::from(&violation?));
    }
    info!("Found {} violations", rows.len());

    output::print_check_report(&rows, format)?;

    if rows.iter().any(|r| r.level == Level::Error) {
        std::process::exit(1);
    }

    Ok(())
}
