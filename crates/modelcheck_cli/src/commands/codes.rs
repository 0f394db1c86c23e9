use anyhow::Result;
use modelcheck_checks::model::declared_schema;
use modelcheck_checks::Registry;
use modelcheck_core::Thresholds;
use tracing::info;

use crate::output::{self, CodeRow};

pub fn execute(format: &str) -> Result<()> {
    let schema = declared_schema();
    let registry = Registry::build(&schema, &Thresholds::default())?;
    info!("Listing {} checks", registry.len());

    let rows: Vec<CodeRow> = registry.all().map(CodeRow::from).collect();
    output::print_codes(&rows, format);
    Ok(())
}
