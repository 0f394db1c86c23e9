use anyhow::Result;
use chrono::Utc;
use colored::*;
use modelcheck_checks::{Check, Violation};
use modelcheck_core::Level;
use serde_json::json;

/// One violation, detached from the checker.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub level: Level,
    pub code: u32,
    pub table: String,
    pub id: i64,
    pub column: String,
    pub description: String,
}

impl From<&Violation<'_>> for ReportRow {
    fn from(violation: &Violation<'_>) -> Self {
        Self {
            level: violation.level(),
            code: violation.error_code(),
            table: violation.record.table.clone(),
            id: violation.record.id,
            column: violation.check.column().to_string(),
            description: violation.description(),
        }
    }
}

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRow {
    pub code: u32,
    pub level: Level,
    pub column: String,
    pub description: String,
}

impl From<&dyn Check> for CodeRow {
    fn from(check: &dyn Check) -> Self {
        Self {
            code: check.error_code(),
            level: check.level(),
            column: check.column().to_string(),
            description: check.description(),
        }
    }
}

fn colored_level(level: Level) -> ColoredString {
    let label = format!("{:<7}", level.as_str());
    match level {
        Level::Error => label.red().bold(),
        Level::Warning => label.yellow().bold(),
        Level::Info => label.blue(),
    }
}

fn count(rows: &[ReportRow], level: Level) -> usize {
    rows.iter().filter(|r| r.level == level).count()
}

/// Quotes a CSV field when needed.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn print_check_report(rows: &[ReportRow], format: &str) -> Result<()> {
    match format {
        "json" => print_json_report(rows)?,
        "csv" => print_csv_report(rows),
        _ => print_text_report(rows),
    }
    Ok(())
}

fn print_text_report(rows: &[ReportRow]) {
    println!("\n{}", "═".repeat(60));
    println!("{}", "  MODEL CHECK REPORT".bold());
    println!("{}", "═".repeat(60));

    if rows.is_empty() {
        println!("\n{} {}", "✓".green().bold(), "No violations found".green().bold());
    } else {
        println!();
        for row in rows {
            println!(
                "{} [{:>4}] {} {}: {}",
                colored_level(row.level),
                row.code,
                row.table,
                row.id,
                row.description
            );
        }
    }

    println!("\n{}", "Summary:".bold());
    println!("  Errors:   {}", count(rows, Level::Error));
    println!("  Warnings: {}", count(rows, Level::Warning));
    println!("  Info:     {}", count(rows, Level::Info));
    println!("{}", "═".repeat(60));
}

fn print_json_report(rows: &[ReportRow]) -> Result<()> {
    let violations: Vec<_> = rows
        .iter()
        .map(|r| {
            json!({
                "level": r.level.as_str(),
                "code": r.code,
                "table": r.table,
                "id": r.id,
                "column": r.column,
                "description": r.description,
            })
        })
        .collect();

    let output = json!({
        "generated_at": Utc::now().to_rfc3339(),
        "passed": count(rows, Level::Error) == 0,
        "violations": violations,
        "summary": {
            "error_count": count(rows, Level::Error),
            "warning_count": count(rows, Level::Warning),
            "info_count": count(rows, Level::Info),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_csv_report(rows: &[ReportRow]) {
    println!("level,code,table,id,column,description");
    for row in rows {
        println!(
            "{},{},{},{},{},{}",
            row.level.as_str(),
            row.code,
            csv_field(&row.table),
            row.id,
            csv_field(&row.column),
            csv_field(&row.description)
        );
    }
}

pub fn print_codes(rows: &[CodeRow], format: &str) {
    match format {
        "markdown" => {
            println!("| Code | Level | Column | Description |");
            println!("|---|---|---|---|");
            for row in rows {
                println!(
                    "| {} | {} | `{}` | {} |",
                    row.code,
                    row.level.as_str(),
                    row.column,
                    row.description.replace('|', "\\|")
                );
            }
        }
        "csv" => {
            println!("code,level,column,description");
            for row in rows {
                println!(
                    "{},{},{},{}",
                    row.code,
                    row.level.as_str(),
                    csv_field(&row.column),
                    csv_field(&row.description)
                );
            }
        }
        _ => {
            for row in rows {
                println!(
                    "{:>4} {} {}: {}",
                    row.code,
                    colored_level(row.level),
                    row.column.bold(),
                    row.description
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("channel.code"), "channel.code");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_count_by_level() {
        let row = |level| ReportRow {
            level,
            code: 1,
            table: "channel".to_string(),
            id: 1,
            column: "channel.code".to_string(),
            description: "x".to_string(),
        };
        let rows = [row(Level::Error), row(Level::Info), row(Level::Error)];
        assert_eq!(count(&rows, Level::Error), 2);
        assert_eq!(count(&rows, Level::Warning), 0);
    }
}
