mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "modelcheck")]
#[command(version, about = "Hydraulic model checker CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checks against a model snapshot
    Check {
        /// Path to the model snapshot (YAML, TOML or JSON)
        snapshot: String,

        /// Path to a checker configuration file (YAML or TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Minimum level to report: info, warning, error
        #[arg(short, long)]
        level: Option<String>,

        /// Error codes to skip (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        ignore: Vec<u32>,

        /// Output format: text, json, csv
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Stop after this many violations
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the checks with their error codes
    Codes {
        /// Output format: text, markdown, csv
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // reports go to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Check {
            snapshot,
            config,
            level,
            ignore,
            format,
            limit,
        } => commands::check::execute(
            &snapshot,
            config.as_deref(),
            level.as_deref(),
            &ignore,
            &format,
            limit,
        ),

        Commands::Codes { format } => commands::codes::execute(&format),
    }
}
