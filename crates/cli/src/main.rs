//! Cloud inventory collector CLI
//!
//! Collects monitoring metrics and configuration profiles for every resource
//! listed in an inventory file, and converts the results to spreadsheets.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use collector_lib::observability::{init_tracing, LogFormat};
use collector_lib::WindowArgs;
use commands::{convert, metrics, profiles};
use std::path::PathBuf;

/// Cloud inventory collector
#[derive(Parser)]
#[command(name = "invcollect")]
#[command(author, version, about = "Cloud inventory metrics and profile collector", long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query monitoring metrics for every resource in the inventory
    Metrics {
        /// Inventory JSON file
        #[arg(long, short)]
        inventory: PathBuf,

        /// Metric query JSON file
        #[arg(long, short = 'm')]
        metric_query: PathBuf,

        /// Output CSV file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// List metric definitions instead of querying values
        #[arg(long, short = 'd')]
        definitions: bool,

        /// Window start, RFC 3339 with offset
        #[arg(long, short = 's')]
        start_time: Option<String>,

        /// Window end, RFC 3339 with offset (defaults to now)
        #[arg(long, short = 'e')]
        end_time: Option<String>,

        /// Query the last N days; overrides --start-time
        #[arg(long, short = 'l')]
        last_n_days: Option<u32>,

        /// Format for metric definitions
        #[arg(long, short = 'f', default_value = "table")]
        format: output::OutputFormat,
    },

    /// Collect configuration profiles as TSV
    Profiles {
        /// Inventory JSON file
        #[arg(long, short)]
        inventory: PathBuf,

        /// Output TSV file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Convert a CSV or TSV file to xlsx
    Convert {
        /// Input .csv or .tsv file
        #[arg(long, short)]
        input: PathBuf,

        /// Output .xlsx file
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format.into());

    match cli.command {
        Commands::Metrics {
            inventory,
            metric_query,
            output,
            definitions,
            start_time,
            end_time,
            last_n_days,
            format,
        } => {
            let window = WindowArgs {
                last_n_days,
                start_time,
                end_time,
            };
            metrics::run(
                &inventory,
                &metric_query,
                output.as_deref(),
                definitions,
                &window,
                format,
            )
            .await?;
        }
        Commands::Profiles { inventory, output } => {
            profiles::run(&inventory, output.as_deref()).await?;
        }
        Commands::Convert { input, output } => {
            convert::run(&input, &output)?;
        }
    }

    Ok(())
}
