//! Logging setup and run accounting
//!
//! Logs go to stderr so stdout stays free for collected data.

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber; `RUST_LOG` wins over `verbose`
pub fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Counters for one collection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub resources: usize,
    pub remote_calls: usize,
    pub clients: usize,
    pub rows: usize,
}

impl RunSummary {
    pub fn log(&self, pipeline: &str) {
        info!(
            event = "run_completed",
            pipeline = %pipeline,
            resources = self.resources,
            remote_calls = self.remote_calls,
            clients = self.clients,
            rows = self.rows,
            "Collection finished"
        );
    }
}
