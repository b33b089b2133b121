//! Subcommand implementations

pub mod convert;
pub mod metrics;
pub mod profiles;

use anyhow::{Context, Result};
use collector_lib::config::CollectorConfig;
use collector_lib::remote::{ArmHttp, AzureCliCredential, StaticToken, TokenProvider};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Build the shared resource manager transport from environment settings
pub fn arm_http() -> Result<Arc<ArmHttp>> {
    let config = CollectorConfig::load().context("Failed to load environment configuration")?;

    let credential: Arc<dyn TokenProvider> = match &config.access_token {
        Some(token) => {
            debug!("Using access token from environment");
            Arc::new(StaticToken::new(token.clone()))
        }
        None => Arc::new(AzureCliCredential::new(config.token_resource.clone())),
    };

    let http = ArmHttp::from_config(&config, credential)
        .with_context(|| format!("Invalid management endpoint: {}", config.management_endpoint))?;
    Ok(Arc::new(http))
}

/// Buffered file when a path is given, stdout otherwise
pub fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
