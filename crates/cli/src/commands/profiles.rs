//! Profile collection command

use anyhow::{Context, Result};
use collector_lib::profiles::{write_profiles, ClientCache, ProfileKind};
use collector_lib::remote::{ArmProfileClient, ProfileClient};
use collector_lib::Inventory;
use std::path::Path;
use std::sync::Arc;

use super::{arm_http, open_sink};
use crate::output::print_success;

/// Collect profiles for the whole inventory as TSV
pub async fn run(inventory_path: &Path, output: Option<&Path>) -> Result<()> {
    let inventory = Inventory::load(inventory_path)
        .with_context(|| format!("Failed to load inventory {}", inventory_path.display()))?;

    let http = arm_http()?;
    let mut clients = ClientCache::new(move |kind: ProfileKind, subscription: &str| {
        Ok(Arc::new(ArmProfileClient::new(http.clone(), subscription, kind.api_version()))
            as Arc<dyn ProfileClient>)
    });

    let sink = open_sink(output)?;
    let summary = write_profiles(&inventory, &mut clients, sink)
        .await
        .context("Profile collection failed")?;

    if let Some(path) = output {
        print_success(&format!(
            "Wrote {} profile rows for {} resources to {}",
            summary.rows,
            summary.resources,
            path.display()
        ));
    }
    Ok(())
}
