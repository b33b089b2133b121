//! Metric collection command

use anyhow::{Context, Result};
use chrono::Utc;
use collector_lib::metrics::MetricsPipeline;
use collector_lib::remote::ArmMetricsClient;
use collector_lib::settings::MetricQueryConfig;
use collector_lib::{Inventory, QuerySettings, WindowArgs};
use std::path::Path;
use tracing::warn;

use super::{arm_http, open_sink};
use crate::output::{print_definitions, print_success, OutputFormat};

/// Query metrics, or list metric definitions with `definitions`
pub async fn run(
    inventory_path: &Path,
    metric_query_path: &Path,
    output: Option<&Path>,
    definitions: bool,
    window: &WindowArgs,
    format: OutputFormat,
) -> Result<()> {
    let inventory = Inventory::load(inventory_path)
        .with_context(|| format!("Failed to load inventory {}", inventory_path.display()))?;
    let query_config = MetricQueryConfig::load(metric_query_path).with_context(|| {
        format!("Failed to load metric query {}", metric_query_path.display())
    })?;
    let settings = QuerySettings::new(window, &query_config, definitions, Utc::now())
        .context("Invalid query settings")?;

    let client = ArmMetricsClient::new(arm_http()?);
    let pipeline = MetricsPipeline::new(&client, &settings);

    if settings.definitions_only {
        if output.is_some() {
            warn!("--output is ignored when listing metric definitions");
        }
        let resources = pipeline
            .collect_definitions(&inventory)
            .await
            .context("Listing metric definitions failed")?;
        return print_definitions(&resources, format);
    }

    let sink = open_sink(output)?;
    let summary = pipeline
        .write_metrics(&inventory, sink)
        .await
        .context("Metric collection failed")?;

    if let Some(path) = output {
        print_success(&format!(
            "Wrote {} metric rows for {} resources to {}",
            summary.rows,
            summary.resources,
            path.display()
        ));
    }
    Ok(())
}
