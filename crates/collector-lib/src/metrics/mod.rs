//! Metrics pipeline
//!
//! Walks the inventory, queries every resource in configured batches and
//! writes all rows as one globally sorted CSV block, so output is stable
//! regardless of how the remote service orders its answers.

mod fetcher;


pub use fetcher::{extract_rows, MetricFetcher, METRIC_BATCH_LIMIT};

use std::io::Write;
use tracing::{debug, info};

use crate::error::Result;
use crate::inventory::Inventory;
use crate::models::{ResourceDefinitions, METRICS_HEADER};
use crate::observability::RunSummary;
use crate::output::{Delimiter, DelimitedWriter};
use crate::remote::MetricsService;
use crate::settings::QuerySettings;

/// Collects metric rows for a whole inventory
pub struct MetricsPipeline<'a, S: MetricsService + ?Sized> {
    service: &'a S,
    settings: &'a QuerySettings,
    batch_limit: usize,
}

impl<'a, S: MetricsService + ?Sized> MetricsPipeline<'a, S> {
    pub fn new(service: &'a S, settings: &'a QuerySettings) -> Self {
        Self {
            service,
            settings,
            batch_limit: METRIC_BATCH_LIMIT,
        }
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    /// Query every resource and write the sorted CSV to `out`
    pub async fn write_metrics<W: Write>(&self, inventory: &Inventory, out: W) -> Result<RunSummary> {
        let mut writer = DelimitedWriter::new(out, Delimiter::Comma, &METRICS_HEADER)?;
        let mut fetcher = MetricFetcher::new(self.service, self.settings).with_batch_limit(self.batch_limit);
        let mut summary = RunSummary::default();
        let mut lines = Vec::new();

        for target in inventory.walk() {
            let rows = fetcher.fetch(&target).await?;
            debug!(
                resource_id = %target.resource_id(),
                rows = rows.len(),
                "Collected metrics"
            );
            summary.resources += 1;
            lines.extend(rows.iter().map(|row| writer.format_row(&row.fields())));
        }

        lines.sort();
        writer.write_lines(&lines)?;
        writer.flush()?;

        summary.remote_calls = fetcher.calls();
        summary.rows = lines.len();
        summary.log("metrics");
        Ok(summary)
    }

    /// List metric definitions for every resource instead of querying values
    pub async fn collect_definitions(&self, inventory: &Inventory) -> Result<Vec<ResourceDefinitions>> {
        let mut out = Vec::with_capacity(inventory.resource_count());
        for target in inventory.walk() {
            let resource_id = target.resource_id();
            let definitions = self.service.list_metric_definitions(&resource_id).await?;
            info!(
                resource_id = %resource_id,
                definitions = definitions.len(),
                "Listed metric definitions"
            );
            out.push(ResourceDefinitions {
                resource_id,
                definitions,
            });
        }
        Ok(out)
    }
}
