//! Batched metric queries for a single resource

use tracing::debug;

use crate::error::Result;
use crate::models::{AggregationKind, MetricRow, MetricsResponse, ResourceTarget};
use crate::remote::{MetricQuery, MetricsService};
use crate::settings::QuerySettings;

/// Maximum number of metric names the monitor API accepts per call
pub const METRIC_BATCH_LIMIT: usize = 20;

/// Issues batched queries for one resource and extracts per-bucket rows
pub struct MetricFetcher<'a, S: MetricsService + ?Sized> {
    service: &'a S,
    settings: &'a QuerySettings,
    batch_limit: usize,
    calls: usize,
}

impl<'a, S: MetricsService + ?Sized> MetricFetcher<'a, S> {
    pub fn new(service: &'a S, settings: &'a QuerySettings) -> Self {
        Self {
            service,
            settings,
            batch_limit: METRIC_BATCH_LIMIT,
            calls: 0,
        }
    }

    /// Override the per-call name limit (clamped to at least one)
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    /// Number of remote calls issued so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Query every configured aggregation group for a resource
    ///
    /// Names are split into consecutive chunks of at most `batch_limit`,
    /// one remote call per chunk, in configuration order.
    pub async fn fetch(&mut self, target: &ResourceTarget<'_>) -> Result<Vec<MetricRow>> {
        let groups = self.settings.aggregations_for(target.provider)?;
        let resource_id = target.resource_id();
        let mut rows = Vec::new();

        for (aggregation, metric_names) in groups {
            for chunk in metric_names.chunks(self.batch_limit) {
                debug!(
                    resource_id = %resource_id,
                    aggregation = %aggregation,
                    metrics = chunk.len(),
                    "Querying metrics batch"
                );
                let query = MetricQuery {
                    metric_names: chunk,
                    window: &self.settings.window,
                    granularity: &self.settings.granularity,
                    aggregation: *aggregation,
                };
                let response = self.service.query_resource(&resource_id, query).await?;
                self.calls += 1;
                rows.extend(extract_rows(target, *aggregation, &response));
            }
        }

        Ok(rows)
    }
}

/// Convert a response into rows for buckets where the aggregation is present
pub fn extract_rows(
    target: &ResourceTarget<'_>,
    aggregation: AggregationKind,
    response: &MetricsResponse,
) -> Vec<MetricRow> {
    let mut rows = Vec::new();
    for metric in &response.metrics {
        let Some(series) = metric.timeseries.first() else {
            continue;
        };
        for point in &series.data {
            if let Some(value) = point.value(aggregation) {
                rows.push(MetricRow {
                    subscription: target.subscription.to_string(),
                    resource_group: target.resource_group.to_string(),
                    provider: target.provider.to_string(),
                    resource_name: target.resource_name.to_string(),
                    metric_name: metric.name.clone(),
                    unit: metric.unit.clone(),
                    aggregation,
                    timestamp: point.timestamp,
                    value,
                });
            }
        }
    }
    rows
}
