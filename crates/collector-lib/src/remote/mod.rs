//! Remote service seams
//!
//! The pipelines only talk to these traits. `arm` implements them over the
//! resource manager REST API; tests substitute in-memory fakes.

mod arm;
mod auth;

pub use arm::{ArmHttp, ArmMetricsClient, ArmProfileClient, METRICS_API_VERSION};
pub use auth::{AzureCliCredential, StaticToken, TokenProvider};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{AggregationKind, MetricDefinition, MetricsResponse};
use crate::settings::{Granularity, QueryWindow};

/// One metric query: a batch of names sharing a single aggregation
#[derive(Debug, Clone, Copy)]
pub struct MetricQuery<'a> {
    pub metric_names: &'a [String],
    pub window: &'a QueryWindow,
    pub granularity: &'a Granularity,
    pub aggregation: AggregationKind,
}

/// Monitor API for metric values and definitions
#[async_trait]
pub trait MetricsService: Send + Sync {
    /// Query aggregated values for a batch of metric names on one resource
    async fn query_resource(&self, resource_id: &str, query: MetricQuery<'_>) -> Result<MetricsResponse>;

    /// List metric definitions a resource exposes
    async fn list_metric_definitions(&self, resource_id: &str) -> Result<Vec<MetricDefinition>>;
}

/// Resource manager reads scoped to one subscription and provider
///
/// `resource_path` is everything after `/providers/` in the resource id,
/// e.g. `Microsoft.Storage/storageAccounts/acct1/blobServices/default/containers`.
#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// Fetch a single resource descriptor
    async fn get(&self, resource_group: &str, resource_path: &str) -> Result<Value>;

    /// List a sub-resource collection, following paging
    async fn list(&self, resource_group: &str, resource_path: &str) -> Result<Vec<Value>>;
}
