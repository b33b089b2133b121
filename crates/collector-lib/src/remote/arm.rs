//! Resource manager REST clients
//!
//! `ArmHttp` owns the HTTP client, base URL and credential. The metrics and
//! profile clients are thin views over it that know their own paths and
//! api-versions.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{MetricQuery, MetricsService, ProfileClient, TokenProvider};
use crate::config::CollectorConfig;
use crate::error::{CollectorError, Result};
use crate::models::{DataPoint, Metric, MetricDefinition, MetricsResponse, TimeSeries};

/// api-version of the monitor metrics endpoints
pub const METRICS_API_VERSION: &str = "2018-01-01";

/// Authenticated HTTP access to the resource manager
pub struct ArmHttp {
    client: Client,
    base_url: Url,
    credential: Arc<dyn TokenProvider>,
}

impl ArmHttp {
    pub fn new(
        endpoint: &str,
        timeout: Duration,
        credential: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(endpoint).map_err(|e| {
            CollectorError::config(format!("invalid management endpoint `{}`: {}", endpoint, e))
        })?;

        Ok(Self {
            client,
            base_url,
            credential,
        })
    }

    pub fn from_config(config: &CollectorConfig, credential: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::new(
            &config.management_endpoint,
            Duration::from_secs(config.request_timeout_secs),
            credential,
        )
    }

    /// Build an absolute URL from a resource path and query pairs
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| CollectorError::Remote(format!("invalid resource path `{}`: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET a URL and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.credential.token().await?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollectorError::RemoteStatus {
                status,
                url: url.to_string(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CollectorError::Remote(format!("failed to decode response from {}: {}", url, e)))
    }
}

#[derive(Deserialize)]
struct LocalizableString {
    value: String,
}

#[derive(Deserialize)]
struct MetricsBody {
    #[serde(default)]
    value: Vec<MetricBody>,
}

#[derive(Deserialize)]
struct MetricBody {
    name: LocalizableString,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    timeseries: Vec<TimeSeriesBody>,
}

#[derive(Deserialize)]
struct TimeSeriesBody {
    #[serde(default)]
    data: Vec<PointBody>,
}

#[derive(Deserialize)]
struct PointBody {
    #[serde(rename = "timeStamp")]
    time_stamp: DateTime<FixedOffset>,
    average: Option<f64>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    total: Option<f64>,
    count: Option<f64>,
}

impl From<MetricsBody> for MetricsResponse {
    fn from(body: MetricsBody) -> Self {
        let metrics = body
            .value
            .into_iter()
            .map(|m| Metric {
                name: m.name.value,
                unit: m.unit,
                timeseries: m
                    .timeseries
                    .into_iter()
                    .map(|ts| TimeSeries {
                        data: ts
                            .data
                            .into_iter()
                            .map(|p| DataPoint {
                                timestamp: p.time_stamp,
                                average: p.average,
                                minimum: p.minimum,
                                maximum: p.maximum,
                                total: p.total,
                                count: p.count,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        MetricsResponse { metrics }
    }
}

#[derive(Deserialize)]
struct DefinitionsBody {
    #[serde(default)]
    value: Vec<DefinitionBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionBody {
    name: LocalizableString,
    #[serde(default)]
    unit: String,
    primary_aggregation_type: Option<String>,
    #[serde(default)]
    supported_aggregation_types: Vec<String>,
}

impl From<DefinitionBody> for MetricDefinition {
    fn from(body: DefinitionBody) -> Self {
        // "None" and other non-aggregations are not queryable, drop them
        MetricDefinition {
            name: body.name.value,
            unit: body.unit,
            primary_aggregation: body
                .primary_aggregation_type
                .and_then(|a| a.parse().ok()),
            supported_aggregations: body
                .supported_aggregation_types
                .iter()
                .filter_map(|a| a.parse().ok())
                .collect(),
        }
    }
}

/// Monitor metrics client
pub struct ArmMetricsClient {
    http: Arc<ArmHttp>,
}

impl ArmMetricsClient {
    pub fn new(http: Arc<ArmHttp>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MetricsService for ArmMetricsClient {
    async fn query_resource(&self, resource_id: &str, query: MetricQuery<'_>) -> Result<MetricsResponse> {
        let path = format!("{}/providers/microsoft.insights/metrics", resource_id);
        let timespan = query.window.timespan();
        let interval = query.granularity.to_iso8601();
        let names = query.metric_names.join(",");

        let url = self.http.url(
            &path,
            &[
                ("api-version", METRICS_API_VERSION),
                ("timespan", timespan.as_str()),
                ("interval", interval.as_str()),
                ("metricnames", names.as_str()),
                ("aggregation", query.aggregation.as_str()),
            ],
        )?;

        let body: MetricsBody = self.http.get_json(url).await?;
        Ok(body.into())
    }

    async fn list_metric_definitions(&self, resource_id: &str) -> Result<Vec<MetricDefinition>> {
        let path = format!("{}/providers/microsoft.insights/metricDefinitions", resource_id);
        let url = self.http.url(&path, &[("api-version", METRICS_API_VERSION)])?;

        let body: DefinitionsBody = self.http.get_json(url).await?;
        Ok(body.value.into_iter().map(MetricDefinition::from).collect())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    value: Vec<Value>,
    next_link: Option<String>,
}

/// Resource manager client bound to one subscription and api-version
pub struct ArmProfileClient {
    http: Arc<ArmHttp>,
    subscription_id: String,
    api_version: &'static str,
}

impl ArmProfileClient {
    pub fn new(http: Arc<ArmHttp>, subscription_id: impl Into<String>, api_version: &'static str) -> Self {
        Self {
            http,
            subscription_id: subscription_id.into(),
            api_version,
        }
    }

    fn resource_url(&self, resource_group: &str, resource_path: &str) -> Result<Url> {
        let path = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            self.subscription_id, resource_group, resource_path
        );
        self.http.url(&path, &[("api-version", self.api_version)])
    }
}

#[async_trait]
impl ProfileClient for ArmProfileClient {
    async fn get(&self, resource_group: &str, resource_path: &str) -> Result<Value> {
        let url = self.resource_url(resource_group, resource_path)?;
        self.http.get_json(url).await
    }

    async fn list(&self, resource_group: &str, resource_path: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(self.resource_url(resource_group, resource_path)?);

        while let Some(url) = next.take() {
            let page: ListPage = self.http.get_json(url).await?;
            items.extend(page.value);
            if let Some(link) = page.next_link {
                let url = Url::parse(&link).map_err(|e| {
                    CollectorError::Remote(format!("invalid nextLink `{}`: {}", link, e))
                })?;
                next = Some(url);
            }
        }

        Ok(items)
    }
}
