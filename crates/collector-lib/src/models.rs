//! Core data models for the collector

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CollectorError;

/// Metrics CSV header
pub const METRICS_HEADER: [&str; 9] = [
    "subscription",
    "resource_group_name",
    "provider",
    "resource_name",
    "metric_name",
    "unit",
    "aggregation",
    "timestamp",
    "metric_value",
];

/// Profile TSV header
pub const PROFILE_HEADER: [&str; 8] = [
    "subscription",
    "resource_group_name",
    "provider",
    "resource_name",
    "type",
    "name",
    "value",
    "description",
];

/// Aggregation function applied to a metric over one time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    Average,
    Minimum,
    Maximum,
    Total,
    Count,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 5] = [
        Self::Average,
        Self::Minimum,
        Self::Maximum,
        Self::Total,
        Self::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Total => "total",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKind {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| CollectorError::config(format!("unknown aggregation `{}`", s)))
    }
}

/// One (subscription, resource group, provider, resource) tuple from the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceTarget<'a> {
    pub subscription: &'a str,
    pub resource_group: &'a str,
    pub provider: &'a str,
    pub resource_name: &'a str,
}

impl ResourceTarget<'_> {
    /// Fully qualified resource manager id
    pub fn resource_id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.subscription, self.resource_group, self.provider, self.resource_name
        )
    }

    /// Leading output columns shared by every row of this resource
    pub fn prefix_fields(&self) -> [&str; 4] {
        [
            self.subscription,
            self.resource_group,
            self.provider,
            self.resource_name,
        ]
    }
}

/// A single aggregated metric value for one timestamp bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub subscription: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_name: String,
    pub metric_name: String,
    pub unit: String,
    pub aggregation: AggregationKind,
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

impl MetricRow {
    pub fn fields(&self) -> [String; 9] {
        [
            self.subscription.clone(),
            self.resource_group.clone(),
            self.provider.clone(),
            self.resource_name.clone(),
            self.metric_name.clone(),
            self.unit.clone(),
            self.aggregation.to_string(),
            self.timestamp.to_rfc3339(),
            format_metric_value(self.value),
        ]
    }
}

/// Render a metric value: whole numbers keep one decimal place (`3.0`),
/// magnitudes outside `[1e-4, 1e16)` use exponent form (`1e+16`, `2.5e-05`)
pub fn format_metric_value(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_finite() && value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return scientific(value);
    }
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Exponent carries an explicit sign and at least two digits
fn scientific(value: f64) -> String {
    let rendered = format!("{:e}", value);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => rendered,
    }
}

/// Metric catalogue entry for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub name: String,
    pub unit: String,
    pub primary_aggregation: Option<AggregationKind>,
    pub supported_aggregations: Vec<AggregationKind>,
}

/// Definitions for every metric a resource exposes
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDefinitions {
    pub resource_id: String,
    pub definitions: Vec<MetricDefinition>,
}

/// Remote answer to one metric query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsResponse {
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub unit: String,
    pub timeseries: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub data: Vec<DataPoint>,
}

/// Per-bucket values; absent aggregations are `None`
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub average: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub total: Option<f64>,
    pub count: Option<f64>,
}

impl DataPoint {
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            average: None,
            minimum: None,
            maximum: None,
            total: None,
            count: None,
        }
    }

    pub fn value(&self, aggregation: AggregationKind) -> Option<f64> {
        match aggregation {
            AggregationKind::Average => self.average,
            AggregationKind::Minimum => self.minimum,
            AggregationKind::Maximum => self.maximum,
            AggregationKind::Total => self.total,
            AggregationKind::Count => self.count,
        }
    }

    pub fn with_value(mut self, aggregation: AggregationKind, value: f64) -> Self {
        let slot = match aggregation {
            AggregationKind::Average => &mut self.average,
            AggregationKind::Minimum => &mut self.minimum,
            AggregationKind::Maximum => &mut self.maximum,
            AggregationKind::Total => &mut self.total,
            AggregationKind::Count => &mut self.count,
        };
        *slot = Some(value);
        self
    }
}

/// Leaf value kept by profile flattening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Str(String),
    Int(i128),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value as i128)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Property,
    Parameter,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Property => "property",
            RecordType::Parameter => "parameter",
        }
    }
}

/// One line of profile output
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub subscription: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_name: String,
    pub record_type: RecordType,
    pub name: String,
    pub value: String,
    pub description: Option<String>,
}

impl ProfileRow {
    pub fn new(
        target: &ResourceTarget<'_>,
        record_type: RecordType,
        name: impl Into<String>,
        value: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            subscription: target.subscription.to_string(),
            resource_group: target.resource_group.to_string(),
            provider: target.provider.to_string(),
            resource_name: target.resource_name.to_string(),
            record_type,
            name: name.into(),
            value: value.into(),
            description,
        }
    }

    pub fn fields(&self) -> [&str; 8] {
        [
            &self.subscription,
            &self.resource_group,
            &self.provider,
            &self.resource_name,
            self.record_type.as_str(),
            &self.name,
            &self.value,
            self.description.as_deref().unwrap_or(""),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_parse() {
        assert_eq!(
            "average".parse::<AggregationKind>().unwrap(),
            AggregationKind::Average
        );
        assert_eq!(
            "Maximum".parse::<AggregationKind>().unwrap(),
            AggregationKind::Maximum
        );
        assert!("median".parse::<AggregationKind>().unwrap_err().is_config());
    }

    #[test]
    fn test_resource_id() {
        let target = ResourceTarget {
            subscription: "sub1",
            resource_group: "rg1",
            provider: "Microsoft.Sql/servers",
            resource_name: "srv/db",
        };
        assert_eq!(
            target.resource_id(),
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Sql/servers/srv/db"
        );
    }

    #[test]
    fn test_format_metric_value() {
        assert_eq!(format_metric_value(3.0), "3.0");
        assert_eq!(format_metric_value(0.0), "0.0");
        assert_eq!(format_metric_value(12.25), "12.25");
        assert_eq!(format_metric_value(0.0001), "0.0001");
        assert_eq!(format_metric_value(1e15), "1000000000000000.0");
    }

    #[test]
    fn test_format_metric_value_exponent_form() {
        assert_eq!(format_metric_value(1e16), "1e+16");
        assert_eq!(format_metric_value(1.5e20), "1.5e+20");
        assert_eq!(format_metric_value(0.00001), "1e-05");
        assert_eq!(format_metric_value(-2.5e-7), "-2.5e-07");
        assert_eq!(format_metric_value(1e-100), "1e-100");
    }

    #[test]
    fn test_data_point_value_lookup() {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        let point = DataPoint::new(ts).with_value(AggregationKind::Total, 42.0);
        assert_eq!(point.value(AggregationKind::Total), Some(42.0));
        assert_eq!(point.value(AggregationKind::Average), None);
    }

    #[test]
    fn test_profile_row_missing_description_is_empty_field() {
        let target = ResourceTarget {
            subscription: "s",
            resource_group: "rg",
            provider: "p",
            resource_name: "r",
        };
        let row = ProfileRow::new(&target, RecordType::Property, "sku.name", "B1", None);
        assert_eq!(
            row.fields(),
            ["s", "rg", "p", "r", "property", "sku.name", "B1", ""]
        );
    }
}
