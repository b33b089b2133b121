//! Metric query settings: time window, granularity and metric groupings

use chrono::{DateTime, Duration, FixedOffset, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{CollectorError, Result};
use crate::models::AggregationKind;

/// Window length used when neither `last_n_days` nor a start time is given
pub const DEFAULT_LAST_N_DAYS: u32 = 14;

/// Raw metric query file
#[derive(Debug, Clone, Deserialize)]
pub struct MetricQueryConfig {
    pub granularity: GranularityConfig,
    pub queries: IndexMap<String, Vec<MetricQuerySpec>>,
}

impl MetricQueryConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CollectorError::config(format!(
                "failed to read metric query file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| CollectorError::config(format!("invalid metric query config: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GranularityConfig {
    #[serde(rename = "type")]
    pub unit: String,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricQuerySpec {
    pub metric_name: String,
    pub aggregations: Vec<String>,
}

/// Window-related command line arguments
#[derive(Debug, Clone, Default)]
pub struct WindowArgs {
    pub last_n_days: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Query time window with offset-aware bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl QueryWindow {
    /// Resolve the window: `last_n_days` > `start_time` > default, `end_time` or now
    pub fn resolve(args: &WindowArgs, now: DateTime<Utc>) -> Result<Self> {
        let now = now.fixed_offset();

        let start = if let Some(days) = args.last_n_days {
            days_before(now, days)?
        } else if let Some(start) = &args.start_time {
            parse_timestamp(start, "start time")?
        } else {
            days_before(now, DEFAULT_LAST_N_DAYS)?
        };

        let end = match &args.end_time {
            Some(end) => parse_timestamp(end, "end time")?,
            None => now,
        };

        if end < start {
            warn!(start = %start, end = %end, "Query window ends before it starts, results will be empty");
        }

        Ok(Self { start, end })
    }

    /// ISO-8601 interval form `start/end`
    pub fn timespan(&self) -> String {
        format!("{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

fn days_before(now: DateTime<FixedOffset>, days: u32) -> Result<DateTime<FixedOffset>> {
    Duration::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| CollectorError::config(format!("window of {} days is out of range", days)))
}

fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| {
        CollectorError::config(format!(
            "invalid {} `{}` (expected ISO-8601 with offset, e.g. 2023-01-01T00:00:00+08:00): {}",
            what, value, e
        ))
    })
}

/// Bucket size for metric aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granularity(Duration);

impl Granularity {
    /// Build from a `{unit: count}` pair
    pub fn from_unit(unit: &str, count: i64) -> Result<Self> {
        if count <= 0 {
            return Err(CollectorError::config(format!(
                "granularity count must be positive, got {}",
                count
            )));
        }

        let duration = match unit {
            "microseconds" => Some(Duration::microseconds(count)),
            "milliseconds" => Duration::try_milliseconds(count),
            "seconds" => Duration::try_seconds(count),
            "minutes" => Duration::try_minutes(count),
            "hours" => Duration::try_hours(count),
            "days" => Duration::try_days(count),
            "weeks" => Duration::try_weeks(count),
            other => {
                return Err(CollectorError::config(format!(
                    "unrecognized granularity unit `{}`",
                    other
                )))
            }
        };

        duration.map(Self).ok_or_else(|| {
            CollectorError::config(format!("granularity {} {} is out of range", count, unit))
        })
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// ISO-8601 duration, e.g. `PT5M`, `PT1H`, `P1D`
    pub fn to_iso8601(&self) -> String {
        let total_secs = self.0.num_seconds();
        let millis = self.0.num_milliseconds() - total_secs * 1000;

        if millis == 0 && total_secs > 0 && total_secs % 86_400 == 0 {
            return format!("P{}D", total_secs / 86_400);
        }

        let days = total_secs / 86_400;
        let hours = (total_secs % 86_400) / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        let mut out = String::from("P");
        if days > 0 {
            out.push_str(&format!("{}D", days));
        }
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if seconds > 0 || millis > 0 || out.ends_with('T') {
            if millis > 0 {
                out.push_str(&format!("{}.{:03}S", seconds, millis));
            } else {
                out.push_str(&format!("{}S", seconds));
            }
        }
        out
    }
}

/// Metric names grouped by aggregation, per provider
pub type MetricsByAggregation = IndexMap<String, IndexMap<AggregationKind, Vec<String>>>;

/// Effective settings for one metrics run
#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub window: QueryWindow,
    pub granularity: Granularity,
    pub metrics_by_aggregation: MetricsByAggregation,
    pub definitions_only: bool,
}

impl QuerySettings {
    pub fn new(
        args: &WindowArgs,
        config: &MetricQueryConfig,
        definitions_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let window = QueryWindow::resolve(args, now)?;
        let granularity = Granularity::from_unit(&config.granularity.unit, config.granularity.count)?;
        let metrics_by_aggregation = group_metrics(config)?;

        info!(
            start = %window.start.to_rfc3339(),
            end = %window.end.to_rfc3339(),
            granularity = %granularity.to_iso8601(),
            providers = metrics_by_aggregation.len(),
            "Using query window"
        );

        Ok(Self {
            window,
            granularity,
            metrics_by_aggregation,
            definitions_only,
        })
    }

    /// Aggregation groups for a provider; unconfigured providers are an error
    pub fn aggregations_for(&self, provider: &str) -> Result<&IndexMap<AggregationKind, Vec<String>>> {
        self.metrics_by_aggregation
            .get(provider)
            .ok_or_else(|| CollectorError::UnconfiguredProvider(provider.to_string()))
    }
}

/// Append each metric name once per requested aggregation, keeping config order
pub fn group_metrics(config: &MetricQueryConfig) -> Result<MetricsByAggregation> {
    let mut grouped = MetricsByAggregation::new();
    for (provider, metrics) in &config.queries {
        let by_aggregation = grouped.entry(provider.clone()).or_default();
        for metric in metrics {
            for aggregation in &metric.aggregations {
                let kind: AggregationKind = aggregation.parse()?;
                by_aggregation
                    .entry(kind)
                    .or_default()
                    .push(metric.metric_name.clone());
            }
        }
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    const QUERY_CONFIG: &str = r#"{
        "granularity": {"type": "minutes", "count": 5},
        "queries": {
            "Microsoft.Sql/servers": [
                {"metric_name": "cpu_percent", "aggregations": ["average", "maximum"]},
                {"metric_name": "storage", "aggregations": ["maximum"]},
                {"metric_name": "connection_failed", "aggregations": ["total"]}
            ],
            "Microsoft.Storage/storageAccounts": [
                {"metric_name": "UsedCapacity", "aggregations": ["average"]}
            ]
        }
    }"#;

    #[test]
    fn test_granularity_minutes() {
        let g = Granularity::from_unit("minutes", 5).unwrap();
        assert_eq!(g.duration(), Duration::minutes(5));
        assert_eq!(g.to_iso8601(), "PT5M");
    }

    #[test]
    fn test_granularity_iso_forms() {
        assert_eq!(Granularity::from_unit("hours", 1).unwrap().to_iso8601(), "PT1H");
        assert_eq!(Granularity::from_unit("days", 1).unwrap().to_iso8601(), "P1D");
        assert_eq!(Granularity::from_unit("weeks", 1).unwrap().to_iso8601(), "P7D");
        assert_eq!(Granularity::from_unit("minutes", 90).unwrap().to_iso8601(), "PT1H30M");
        assert_eq!(Granularity::from_unit("seconds", 30).unwrap().to_iso8601(), "PT30S");
    }

    #[test]
    fn test_granularity_bogus_unit() {
        let err = Granularity::from_unit("bogus", 1).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_granularity_non_positive_count() {
        assert!(Granularity::from_unit("minutes", 0).unwrap_err().is_config());
        assert!(Granularity::from_unit("minutes", -5).unwrap_err().is_config());
    }

    #[test]
    fn test_window_last_n_days() {
        let args = WindowArgs {
            last_n_days: Some(7),
            ..Default::default()
        };
        let window = QueryWindow::resolve(&args, fixed_now()).unwrap();

        assert_eq!(window.end, fixed_now().fixed_offset());
        assert_eq!(window.end - window.start, Duration::days(7));
        assert!(window.end > window.start);
    }

    #[test]
    fn test_window_last_n_days_out_of_range() {
        let args = WindowArgs {
            last_n_days: Some(u32::MAX),
            ..Default::default()
        };
        let err = QueryWindow::resolve(&args, fixed_now()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_window_last_n_days_beats_start_time() {
        let args = WindowArgs {
            last_n_days: Some(2),
            start_time: Some("2020-01-01T00:00:00+00:00".into()),
            end_time: None,
        };
        let window = QueryWindow::resolve(&args, fixed_now()).unwrap();
        assert_eq!(window.end - window.start, Duration::days(2));
    }

    #[test]
    fn test_window_explicit_bounds_keep_offset() {
        let args = WindowArgs {
            last_n_days: None,
            start_time: Some("2023-01-01T00:00:00+08:00".into()),
            end_time: Some("2023-02-01T00:00:00+08:00".into()),
        };
        let window = QueryWindow::resolve(&args, fixed_now()).unwrap();

        assert_eq!(window.start.to_rfc3339(), "2023-01-01T00:00:00+08:00");
        assert_eq!(
            window.timespan(),
            "2023-01-01T00:00:00+08:00/2023-02-01T00:00:00+08:00"
        );
    }

    #[test]
    fn test_window_default_length() {
        let window = QueryWindow::resolve(&WindowArgs::default(), fixed_now()).unwrap();
        assert_eq!(
            window.end - window.start,
            Duration::days(i64::from(DEFAULT_LAST_N_DAYS))
        );
    }

    #[test]
    fn test_window_rejects_naive_timestamp() {
        let args = WindowArgs {
            start_time: Some("2023-01-01T00:00:00".into()),
            ..Default::default()
        };
        assert!(QueryWindow::resolve(&args, fixed_now()).unwrap_err().is_config());
    }

    #[test]
    fn test_window_end_before_start_is_not_an_error() {
        let args = WindowArgs {
            last_n_days: None,
            start_time: Some("2024-02-01T00:00:00+00:00".into()),
            end_time: Some("2024-01-01T00:00:00+00:00".into()),
        };
        let window = QueryWindow::resolve(&args, fixed_now()).unwrap();
        assert!(window.end < window.start);
    }

    #[test]
    fn test_group_metrics_by_aggregation() {
        let config = MetricQueryConfig::from_json(QUERY_CONFIG).unwrap();
        let grouped = group_metrics(&config).unwrap();

        let sql = &grouped["Microsoft.Sql/servers"];
        let kinds: Vec<_> = sql.keys().copied().collect();
        assert_eq!(
            kinds,
            vec![
                AggregationKind::Average,
                AggregationKind::Maximum,
                AggregationKind::Total
            ]
        );
        assert_eq!(sql[&AggregationKind::Average], vec!["cpu_percent"]);
        assert_eq!(sql[&AggregationKind::Maximum], vec!["cpu_percent", "storage"]);
        assert_eq!(sql[&AggregationKind::Total], vec!["connection_failed"]);
    }

    #[test]
    fn test_group_metrics_rejects_unknown_aggregation() {
        let config = MetricQueryConfig::from_json(
            r#"{"granularity": {"type": "hours", "count": 1},
                "queries": {"p": [{"metric_name": "m", "aggregations": ["p99"]}]}}"#,
        )
        .unwrap();
        assert!(group_metrics(&config).unwrap_err().is_config());
    }

    #[test]
    fn test_unconfigured_provider_lookup_fails() {
        let config = MetricQueryConfig::from_json(QUERY_CONFIG).unwrap();
        let settings =
            QuerySettings::new(&WindowArgs::default(), &config, false, fixed_now()).unwrap();

        assert!(settings.aggregations_for("Microsoft.Sql/servers").is_ok());
        let err = settings.aggregations_for("Microsoft.Web/sites").unwrap_err();
        assert!(matches!(err, CollectorError::UnconfiguredProvider(p) if p == "Microsoft.Web/sites"));
    }

    #[test]
    fn test_query_config_missing_field() {
        let err = MetricQueryConfig::from_json(r#"{"queries": {}}"#).unwrap_err();
        assert!(err.is_config());
    }
}
