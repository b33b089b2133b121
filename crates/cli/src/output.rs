//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use collector_lib::models::{AggregationKind, MetricDefinition, ResourceDefinitions};
use serde_json::json;
use tabled::{settings::Style, Table, Tabled};

/// Output format for metric definitions
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the metric definitions table
#[derive(Tabled)]
struct DefinitionRow {
    #[tabled(rename = "Metric")]
    name: String,
    #[tabled(rename = "Aggregations")]
    aggregations: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

impl From<&MetricDefinition> for DefinitionRow {
    fn from(definition: &MetricDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            aggregations: join_aggregations(&definition.supported_aggregations),
            unit: definition.unit.clone(),
        }
    }
}

/// Print the definitions of every resource
pub fn print_definitions(resources: &[ResourceDefinitions], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(resources)?);
        }
        OutputFormat::Table => {
            if resources.is_empty() {
                print_warning("No resources in inventory");
            }
            for resource in resources {
                println!("{}", resource.resource_id.bold());
                if resource.definitions.is_empty() {
                    println!("{}", "No metric definitions found".yellow());
                    println!();
                    continue;
                }

                let rows: Vec<DefinitionRow> =
                    resource.definitions.iter().map(DefinitionRow::from).collect();
                let table = Table::new(rows).with(Style::rounded()).to_string();
                println!("{}", table);

                println!("{}", "Example metric query entries".dimmed());
                for definition in &resource.definitions {
                    println!("  {}", config_example(definition));
                }
                println!();
            }
        }
    }
    Ok(())
}

/// A metric query entry requesting every supported aggregation
pub fn config_example(definition: &MetricDefinition) -> String {
    let aggregations: Vec<&str> = definition
        .supported_aggregations
        .iter()
        .map(AggregationKind::as_str)
        .collect();
    json!({
        "metric_name": definition.name,
        "aggregations": aggregations,
    })
    .to_string()
}

fn join_aggregations(aggregations: &[AggregationKind]) -> String {
    aggregations
        .iter()
        .map(AggregationKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
