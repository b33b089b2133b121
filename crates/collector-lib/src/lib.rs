//! Collector library for cloud inventory telemetry and configuration
//!
//! This crate provides the core functionality for:
//! - Walking a subscription / resource group / provider inventory
//! - Batched metric queries against the monitor API
//! - Flattening resource configuration into key/value profile rows
//! - Delimited output and spreadsheet conversion
//! - Remote clients, credentials and logging setup

pub mod config;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod output;
pub mod profiles;
pub mod remote;
pub mod settings;
pub mod spreadsheet;

pub use error::{CollectorError, Result};
pub use inventory::Inventory;
pub use models::*;
pub use observability::RunSummary;
pub use settings::{QuerySettings, QueryWindow, WindowArgs};
