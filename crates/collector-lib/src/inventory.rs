//! Resource inventory loading and traversal
//!
//! The inventory is a three-level ordered mapping
//! `subscription -> resource group -> provider -> [resource name]`.
//! Walking it yields every resource exactly once, in file order.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{CollectorError, Result};
use crate::models::ResourceTarget;

type ProviderMap = IndexMap<String, Vec<String>>;
type ResourceGroupMap = IndexMap<String, ProviderMap>;

/// Read-only resource inventory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    subscriptions: IndexMap<String, ResourceGroupMap>,
}

impl Inventory {
    /// Load and validate an inventory JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CollectorError::config(format!(
                "failed to read inventory file {}: {}",
                path.display(),
                e
            ))
        })?;
        let inventory = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            resources = inventory.resource_count(),
            "Loaded inventory"
        );
        Ok(inventory)
    }

    /// Parse and validate inventory JSON (e.g. for tests)
    pub fn from_json(s: &str) -> Result<Self> {
        let inventory: Inventory = serde_json::from_str(s)
            .map_err(|e| CollectorError::config(format!("invalid inventory: {}", e)))?;
        inventory.validate()?;
        Ok(inventory)
    }

    fn validate(&self) -> Result<()> {
        for (subscription, groups) in &self.subscriptions {
            ensure_non_empty(subscription, "subscription id")?;
            for (group, providers) in groups {
                ensure_non_empty(group, "resource group name")?;
                for (provider, resources) in providers {
                    ensure_non_empty(provider, "provider")?;
                    for resource in resources {
                        ensure_non_empty(resource, "resource name")?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Lazily enumerate every resource in insertion order
    pub fn walk(&self) -> impl Iterator<Item = ResourceTarget<'_>> + '_ {
        self.subscriptions.iter().flat_map(|(subscription, groups)| {
            groups.iter().flat_map(move |(resource_group, providers)| {
                providers.iter().flat_map(move |(provider, resources)| {
                    resources.iter().map(move |resource_name| ResourceTarget {
                        subscription,
                        resource_group,
                        provider,
                        resource_name,
                    })
                })
            })
        })
    }

    /// Distinct providers in first-seen order
    pub fn providers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for groups in self.subscriptions.values() {
            for providers in groups.values() {
                for provider in providers.keys() {
                    if !seen.contains(&provider.as_str()) {
                        seen.push(provider);
                    }
                }
            }
        }
        seen
    }

    pub fn resource_count(&self) -> usize {
        self.subscriptions
            .values()
            .flat_map(|groups| groups.values())
            .flat_map(|providers| providers.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_count() == 0
    }
}

fn ensure_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CollectorError::config(format!(
            "inventory contains an empty {}",
            what
        )));
    }
    Ok(())
}
