//! Environment settings for the remote clients

use serde::Deserialize;

use crate::error::Result;

/// Prefix for environment overrides, e.g. `INVCOLLECT_MANAGEMENT_ENDPOINT`
pub const ENV_PREFIX: &str = "INVCOLLECT";

/// Collector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Resource manager base URL
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,

    /// Audience requested from the Azure CLI credential
    #[serde(default = "default_token_resource")]
    pub token_resource: String,

    /// Pre-issued bearer token; skips the Azure CLI when set
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_management_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_token_resource() -> String {
    "https://management.azure.com/".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            management_endpoint: default_management_endpoint(),
            token_resource: default_token_resource(),
            access_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl CollectorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.management_endpoint, "https://management.azure.com");
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: CollectorConfig =
            serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(config.access_token.as_deref(), Some("abc"));
        assert_eq!(config.token_resource, "https://management.azure.com/");
    }
}
