//! Bearer tokens for the resource manager
//!
//! Credentials are ambient: either a token handed in through configuration or
//! the session of a logged-in Azure CLI.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CollectorError, Result};

/// Source of bearer tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// Fixed, pre-issued token
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Token obtained from `az account get-access-token`
pub struct AzureCliCredential {
    resource: String,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Assumed lifetime when the CLI does not report one
const FALLBACK_LIFETIME_SECS: i64 = 1800;

impl AzureCliCredential {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken> {
        debug!(resource = %self.resource, "Requesting access token from Azure CLI");
        let output = Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                &self.resource,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| CollectorError::Remote(format!("failed to run Azure CLI: {}", e)))?;

        if !output.status.success() {
            return Err(CollectorError::Remote(format!(
                "Azure CLI could not issue a token: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_cli_token(&output.stdout, Utc::now())
    }
}

fn parse_cli_token(stdout: &[u8], now: DateTime<Utc>) -> Result<CachedToken> {
    let response: CliTokenResponse = serde_json::from_slice(stdout)
        .map_err(|e| CollectorError::Remote(format!("unexpected Azure CLI output: {}", e)))?;

    let expires_at = response
        .expires_on
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(now + Duration::seconds(FALLBACK_LIFETIME_SECS));

    Ok(CachedToken {
        value: response.access_token,
        expires_at,
    })
}

#[async_trait]
impl TokenProvider for AzureCliCredential {
    async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let margin = Duration::seconds(EXPIRY_MARGIN_SECS);

        if let Some(token) = cached.as_ref() {
            if token.expires_at - margin > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}
