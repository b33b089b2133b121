//! Error taxonomy for collection runs
//!
//! None of these are retried or swallowed: every error aborts the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    /// Malformed inventory or query config, bad timestamps, bad env settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Inventory references a provider the metric query config does not list
    #[error("provider `{0}` is not configured in the metric query file")]
    UnconfiguredProvider(String),

    /// Profile extraction requested for a provider with no handler
    #[error("no profile handler registered for provider `{0}`")]
    UnsupportedProvider(String),

    /// Transport-level failure talking to the remote service
    #[error("remote service error: {0}")]
    Remote(String),

    /// Remote service answered with a non-success status
    #[error("remote service returned {status} for {url}: {body}")]
    RemoteStatus { status: u16, url: String, body: String },

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CollectorError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for every variant that stems from bad input rather than the remote side
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UnconfiguredProvider(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::RemoteStatus { .. })
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<csv::Error> for CollectorError {
    fn from(err: csv::Error) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CollectorError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_grouping() {
        assert!(CollectorError::config("bad").is_config());
        assert!(CollectorError::UnconfiguredProvider("p".into()).is_config());
        assert!(!CollectorError::UnsupportedProvider("p".into()).is_config());
        assert!(CollectorError::Remote("boom".into()).is_remote());
        assert!(CollectorError::RemoteStatus {
            status: 429,
            url: "https://example".into(),
            body: String::new(),
        }
        .is_remote());
    }

    #[test]
    fn test_unconfigured_provider_message() {
        let err = CollectorError::UnconfiguredProvider("Microsoft.Web/sites".into());
        assert_eq!(
            err.to_string(),
            "provider `Microsoft.Web/sites` is not configured in the metric query file"
        );
    }
}
