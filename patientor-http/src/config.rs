//! Client configuration resolved once at startup.

use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// Environment variable overriding [`ClientConfig::api_base_url`].
pub const API_URL_VAR: &str = "PATIENTOR_API_URL";
/// Environment variable overriding [`ClientConfig::request_timeout_secs`].
pub const TIMEOUT_VAR: &str = "PATIENTOR_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL the resource paths are appended to, e.g. `http://localhost:3001/api`.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001/api".to_string(),
            request_timeout_secs: 10,
            user_agent: concat!("patientor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PATIENTOR_API_URL` and `PATIENTOR_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, HttpError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HttpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR).filter(|url| !url.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                HttpError::Config(format!("{TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn validate(&self) -> Result<(), HttpError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HttpError::Config(format!(
                "api base url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(HttpError::Config("request timeout cannot be zero".into()));
        }
        Ok(())
    }
}
