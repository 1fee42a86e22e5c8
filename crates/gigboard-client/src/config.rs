//! Client configuration.

use crate::error::ClientError;

/// Origin of a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin every request path is appended to. No trailing slash.
    pub base_url: String,
}

impl ClientConfig {
    /// Create a configuration for the given origin.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let has_host = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: trimmed.to_string(),
        })
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}
