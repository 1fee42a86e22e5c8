//! Error types for the API client.
//!
//! These cover failures outside the HTTP exchange itself. A response
//! with an error status is never a `ClientError`; it comes back as
//! [`ApiResult::Error`](crate::ApiResult::Error).

use thiserror::Error;

/// Errors that can occur when setting up or driving the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL is unusable.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Reading or writing persisted credentials failed.
    #[error("credential store error: {0}")]
    CredentialStore(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
