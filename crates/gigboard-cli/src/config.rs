//! CLI configuration.

use std::path::PathBuf;

use gigboard_client::{default_credentials_path, ClientConfig, ClientError};

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend connection settings.
    pub client: ClientConfig,

    /// Where tokens and the cached user are persisted.
    pub credentials_path: PathBuf,
}

impl Config {
    /// Combine command line values (clap has already applied env fallbacks).
    pub fn resolve(api_url: &str, credentials: Option<PathBuf>) -> Result<Self, ClientError> {
        let client = ClientConfig::new(api_url)?;
        let credentials_path = match credentials.or_else(default_credentials_path) {
            Some(path) => path,
            None => {
                return Err(ClientError::CredentialStore(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no config directory for this user; pass --credentials",
                )))
            }
        };
        Ok(Self {
            client,
            credentials_path,
        })
    }
}
