//! API client library for the Gigboard marketplace.
//!
//! Provides the [`ApiClient`] every marketplace call goes through, the
//! [`CredentialStore`] it keeps tokens in, and session and marketplace
//! services built on top of it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gigboard_client::{ApiClient, ApiResult, ClientConfig, Marketplace, MemoryCredentialStore};
//!
//! async fn list_jobs() {
//!     let client = ApiClient::new(ClientConfig::default(), Arc::new(MemoryCredentialStore::new()));
//!     match Marketplace::new(client).jobs().await {
//!         ApiResult::Data(jobs) => println!("{} jobs", jobs.map(|j| j.len()).unwrap_or(0)),
//!         ApiResult::Error(message) => eprintln!("{}", message),
//!     }
//! }
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod marketplace;
pub mod result;
pub mod translate;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::AuthService;
pub use config::ClientConfig;
pub use credentials::{
    default_credentials_path, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use error::ClientError;
pub use http::{ApiClient, UploadMethod};
pub use marketplace::{Attachment, Marketplace};
pub use result::ApiResult;
pub use translate::ErrorTranslationTable;
pub use transport::{HttpRequest, HttpResponse, MultipartForm, ReqwestTransport, Transport};
