//! Credential storage.
//!
//! The client never touches ambient global state. Whatever holds the
//! tokens is injected as an [`CredentialStore`] and only read or written
//! through it. Three entries are tracked: the access token, the refresh
//! token and the cached user (a JSON document). They are removed together.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use gigboard_core::Session;

/// Durable access to the current token pair and cached user.
///
/// Reads are synchronous and never fail: anything unreadable is reported
/// as absent. Writes that cannot be persisted are logged and dropped.
pub trait CredentialStore: Send + Sync {
    /// Current access token, if any.
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if any.
    fn refresh_token(&self) -> Option<String>;

    /// Overwrite both tokens. Used after login, signup and OAuth.
    fn set_tokens(&self, access: &str, refresh: &str);

    /// Overwrite only the access token. Used after a refresh.
    fn set_access(&self, access: &str);

    /// Cached user document as stored.
    fn cached_user(&self) -> Option<String>;

    /// Replace the cached user document.
    fn set_cached_user(&self, user_json: &str);

    /// Remove the access token, refresh token and cached user.
    fn clear(&self);

    /// Snapshot of both tokens.
    fn session(&self) -> Session {
        Session {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
        }
    }
}

/// On-disk layout of the credential entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl StoredCredentials {
    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process credential store.
///
/// Nothing survives the process. Suited to tests and one-shot scripts.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token pair.
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store.set_tokens(access, refresh);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        lock(&self.inner).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        lock(&self.inner).refresh_token.clone()
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        let mut inner = lock(&self.inner);
        inner.access_token = Some(access.to_string());
        inner.refresh_token = Some(refresh.to_string());
    }

    fn set_access(&self, access: &str) {
        lock(&self.inner).access_token = Some(access.to_string());
    }

    fn cached_user(&self) -> Option<String> {
        lock(&self.inner).user.clone()
    }

    fn set_cached_user(&self, user_json: &str) {
        lock(&self.inner).user = Some(user_json.to_string());
    }

    fn clear(&self) {
        *lock(&self.inner) = StoredCredentials::default();
    }
}

/// Credential store backed by a JSON file.
///
/// Every read goes to disk so separate processes sharing the file see the
/// last write. Writes replace the file through a uniquely named temporary
/// sibling and a rename, so a reader never observes a half-written entry
/// set and concurrent writers never share a scratch file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Use the credential file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoredCredentials {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StoredCredentials::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credentials");
                return StoredCredentials::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt credentials file");
                StoredCredentials::default()
            }
        }
    }

    fn persist(&self, stored: &StoredCredentials) -> io::Result<()> {
        if stored.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            };
        }

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Unique sibling per write; created owner-only on unix.
        let json = serde_json::to_vec_pretty(stored)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut StoredCredentials)) {
        let _guard = lock(&self.write_lock);
        let mut stored = self.load();
        apply(&mut stored);
        if let Err(e) = self.persist(&stored) {
            warn!(path = %self.path.display(), error = %e, "Failed to write credentials");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.load().access_token
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().refresh_token
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        self.update(|stored| {
            stored.access_token = Some(access.to_string());
            stored.refresh_token = Some(refresh.to_string());
        });
    }

    fn set_access(&self, access: &str) {
        self.update(|stored| stored.access_token = Some(access.to_string()));
    }

    fn cached_user(&self) -> Option<String> {
        self.load().user
    }

    fn set_cached_user(&self, user_json: &str) {
        self.update(|stored| stored.user = Some(user_json.to_string()));
    }

    fn clear(&self) {
        debug!(path = %self.path.display(), "Clearing credentials");
        self.update(|stored| *stored = StoredCredentials::default());
    }
}

/// `<config dir>/gigboard/credentials.json` for the current user.
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gigboard").join("credentials.json"))
}
