//! Authentication session types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The token pair currently held by the client.
///
/// Created on login or signup, the access token is replaced on refresh,
/// and both fields are cleared on logout or when a refresh is rejected.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Short-lived bearer credential.
    pub access_token: Option<String>,
    /// Longer-lived credential used only to obtain a new access token.
    pub refresh_token: Option<String>,
}

impl Session {
    /// Returns true if an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Returns true if a refresh can be attempted.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

// Tokens are credentials; never print them.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Token pair returned by login and OAuth endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Body returned by the token refresh endpoint.
///
/// The refresh token is not rotated, so only the access token comes back.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

impl fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshResponse").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = Session {
            access_token: Some("secret-access".to_string()),
            refresh_token: None,
        };
        let printed = format!("{:?}", session);
        assert!(!printed.contains("secret-access"));
        assert!(printed.contains("<redacted>"));
        assert!(session.is_authenticated());
        assert!(!session.can_refresh());
    }
}
