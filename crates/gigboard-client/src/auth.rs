//! Login, signup and logout on top of [`ApiClient`].
//!
//! Successful authentication stores the token pair, fetches the caller's
//! profile and caches a [`User`] built from it next to the tokens.

use serde_json::{json, Value};
use tracing::{info, warn};

use gigboard_core::{LoginCredentials, SignupData, TokenPair, User, UserId, UserProfile, UserRole};

use crate::http::ApiClient;
use crate::result::ApiResult;

pub const LOGIN_PATH: &str = "/api/account/login/";
pub const SIGNUP_PATH: &str = "/api/account/signup/";
pub const LOGOUT_PATH: &str = "/api/account/logout/";
pub const PROFILE_PATH: &str = "/api/account/profile/me/";
pub const GOOGLE_AUTH_PATH: &str = "/auth/google/";

/// Session lifecycle for a single account.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Create a service sharing the client's credential store.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Underlying API client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Log in with email and password.
    ///
    /// `Data(None)` means the tokens were stored but no profile could be
    /// loaded to describe the user.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<User> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        match self.client.post::<TokenPair, _>(LOGIN_PATH, Some(&body)).await {
            ApiResult::Data(Some(tokens)) => self.establish(tokens, &credentials.email).await,
            ApiResult::Data(None) => ApiResult::Data(None),
            ApiResult::Error(message) => ApiResult::Error(message),
        }
    }

    /// Create an account, then log into it.
    pub async fn signup(&self, data: &SignupData) -> ApiResult<User> {
        let created: ApiResult<Value> = self.client.post(SIGNUP_PATH, Some(data)).await;
        if let ApiResult::Error(message) = created {
            return ApiResult::Error(message);
        }
        info!(email = %data.email, role = %data.role, "Account created");

        self.login(&LoginCredentials {
            email: data.email.clone(),
            password: data.password.clone(),
        })
        .await
    }

    /// Complete a Google OAuth flow with the authorization code.
    pub async fn google_login(&self, code: &str, role: UserRole) -> ApiResult<User> {
        let body = json!({ "code": code, "role": role });
        match self.client.post::<TokenPair, _>(GOOGLE_AUTH_PATH, Some(&body)).await {
            ApiResult::Data(Some(tokens)) => self.establish(tokens, "").await,
            ApiResult::Data(None) => ApiResult::Data(None),
            ApiResult::Error(message) => ApiResult::Error(message),
        }
    }

    /// Tell the backend, then forget every credential regardless of its answer.
    pub async fn logout(&self) {
        let outcome: ApiResult<Value> = self.client.post(LOGOUT_PATH, Some(&json!({}))).await;
        if let Some(message) = outcome.error() {
            warn!(error = %message, "Logout request failed, clearing credentials anyway");
        }
        self.client.credentials().clear();
        info!("Logged out");
    }

    /// User cached by the last login, if the session is still present.
    ///
    /// A cached user that no longer parses wipes all credentials.
    pub fn restore(&self) -> Option<User> {
        let store = self.client.credentials();
        let cached = store.cached_user()?;
        store.access_token()?;

        match serde_json::from_str(&cached) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cached user");
                store.clear();
                None
            }
        }
    }

    async fn establish(&self, tokens: TokenPair, fallback_email: &str) -> ApiResult<User> {
        let store = self.client.credentials();
        store.set_tokens(&tokens.access, &tokens.refresh);

        let profile = match self.client.get::<Value>(PROFILE_PATH).await {
            ApiResult::Data(Some(profile)) => profile,
            ApiResult::Data(None) => return ApiResult::Data(None),
            ApiResult::Error(message) => {
                warn!(error = %message, "Logged in but could not load profile");
                return ApiResult::Data(None);
            }
        };

        let Some(user) = user_from_profile(&profile, fallback_email) else {
            warn!("Profile response carries no usable user id");
            return ApiResult::Data(None);
        };

        match serde_json::to_string(&user) {
            Ok(json) => store.set_cached_user(&json),
            Err(e) => warn!(error = %e, "Failed to cache user"),
        }
        info!(user_id = %user.id, role = %user.role, "Logged in");
        ApiResult::ok(user)
    }
}

/// Build the cached user from a `/profile/me/` document.
///
/// Fields of the nested `user` object win; otherwise the id comes from the
/// profile, the email from the login form and the role defaults to
/// freelancer.
pub fn user_from_profile(profile: &Value, fallback_email: &str) -> Option<User> {
    let nested = profile.get("user");
    let nested_field = |key: &str| field(nested, key);

    let id = nested_field("id")
        .and_then(Value::as_u64)
        .filter(|&id| id != 0)
        .or_else(|| profile.get("id").and_then(Value::as_u64))?;

    let email = nested_field("email")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .unwrap_or(fallback_email)
        .to_string();

    let role = nested_field("role")
        .and_then(Value::as_str)
        .and_then(|r| r.parse::<UserRole>().ok())
        .unwrap_or_default();

    let text = |key: &str| {
        profile
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(User {
        id: UserId::new(id),
        email,
        role,
        is_active: nested_field("is_active").and_then(Value::as_bool),
        date_joined: nested_field("date_joined")
            .and_then(Value::as_str)
            .map(str::to_string),
        profile: Some(UserProfile {
            id: profile.get("id").and_then(Value::as_u64).unwrap_or_default(),
            full_name: text("full_name"),
            bio: text("bio"),
            country: text("country"),
            avatar: profile
                .get("avatar")
                .and_then(Value::as_str)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            skills: text("skills"),
            company_name: text("company_name"),
        }),
    })
}

fn field<'a>(object: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    object.and_then(|o| o.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::ClientConfig;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::testing::ScriptedTransport;

    fn service(
        transport: ScriptedTransport,
        store: MemoryCredentialStore,
    ) -> (AuthService, Arc<ScriptedTransport>, Arc<MemoryCredentialStore>) {
        let transport = Arc::new(transport);
        let store = Arc::new(store);
        let client = ApiClient::with_transport(
            ClientConfig::default(),
            transport.clone(),
            store.clone(),
        );
        (AuthService::new(client), transport, store)
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials {
            email: "dev@example.com".to_string(),
            password: "hunter22".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_stores_tokens_and_caches_user() {
        let transport = ScriptedTransport::new()
            .reply_json(200, json!({ "access": "a1", "refresh": "r1" }))
            .reply_json(
                200,
                json!({
                    "id": 11,
                    "full_name": "Dev Eloper",
                    "user": { "id": 5, "email": "dev@example.com", "role": "CLIENT" }
                }),
            );
        let (auth, transport, store) = service(transport, MemoryCredentialStore::new());

        let user = auth.login(&credentials()).await.into_data().unwrap();

        assert_eq!(user.id, UserId::new(5));
        assert!(user.is_client());
        assert_eq!(user.display_name(), "Dev Eloper");
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
        assert_eq!(transport.paths(), [LOGIN_PATH, PROFILE_PATH]);
        assert_eq!(transport.requests()[1].bearer.as_deref(), Some("a1"));
        assert_eq!(auth.restore(), Some(user));
    }

    #[tokio::test]
    async fn test_login_error_is_translated_and_stores_nothing() {
        let transport = ScriptedTransport::new().reply_json(
            401,
            json!({ "detail": "No active account found with the given credentials" }),
        );
        let (auth, _, store) = service(transport, MemoryCredentialStore::new());

        let result = auth.login(&credentials()).await;

        assert_eq!(
            result.error(),
            Some("Invalid email or password. Please try again.")
        );
        assert!(!store.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_logs_in_afterwards() {
        let transport = ScriptedTransport::new()
            .reply_json(201, json!({ "id": 3, "email": "new@example.com" }))
            .reply_json(200, json!({ "access": "a1", "refresh": "r1" }))
            .reply_json(200, json!({ "id": 8 }));
        let (auth, transport, _) = service(transport, MemoryCredentialStore::new());

        let data = SignupData {
            email: "new@example.com".to_string(),
            password: "longpassword".to_string(),
            role: UserRole::Freelancer,
        };
        let user = auth.signup(&data).await.into_data().unwrap();

        assert_eq!(transport.paths(), [SIGNUP_PATH, LOGIN_PATH, PROFILE_PATH]);
        // No nested user: id, email and role all fall back.
        assert_eq!(user.id, UserId::new(8));
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.role, UserRole::Freelancer);
    }

    #[tokio::test]
    async fn test_signup_error_skips_login() {
        let transport = ScriptedTransport::new()
            .reply_json(400, json!({ "email": ["user with this email already exists."] }));
        let (auth, transport, _) = service(transport, MemoryCredentialStore::new());

        let data = SignupData {
            email: "taken@example.com".to_string(),
            password: "longpassword".to_string(),
            role: UserRole::Client,
        };
        let result = auth.signup(&data).await;

        assert_eq!(
            result.error(),
            Some("An account with this email already exists. Try logging in instead.")
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let store = MemoryCredentialStore::with_tokens("a1", "r1");
        store.set_cached_user(r#"{"id":1}"#);
        let transport = ScriptedTransport::new().reply(500, "");
        let (auth, transport, store) = service(transport, store);

        auth.logout().await;

        assert_eq!(transport.paths(), [LOGOUT_PATH]);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.cached_user(), None);
    }

    #[tokio::test]
    async fn test_google_login_sends_code_and_role() {
        let transport = ScriptedTransport::new()
            .reply_json(200, json!({ "access": "g1", "refresh": "g2" }))
            .reply_json(200, json!({ "id": 4, "user": { "id": 9, "email": "g@example.com" } }));
        let (auth, transport, store) = service(transport, MemoryCredentialStore::new());

        let user = auth
            .google_login("oauth-code", UserRole::Client)
            .await
            .into_data()
            .unwrap();

        assert_eq!(user.email, "g@example.com");
        assert_eq!(store.refresh_token().as_deref(), Some("g2"));
        assert_eq!(transport.paths(), [GOOGLE_AUTH_PATH, PROFILE_PATH]);
        assert_eq!(
            transport.requests()[0].body,
            crate::transport::RequestBody::Json(json!({ "code": "oauth-code", "role": "CLIENT" }))
        );
    }

    #[test]
    fn test_restore_discards_corrupt_user() {
        let store = MemoryCredentialStore::with_tokens("a1", "r1");
        store.set_cached_user("undefined");
        let (auth, _, store) = service(ScriptedTransport::new(), store);

        assert_eq!(auth.restore(), None);
        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn test_restore_requires_access_token() {
        let store = MemoryCredentialStore::new();
        store.set_cached_user(r#"{"id":1,"email":"x@y.z","role":"CLIENT"}"#);
        let (auth, _, store) = service(ScriptedTransport::new(), store);

        assert_eq!(auth.restore(), None);
        assert!(store.cached_user().is_some());
    }

    #[test]
    fn test_user_from_profile_needs_an_id() {
        assert!(user_from_profile(&json!({ "full_name": "Nobody" }), "x@y.z").is_none());
    }
}
