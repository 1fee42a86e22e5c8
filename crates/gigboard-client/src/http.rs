//! HTTP client for the marketplace REST API.
//!
//! Every outbound call goes through [`ApiClient`]. It attaches the stored
//! access token, refreshes it once when the backend answers `401`, and
//! folds every HTTP outcome into an [`ApiResult`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use gigboard_core::RefreshResponse;

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::ClientError;
use crate::result::ApiResult;
use crate::transport::{
    HttpRequest, HttpResponse, Method, MultipartForm, ReqwestTransport, RequestBody, Transport,
};
use crate::translate::{
    extract_error_message, ErrorTranslationTable, NETWORK_ERROR, REQUEST_FAILED, UPLOAD_FAILED,
};

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/account/auth/token/refresh/";

const STATUS_NO_CONTENT: u16 = 204;
const STATUS_UNAUTHORIZED: u16 = 401;

/// Method for multipart uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadMethod {
    Post,
    #[default]
    Patch,
    Put,
}

impl From<UploadMethod> for Method {
    fn from(method: UploadMethod) -> Self {
        match method {
            UploadMethod::Post => Method::POST,
            UploadMethod::Patch => Method::PATCH,
            UploadMethod::Put => Method::PUT,
        }
    }
}

/// Progress of a single call through the authorization retry.
///
/// `Initial → Sent → {Completed, NeedsRefresh}`, and from `NeedsRefresh`
/// to either `Retried` (refresh gave a token, request reissued once) or
/// `RefreshFailed` (the original response stands). The three final
/// states carry the response to interpret.
enum Exchange {
    Initial,
    Sent {
        response: HttpResponse,
        authorized: bool,
    },
    NeedsRefresh(HttpResponse),
    Completed(HttpResponse),
    Retried(HttpResponse),
    RefreshFailed(HttpResponse),
}

/// Client for the marketplace REST API.
///
/// Cheap to clone; clones share the transport and credential store.
/// Concurrent calls that both hit `401` refresh independently.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    translations: ErrorTranslationTable,
}

impl ApiClient {
    /// Create a client that talks to the backend over `reqwest`.
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()), credentials)
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
            translations: ErrorTranslationTable::standard(),
        }
    }

    /// Credential store shared with this client.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, RequestBody::Empty, REQUEST_FAILED)
            .await
    }

    /// POST an optional JSON body.
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    /// PATCH an optional JSON body.
    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    /// PUT an optional JSON body.
    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    /// DELETE a resource.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::DELETE, path, RequestBody::Empty, REQUEST_FAILED)
            .await
    }

    /// Send a multipart form, PATCH unless told otherwise.
    pub async fn upload_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        method: UploadMethod,
    ) -> ApiResult<T> {
        self.request(
            method.into(),
            path,
            RequestBody::Multipart(form),
            UPLOAD_FAILED,
        )
        .await
    }

    /// Trade the stored refresh token for a new access token.
    ///
    /// Returns `None` without touching the network when no refresh token
    /// is stored; an empty token counts as absent. Any failure once the
    /// backend is contacted, including an empty new token, clears all
    /// credentials and the caller is then unauthenticated.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let Some(refresh) = self.credentials.refresh_token().filter(|t| !t.is_empty()) else {
            debug!("No refresh token stored, skipping refresh");
            return None;
        };

        let request = HttpRequest {
            method: Method::POST,
            url: self.config.url(REFRESH_PATH),
            bearer: None,
            body: RequestBody::Json(json!({ "refresh": refresh })),
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing credentials");
                self.credentials.clear();
                return None;
            }
        };

        if !response.is_success() {
            warn!(
                status = response.status,
                "Token refresh rejected, clearing credentials"
            );
            self.credentials.clear();
            return None;
        }

        match serde_json::from_slice::<RefreshResponse>(&response.body) {
            Ok(RefreshResponse { access }) if access.is_empty() => {
                warn!("Refresh response carries an empty token, clearing credentials");
                self.credentials.clear();
                None
            }
            Ok(RefreshResponse { access }) => {
                self.credentials.set_access(&access);
                info!("Access token refreshed");
                Some(access)
            }
            Err(e) => {
                warn!(error = %e, "Malformed refresh response, clearing credentials");
                self.credentials.clear();
                None
            }
        }
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = match json_body(body) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, path = %path, "Failed to build request body");
                return ApiResult::Error(self.translations.translate(REQUEST_FAILED));
            }
        };
        self.request(method, path, body, REQUEST_FAILED).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        fallback: &str,
    ) -> ApiResult<T> {
        let url = self.config.url(path);
        match self.exchange(&method, &url, &body).await {
            Ok(response) => self.interpret(response, fallback),
            Err(e) => {
                warn!(method = %method, url = %url, error = %e, "Request did not complete");
                ApiResult::Error(self.translations.translate(NETWORK_ERROR))
            }
        }
    }

    /// Drive one call through the retry state machine.
    async fn exchange(
        &self,
        method: &Method,
        url: &str,
        body: &RequestBody,
    ) -> Result<HttpResponse, ClientError> {
        let mut state = Exchange::Initial;
        loop {
            state = match state {
                Exchange::Initial => {
                    let token = self.credentials.access_token().filter(|t| !t.is_empty());
                    let authorized = token.is_some();
                    let response = self.attempt(method, url, body, token).await?;
                    Exchange::Sent {
                        response,
                        authorized,
                    }
                }
                Exchange::Sent {
                    response,
                    authorized,
                } => {
                    if response.status == STATUS_UNAUTHORIZED && authorized {
                        Exchange::NeedsRefresh(response)
                    } else {
                        Exchange::Completed(response)
                    }
                }
                Exchange::NeedsRefresh(original) => match self.refresh_access_token().await {
                    Some(token) => {
                        debug!(url = %url, "Retrying with refreshed token");
                        Exchange::Retried(self.attempt(method, url, body, Some(token)).await?)
                    }
                    None => Exchange::RefreshFailed(original),
                },
                Exchange::Completed(response)
                | Exchange::Retried(response)
                | Exchange::RefreshFailed(response) => return Ok(response),
            };
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        body: &RequestBody,
        bearer: Option<String>,
    ) -> Result<HttpResponse, ClientError> {
        debug!(
            method = %method,
            url = %url,
            authorized = bearer.is_some(),
            "Sending request"
        );
        self.transport
            .send(HttpRequest {
                method: method.clone(),
                url: url.to_string(),
                bearer,
                body: body.clone(),
            })
            .await
    }

    fn interpret<T: DeserializeOwned>(&self, response: HttpResponse, fallback: &str) -> ApiResult<T> {
        if !response.is_success() {
            let raw = extract_error_message(&response.text(), response.status, fallback);
            debug!(status = response.status, raw = %raw, "Request failed");
            return ApiResult::Error(self.translations.translate(&raw));
        }

        if response.status == STATUS_NO_CONTENT {
            return ApiResult::Data(None);
        }

        match serde_json::from_slice(&response.body) {
            Ok(data) => ApiResult::Data(Some(data)),
            Err(e) => {
                debug!(status = response.status, error = %e, "Unparsable success body, treating as empty");
                ApiResult::Data(None)
            }
        }
    }
}

fn json_body<B: Serialize + ?Sized>(body: Option<&B>) -> Result<RequestBody, ClientError> {
    Ok(match body {
        Some(body) => RequestBody::Json(serde_json::to_value(body)?),
        None => RequestBody::Empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::testing::ScriptedTransport;
    use serde_json::Value;

    fn client(
        transport: ScriptedTransport,
        store: MemoryCredentialStore,
    ) -> (ApiClient, Arc<ScriptedTransport>, Arc<MemoryCredentialStore>) {
        let transport = Arc::new(transport);
        let store = Arc::new(store);
        let client = ApiClient::with_transport(
            ClientConfig::default(),
            transport.clone(),
            store.clone(),
        );
        (client, transport, store)
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_token_present() {
        let transport = ScriptedTransport::new().reply_json(200, json!({ "id": 1 }));
        let (client, transport, _) = client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));

        let result: ApiResult<Value> = client.get("/jobs/jobs/").await;

        assert_eq!(result.data(), Some(&json!({ "id": 1 })));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bearer.as_deref(), Some("a1"));
        assert_eq!(requests[0].url, "http://localhost:8000/jobs/jobs/");
        assert_eq!(requests[0].method, Method::GET);
    }

    #[tokio::test]
    async fn test_no_bearer_without_token() {
        let transport = ScriptedTransport::new().reply_json(200, json!([]));
        let (client, transport, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Vec<Value>> = client.get("/jobs/categories/").await;

        assert_eq!(result.into_data(), Some(vec![]));
        assert_eq!(transport.requests()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_unauthorized_without_token_does_not_refresh() {
        let transport = ScriptedTransport::new().reply_json(
            401,
            json!({ "detail": "Authentication credentials were not provided." }),
        );
        let (client, transport, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client.get("/wallet/wallet/my/").await;

        assert_eq!(result.error(), Some("Please log in to continue."));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_then_retry_once() {
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({ "detail": "Given token not valid for any token type" }))
            .reply_json(200, json!({ "access": "a2" }))
            .reply_json(200, json!({ "balance": "10.00" }));
        let (client, transport, store) =
            client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));

        let result: ApiResult<Value> = client.get("/wallet/wallet/my/").await;

        assert_eq!(result.data(), Some(&json!({ "balance": "10.00" })));
        assert_eq!(
            transport.paths(),
            ["/wallet/wallet/my/", REFRESH_PATH, "/wallet/wallet/my/"]
        );
        let requests = transport.requests();
        assert_eq!(requests[1].bearer, None);
        assert_eq!(requests[1].body, RequestBody::Json(json!({ "refresh": "r1" })));
        assert_eq!(requests[2].bearer.as_deref(), Some("a2"));
        // Refresh token is not rotated.
        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_not_retried() {
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({ "detail": "Token is invalid or expired" }))
            .reply_json(200, json!({ "access": "a2" }))
            .reply_json(401, json!({ "detail": "Token is invalid or expired" }));
        let (client, transport, _) = client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));

        let result: ApiResult<Value> = client.delete("/deliverables/3/").await;

        assert_eq!(
            result.error(),
            Some("Your session has expired. Please log in again.")
        );
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_stays_offline() {
        let store = MemoryCredentialStore::new();
        store.set_access("a1");
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({ "detail": "Token is invalid or expired" }));
        let (client, transport, store) = client(transport, store);

        let result: ApiResult<Value> = client.get("/contract/client/").await;

        assert!(result.is_error());
        assert_eq!(transport.paths(), ["/contract/client/"]);
        // Nothing was rejected by the backend, so nothing is cleared.
        assert_eq!(store.access_token().as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_all_credentials() {
        let store = MemoryCredentialStore::with_tokens("a1", "r1");
        store.set_cached_user(r#"{"id":1}"#);
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({ "detail": "Token is invalid or expired" }))
            .reply_json(401, json!({ "detail": "Token is blacklisted" }));
        let (client, transport, store) = client(transport, store);

        let result: ApiResult<Value> = client.get("/jobs/jobs/").await;

        assert_eq!(
            result.error(),
            Some("Your session has expired. Please log in again.")
        );
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
        assert_eq!(store.cached_user(), None);
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_clears_credentials() {
        let transport = ScriptedTransport::new().fail("connection reset");
        let (client, _, store) = client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));

        assert_eq!(client.refresh_access_token().await, None);
        assert!(!store.session().is_authenticated());
        assert!(!store.session().can_refresh());
    }

    #[tokio::test]
    async fn test_malformed_refresh_body_clears_credentials() {
        let transport = ScriptedTransport::new().reply(200, "<html>");
        let (client, _, store) = client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));

        assert_eq!(client.refresh_access_token().await, None);
        assert_eq!(store.refresh_token(), None);
    }

    #[tokio::test]
    async fn test_detail_is_translated() {
        let transport = ScriptedTransport::new().reply_json(
            401,
            json!({ "detail": "No active account found with the given credentials" }),
        );
        let (client, _, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client
            .post("/api/account/login/", Some(&json!({ "email": "a@b.c", "password": "x" })))
            .await;

        assert_eq!(
            result,
            ApiResult::Error("Invalid email or password. Please try again.".to_string())
        );
    }

    #[tokio::test]
    async fn test_field_errors_are_humanized() {
        let transport = ScriptedTransport::new()
            .reply_json(400, json!({ "email": ["This field is required."] }));
        let (client, _, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client
            .post("/api/account/signup/", Some(&json!({ "password": "pw" })))
            .await;

        assert_eq!(result.error(), Some("Email: This field is required."));
    }

    #[tokio::test]
    async fn test_no_content_is_empty_success() {
        let transport = ScriptedTransport::new().reply(204, "");
        let (client, _, _) = client(transport, MemoryCredentialStore::with_tokens("a", "r"));

        let result: ApiResult<Value> = client.delete("/jobs/jobs/4/").await;

        assert_eq!(result, ApiResult::Data(None));
    }

    #[tokio::test]
    async fn test_unparsable_success_is_empty_success() {
        let transport = ScriptedTransport::new().reply(200, "OK, probably");
        let (client, _, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client.get("/jobs/jobs/").await;

        assert_eq!(result, ApiResult::Data(None));
    }

    #[tokio::test]
    async fn test_post_without_body_sends_empty() {
        let transport = ScriptedTransport::new().reply_json(201, json!({}));
        let (client, transport, _) = client(transport, MemoryCredentialStore::new());

        let _: ApiResult<Value> = client.post::<Value, Value>("/wallet/fund/3/escrow", None).await;

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_error() {
        let transport = ScriptedTransport::new().fail("connection refused");
        let (client, _, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client.get("/jobs/jobs/").await;

        assert_eq!(
            result.error(),
            Some("Unable to connect. Please check your internet connection.")
        );
    }

    #[tokio::test]
    async fn test_upload_defaults_to_patch_and_retries_with_same_form() {
        let transport = ScriptedTransport::new()
            .reply(401, "")
            .reply_json(200, json!({ "access": "a2" }))
            .reply_json(200, json!({ "id": 9 }));
        let (client, transport, _) = client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));
        let form = MultipartForm::new().text("bio", "Rustacean");

        let result: ApiResult<Value> = client
            .upload_form("/api/account/profile/me/", form.clone(), UploadMethod::default())
            .await;

        assert_eq!(result.data(), Some(&json!({ "id": 9 })));
        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::PATCH);
        assert_eq!(requests[2].method, Method::PATCH);
        assert_eq!(requests[2].body, RequestBody::Multipart(form));
    }

    #[tokio::test]
    async fn test_upload_failure_uses_upload_fallback() {
        let transport = ScriptedTransport::new().reply_json(400, json!({}));
        let (client, _, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client
            .upload_form("/contracts/1/deliverables/", MultipartForm::new(), UploadMethod::Post)
            .await;

        assert_eq!(result.error(), Some("Upload failed"));
    }

    #[tokio::test]
    async fn test_empty_error_body_reports_status() {
        let transport = ScriptedTransport::new().reply(503, "");
        let (client, _, _) = client(transport, MemoryCredentialStore::new());

        let result: ApiResult<Value> = client.get("/jobs/jobs/").await;

        assert_eq!(result.error(), Some("Error: 503"));
    }

    #[tokio::test]
    async fn test_empty_access_token_is_not_sent() {
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({ "detail": "Authentication credentials were not provided." }));
        let (client, transport, _) = client(transport, MemoryCredentialStore::with_tokens("", "r1"));

        let result: ApiResult<Value> = client.get("/wallet/wallet/my/").await;

        assert_eq!(result.error(), Some("Please log in to continue."));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bearer, None);
    }

    #[tokio::test]
    async fn test_empty_refreshed_token_is_not_retried_or_stored() {
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({ "detail": "Token is invalid or expired" }))
            .reply_json(200, json!({ "access": "" }));
        let (client, transport, store) =
            client(transport, MemoryCredentialStore::with_tokens("a1", "r1"));

        let result: ApiResult<Value> = client.get("/jobs/jobs/").await;

        assert_eq!(
            result.error(),
            Some("Your session has expired. Please log in again.")
        );
        assert_eq!(transport.paths(), ["/jobs/jobs/", REFRESH_PATH]);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[tokio::test]
    async fn test_empty_refresh_token_stays_offline() {
        let (client, transport, _) =
            client(ScriptedTransport::new(), MemoryCredentialStore::with_tokens("a1", ""));

        assert_eq!(client.refresh_access_token().await, None);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unserializable_body_is_reported_without_sending() {
        // JSON object keys must be strings.
        let body: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let (client, transport, _) = client(ScriptedTransport::new(), MemoryCredentialStore::new());

        let result: ApiResult<Value> = client.post("/jobs/jobs/", Some(&body)).await;

        assert_eq!(result.error(), Some("Something went wrong. Please try again."));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_json_body_serialization_error() {
        let body: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        assert!(matches!(
            json_body(Some(&body)),
            Err(ClientError::Serialization(_))
        ));
        assert_eq!(json_body::<Value>(None).unwrap(), RequestBody::Empty);
    }
}
