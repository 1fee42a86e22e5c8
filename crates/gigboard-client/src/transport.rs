//! HTTP transport seam.
//!
//! [`ApiClient`](crate::ApiClient) builds transport-neutral requests and
//! hands them to a [`Transport`]. Production code uses
//! [`ReqwestTransport`]; tests substitute a scripted one.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

pub use reqwest::Method;

use crate::error::ClientError;

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text { name: String, value: String },
    /// File upload field.
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    /// Field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Owned multipart form.
///
/// Unlike `reqwest::multipart::Form` this can be cloned, which the client
/// needs to rebuild a request after refreshing its token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a file field. The content type is left to the server to infer.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    /// Fields in insertion order.
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    fn into_reqwest(self) -> Form {
        self.parts
            .into_iter()
            .fold(Form::new(), |form, part| match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    bytes,
                } => form.part(name, Part::bytes(bytes).file_name(file_name)),
            })
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON request without a body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Multipart form. The transport chooses the boundary.
    Multipart(MultipartForm),
}

/// A fully resolved outbound request.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("authorized", &self.bearer.is_some())
            .field("body", &self.body)
            .finish()
    }
}

/// A response with its body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and read the whole response.
    ///
    /// Returns `Err` only when no response was obtained.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// No request timeout is configured; a call waits on the connection for
/// as long as the server keeps it open.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let HttpRequest {
            method,
            url,
            bearer,
            body,
        } = request;

        let mut builder = self.inner.request(method, &url);
        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder = match body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form.into_reqwest()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
