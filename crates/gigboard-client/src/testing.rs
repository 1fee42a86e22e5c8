//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, ClientError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn reply_json(self, status: u16, body: Value) -> Self {
        self.reply(status, &body.to_string())
    }

    pub(crate) fn fail(self, reason: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(ClientError::Transport(reason.to_string())));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| {
                r.url
                    .split_once("://")
                    .and_then(|(_, rest)| rest.find('/').map(|i| rest[i..].to_string()))
                    .unwrap_or(r.url)
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no scripted reply".to_string())))
    }
}
