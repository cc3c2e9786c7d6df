//! Scripted transport for unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};

enum Scripted {
    Reply(ApiResponse),
    Fail(String),
    Hang,
}

/// Answers requests from a queue and records everything it was sent.
/// An empty queue answers 200 with an empty JSON object.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: Value) {
        self.replies
            .lock()
            .push_back(Scripted::Reply(ApiResponse::new(status, body.to_string())));
    }

    pub fn respond_raw(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .push_back(Scripted::Reply(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, reason: &str) {
        self.replies.lock().push_back(Scripted::Fail(reason.to_string()));
    }

    /// Next request never completes
    pub fn hang(&self) {
        self.replies.lock().push_back(Scripted::Hang);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.sent.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.sent.lock().push(request);
        let next = self.replies.lock().pop_front();
        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(reason)) => Err(ApiError::NetworkUnreachable(reason)),
            Some(Scripted::Hang) => futures::future::pending().await,
            None => Ok(ApiResponse::new(200, "{}")),
        }
    }
}
