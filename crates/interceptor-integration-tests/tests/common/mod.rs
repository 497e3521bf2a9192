//! Common test utilities for interceptor-api integration tests
//!
//! This module provides:
//! - An app builder over the standard GitHub router
//! - Request builders for hook deliveries
//! - GitHub-shaped payload fixtures

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use bytes::Bytes;
use interceptor_api::{create_router, AppState, ServiceConfig};
use interceptor_core::EventRouter;
use serde_json::{json, Value};
use tower::ServiceExt;

#[allow(dead_code)]
pub const HEAD_SHA: &str = "6a6bcddc365ca3a38c9055a603c9590a7fae7ca6";

// ============================================================================
// App construction
// ============================================================================

/// App with default configuration
#[allow(dead_code)]
pub fn create_test_app() -> Router {
    create_test_app_with(ServiceConfig::default())
}

pub fn create_test_app_with(config: ServiceConfig) -> Router {
    let router = EventRouter::github(&config.interception.options());
    create_router(AppState::new(config, router))
}

/// Send a single request through a fresh app and collect the response.
#[allow(dead_code)]
pub async fn send(app: Router, request: Request<Body>) -> (Response<Body>, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    (Response::from_parts(parts, Body::empty()), bytes)
}

// ============================================================================
// Request builders
// ============================================================================

/// Builder for a POSTed hook delivery
pub struct Delivery {
    uri: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

#[allow(dead_code)]
impl Delivery {
    pub fn new(event_type: &str) -> Self {
        Self {
            uri: "/".to_string(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Github-Event".to_string(), event_type.to_string()),
            ],
            body: b"{}".to_vec(),
        }
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: &Value) -> Self {
        self.body = serde_json::to_vec(body).unwrap();
        self
    }

    pub fn raw(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(self.uri);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

// ============================================================================
// Payload fixtures
// ============================================================================

#[allow(dead_code)]
pub fn pull_request_payload(action: &str, repo: &str) -> Value {
    json!({
        "action": action,
        "number": 42,
        "pull_request": {
            "number": 42,
            "state": "open",
            "head": { "ref": "feature", "sha": HEAD_SHA },
            "base": { "ref": "main", "sha": "0000000000000000000000000000000000000000" }
        },
        "repository": { "full_name": repo, "private": false },
        "sender": { "login": "octocat" }
    })
}

#[allow(dead_code)]
pub fn push_payload(reference: &str, repo: &str) -> Value {
    json!({
        "ref": reference,
        "before": "0000000000000000000000000000000000000000",
        "after": "abc123456789abc123456789abc123456789abcd",
        "repository": { "full_name": repo },
        "commits": [
            { "id": "111111aaaaaa", "message": "first" },
            { "id": "abc123456789abc123456789abc123456789abcd", "message": "second" }
        ],
        "head_commit": { "id": "abc123456789abc123456789abc123456789abcd" },
        "pusher": { "name": "octocat" }
    })
}

/// Parse a response body and drop the `intercepted` key.
#[allow(dead_code)]
pub fn without_intercepted(body: &[u8]) -> Value {
    let mut value: Value = serde_json::from_slice(body).unwrap();
    value.as_object_mut().unwrap().remove("intercepted");
    value
}
