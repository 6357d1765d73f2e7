//! Scripted transport for testing code built on this crate.
//!
//! [`MockTransport`] answers each request by calling a handler closure, and records every
//! request it receives so tests can assert how many calls were made and what they looked
//! like. No sockets are opened.

use crate::transport::{HttpRequest, HttpResponse, Transport};
use http::StatusCode;
use std::sync::{Mutex, PoisonError};

type Handler = dyn Fn(&HttpRequest) -> eyre::Result<HttpResponse> + Send + Sync;

pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    /// Creates a transport that answers every request with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> eyre::Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in the order `send` was called.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests whose URL is exactly `url`.
    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> eyre::Result<HttpResponse> {
        tracing::trace!(method = %request.method, url = %request.url, "mock request");
        let response = (self.handler)(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        response
    }
}

/// A successful authorization response as the Twitch token endpoint sends it.
pub fn token_response(token_type: &str, access_token: &str, expires_in: u64) -> HttpResponse {
    HttpResponse::json_body(
        StatusCode::OK,
        &serde_json::json!({
            "access_token": access_token,
            "expires_in": expires_in,
            "token_type": token_type,
        }),
    )
}

/// A successful Helix response wrapping `records` in a `data` array.
pub fn data_response(records: Vec<serde_json::Value>) -> HttpResponse {
    HttpResponse::json_body(StatusCode::OK, &serde_json::json!({ "data": records }))
}

/// A response with an empty body and the given status.
pub fn status_response(status: StatusCode) -> HttpResponse {
    HttpResponse::new(status, "")
}
