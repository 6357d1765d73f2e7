//! The HTTP capability the client is built on.
//!
//! Everything above this module only needs "send a request, get back a status and a body".
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! [`MockTransport`](crate::mock::MockTransport).

use bytes::Bytes;
use eyre::Context;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// An outbound request, independent of any HTTP library.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// URL without query string.
    pub url: String,
    /// Query pairs in order. Repeated names are sent as repeated parameters.
    pub query: Vec<(&'static str, String)>,
    pub headers: HeaderMap,
    /// Serialized as the request body when present.
    pub json_body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// A request with `Content-Type: application/json` and nothing else set.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers,
            json_body: None,
        }
    }

    /// Values of every query parameter called `name`, in order.
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    /// A response with a raw body.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Builds a response whose body is `value` serialized as JSON.
    pub fn json_body(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> eyre::Result<T> {
        serde_json::from_slice(&self.body).with_context(|| {
            format!(
                "parse {} byte response body with status {} as JSON",
                self.body.len(),
                self.status
            )
        })
    }
}

/// Sends requests on behalf of the client.
///
/// An `Err` means no HTTP response was obtained at all (connection refused, timeout, ...).
/// A response with a non-success status is still an `Ok`.
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` and resolves once the full response body has arrived.
    fn send(&self, request: HttpRequest) -> impl Future<Output = eyre::Result<HttpResponse>> + Send;
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client that does not follow redirects and gives up after `request_timeout`.
    pub fn new(request_timeout: Duration) -> eyre::Result<Self> {
        let client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(request_timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    #[tracing::instrument(skip_all, fields(method = %request.method, url = %request.url), level = tracing::Level::TRACE)]
    async fn send(&self, request: HttpRequest) -> eyre::Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            query,
            headers,
            json_body,
        } = request;

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &json_body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("send {} request to {}", method, url))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("read body of {} response from {}", status, url))?;

        tracing::trace!(%status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn requests_default_to_json_content_type() {
        let request = HttpRequest::new(Method::GET, "http://localhost/");
        assert_eq!(
            request.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(request.query.is_empty());
        assert!(request.json_body.is_none());
    }

    #[test]
    fn query_values_keeps_order_of_repeated_names() {
        let mut request = HttpRequest::new(Method::GET, "http://localhost/");
        request.query = vec![
            ("login", "a".to_string()),
            ("other", "x".to_string()),
            ("login", "b".to_string()),
        ];
        assert_eq!(request.query_values("login"), vec!["a", "b"]);
        assert!(request.query_values("id").is_empty());
    }

    #[test]
    fn json_errors_mention_the_status() {
        let response = HttpResponse::new(StatusCode::OK, "not json");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(format!("{err}").contains("200 OK"), "{err}");
    }
}
