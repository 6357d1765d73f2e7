//! Batched lookups against Helix list endpoints.
//!
//! Helix accepts at most 100 ids or logins per request. [`ResourceFetcher::fetch_by_key`]
//! splits a longer key list into consecutive batches, sends all of them at once, and
//! stitches the results back together in the original order.

use crate::config::HelixConfig;
use crate::error::HelixError;
use crate::helix_api::types::{Lookup, Resource, ResourcePayload};
use crate::transport::{HttpRequest, Transport};
use eyre::Context;
use http::{HeaderName, HeaderValue, Method, header};
use std::sync::Arc;
use tracing::instrument;

const CLIENT_ID: HeaderName = HeaderName::from_static("client-id");

/// Issues authorized, batched `GET` requests for one resource kind at a time.
#[derive(Debug)]
pub struct ResourceFetcher<T> {
    transport: Arc<T>,
    client_id: HeaderValue,
    config: HelixConfig,
}

impl<T: Transport> ResourceFetcher<T> {
    /// Fails if `client_id` cannot be sent as a header value.
    pub fn new(transport: Arc<T>, client_id: &str, config: HelixConfig) -> eyre::Result<Self> {
        let client_id = HeaderValue::from_str(client_id).context("client id as header value")?;
        Ok(Self {
            transport,
            client_id,
            config,
        })
    }

    /// Looks up `keys` on the endpoint of `R`, authorizing every request with `bearer`.
    ///
    /// The keys are sent in batches of at most the configured batch size, all at once. The
    /// call waits for every batch to answer. If any batch answers with a non-success status
    /// the whole call fails with [`HelixError::ResourceFetch`]. Otherwise the records of all
    /// batches are returned in batch order, and batches that matched nothing contribute
    /// nothing.
    ///
    /// `keys` is only borrowed. An empty slice returns an empty `Vec` without any request.
    #[instrument(skip(self, keys, bearer), fields(resource = R::PATH, key_count = keys.len()))]
    pub async fn fetch_by_key<R, S>(
        &self,
        bearer: &str,
        keys: &[S],
        lookup: Lookup,
    ) -> eyre::Result<Vec<R>>
    where
        R: Resource,
        S: AsRef<str>,
    {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let authorization = HeaderValue::from_str(bearer).context("bearer token as header value")?;
        let url = self.config.resource_url(R::PATH);
        let param = R::query_param(lookup);

        let requests: Vec<_> = keys
            .chunks(self.config.batch_size)
            .map(|batch| self.batch_request(&url, param, batch, &authorization))
            .collect();
        tracing::debug!(batches = requests.len(), "dispatching lookup batches");

        // all batches run to completion, even after one of them has failed
        let responses =
            futures::future::join_all(requests.into_iter().map(|r| self.transport.send(r))).await;

        let mut ok = Vec::with_capacity(responses.len());
        for (i, response) in responses.into_iter().enumerate() {
            ok.push(response.with_context(|| format!("send {} batch {}", R::PATH, i))?);
        }

        if let Some(failed) = ok.iter().find(|r| !r.is_success()) {
            tracing::warn!(status = %failed.status, "lookup batch failed");
            return Err(HelixError::ResourceFetch {
                status: failed.status,
            }
            .into());
        }

        let mut records = Vec::new();
        for (i, response) in ok.iter().enumerate() {
            let payload: ResourcePayload<R> = response
                .json()
                .with_context(|| format!("parse {} batch {}", R::PATH, i))?;
            if payload.data.is_empty() {
                tracing::trace!(batch = i, "batch matched nothing");
                continue;
            }
            records.extend(payload.data);
        }

        tracing::debug!(records = records.len(), "lookup complete");
        Ok(records)
    }

    fn batch_request<S: AsRef<str>>(
        &self,
        url: &str,
        param: &'static str,
        batch: &[S],
        authorization: &HeaderValue,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(Method::GET, url);
        request.query = batch
            .iter()
            .map(|key| (param, key.as_ref().to_string()))
            .collect();
        request.headers.insert(CLIENT_ID, self.client_id.clone());
        request
            .headers
            .insert(header::AUTHORIZATION, authorization.clone());
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helix_api::{Stream, User};
    use crate::mock::{MockTransport, data_response, status_response};
    use http::StatusCode;
    use pretty_assertions::assert_eq;

    const HELIX: &str = "http://helix.test/helix";

    fn fetcher(transport: MockTransport) -> (ResourceFetcher<MockTransport>, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let config = HelixConfig::default().with_helix_url(HELIX);
        let fetcher = ResourceFetcher::new(Arc::clone(&transport), "my-client", config).unwrap();
        (fetcher, transport)
    }

    /// Answers every users lookup with one record per requested login.
    fn echo_logins(request: &HttpRequest) -> eyre::Result<crate::transport::HttpResponse> {
        Ok(data_response(
            request
                .query_values("login")
                .into_iter()
                .map(|login| serde_json::json!({ "id": format!("id-{login}"), "login": login }))
                .collect(),
        ))
    }

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{i}")).collect()
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let (fetcher, transport) = fetcher(MockTransport::new(echo_logins));
        let users: Vec<User> = fetcher
            .fetch_by_key::<User, String>("Bearer t", &[], Lookup::Login)
            .await
            .unwrap();
        assert!(users.is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn splits_into_batches_of_one_hundred() {
        let (fetcher, transport) = fetcher(MockTransport::new(echo_logins));
        let keys = keys(250);

        let users: Vec<User> = fetcher
            .fetch_by_key("Bearer t", &keys, Lookup::Login)
            .await
            .unwrap();

        let mut sizes: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.query_values("login").len())
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![50, 100, 100]);

        let logins: Vec<_> = users.iter().map(|u| u.login.clone()).collect();
        assert_eq!(logins, keys);
    }

    #[tokio::test]
    async fn input_is_left_untouched() {
        let (fetcher, _) = fetcher(MockTransport::new(echo_logins));
        let keys = keys(120);
        let before = keys.clone();
        let _: Vec<User> = fetcher
            .fetch_by_key("Bearer t", &keys, Lookup::Login)
            .await
            .unwrap();
        assert_eq!(keys, before);
    }

    #[tokio::test]
    async fn any_failed_batch_fails_the_call() {
        let (fetcher, transport) = fetcher(MockTransport::new(|request| {
            if request.query_values("login").contains(&"k150") {
                Ok(status_response(StatusCode::TOO_MANY_REQUESTS))
            } else {
                echo_logins(request)
            }
        }));

        let err = fetcher
            .fetch_by_key::<User, _>("Bearer t", &keys(250), Lookup::Login)
            .await
            .unwrap_err();
        match err.downcast_ref::<HelixError>() {
            Some(HelixError::ResourceFetch { status }) => {
                assert_eq!(*status, StatusCode::TOO_MANY_REQUESTS)
            }
            other => panic!("unexpected error: {other:?} ({err:?})"),
        }
        // no short-circuit: the other batches were still sent
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn empty_batches_are_dropped() {
        let (fetcher, _) = fetcher(MockTransport::new(|request| {
            if request.query_values("login").contains(&"k0") {
                Ok(data_response(Vec::new()))
            } else {
                echo_logins(request)
            }
        }));

        let users: Vec<User> = fetcher
            .fetch_by_key("Bearer t", &keys(130), Lookup::Login)
            .await
            .unwrap();
        assert_eq!(users.len(), 30);
        assert_eq!(users[0].login, "k100");
        assert_eq!(users[29].login, "k129");
    }

    #[tokio::test]
    async fn requests_carry_auth_headers() {
        let (fetcher, transport) = fetcher(MockTransport::new(echo_logins));
        let _: Vec<User> = fetcher
            .fetch_by_key("Bearer abc", &["eager"], Lookup::Login)
            .await
            .unwrap();

        let requests = transport.requests_to(&format!("{HELIX}/users"));
        assert_eq!(requests.len(), 1);
        let headers = &requests[0].headers;
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(headers.get("client-id").unwrap(), "my-client");
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn parameter_names_follow_kind_and_lookup() {
        let (fetcher, transport) =
            fetcher(MockTransport::new(|_| Ok(data_response(Vec::new()))));

        let cases = [
            (Lookup::Id, "streams", "user_id"),
            (Lookup::Login, "streams", "user_login"),
            (Lookup::Id, "users", "id"),
            (Lookup::Login, "users", "login"),
        ];
        for (lookup, path, _) in cases {
            if path == "streams" {
                let _: Vec<Stream> = fetcher
                    .fetch_by_key("Bearer t", &["a", "b"], lookup)
                    .await
                    .unwrap();
            } else {
                let _: Vec<User> = fetcher
                    .fetch_by_key("Bearer t", &["a", "b"], lookup)
                    .await
                    .unwrap();
            }
        }

        let requests = transport.requests();
        assert_eq!(requests.len(), cases.len());
        for (request, (_, path, param)) in requests.iter().zip(cases) {
            assert_eq!(request.url, format!("{HELIX}/{path}"));
            assert_eq!(request.query_values(param), vec!["a", "b"]);
            assert_eq!(request.query.len(), 2);
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let (fetcher, _) = fetcher(MockTransport::new(|_| {
            Ok(crate::transport::HttpResponse::new(StatusCode::OK, "<html>"))
        }));
        let err = fetcher
            .fetch_by_key::<User, _>("Bearer t", &["a"], Lookup::Login)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<HelixError>().is_none());
    }

    #[tokio::test]
    async fn smaller_batch_size_is_honoured() {
        let transport = Arc::new(MockTransport::new(echo_logins));
        let config = HelixConfig::default()
            .with_helix_url(HELIX)
            .with_batch_size(10);
        let fetcher = ResourceFetcher::new(Arc::clone(&transport), "c", config).unwrap();
        let users: Vec<User> = fetcher
            .fetch_by_key("Bearer t", &keys(25), Lookup::Login)
            .await
            .unwrap();
        assert_eq!(users.len(), 25);
        assert_eq!(transport.request_count(), 3);
    }
}
