//! App access tokens via the OAuth2 client-credentials grant.
//!
//! [`TokenManager`] keeps a single cached bearer token. Every call to
//! [`TokenManager::get_token`] checks the cached token's expiry and only goes to the
//! authorization endpoint when there is no token or it has expired. Nothing renews the token
//! in the background.

use crate::config::RetryPolicy;
use crate::error::HelixError;
use crate::transport::{HttpRequest, Transport};
use eyre::Context;
use http::Method;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

/// Application credentials registered with Twitch.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: String,
    pub secret: String,
}

impl Credentials {
    /// Pairs a client id with its secret.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body of a successful response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    /// Lifetime of the token in seconds.
    expires_in: u64,
    token_type: String,
}

/// A bearer token together with the moment it stops being usable.
#[derive(Clone)]
pub(crate) struct TimeBoundToken {
    /// The full `Authorization` header value, e.g. `Bearer abc123`.
    value: String,
    expires_at: SystemTime,
}

impl TimeBoundToken {
    fn from_grant(grant: TokenGrant) -> eyre::Result<Self> {
        if grant.access_token.is_empty() {
            return Err(HelixError::InvalidToken("empty access_token").into());
        }
        let scheme = capitalize(&grant.token_type);
        if scheme.is_empty() {
            return Err(HelixError::InvalidToken("empty token_type").into());
        }

        let expires_at = SystemTime::now()
            .checked_add(Duration::from_secs(grant.expires_in))
            .ok_or(HelixError::InvalidToken("expires_in out of range"))?;

        Ok(Self {
            value: format!("{} {}", scheme, grant.access_token),
            expires_at,
        })
    }

    /// Valid only while the expiry is strictly in the future.
    fn is_valid_at(&self, now: SystemTime) -> bool {
        self.expires_at > now
    }
}

impl fmt::Debug for TimeBoundToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeBoundToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Upper-cases the first character and leaves the rest alone (`bearer` -> `Bearer`).
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Owns the cached app access token and refreshes it on demand.
///
/// The cache slot is guarded by an async mutex that stays locked for the duration of a
/// refresh. Callers that arrive while a refresh is in flight wait for it and then reuse its
/// token, so a cold cache produces one authorization request no matter how many tasks ask
/// for a token at once.
///
/// The same holds for failures: callers that were already waiting when a refresh gave up
/// get that refresh's [`HelixError`] instead of starting their own retry sequence. Callers
/// that arrive afterwards try again.
pub struct TokenManager<T> {
    credentials: Credentials,
    auth_url: String,
    retry: RetryPolicy,
    transport: Arc<T>,
    slot: Mutex<TokenSlot>,
    /// Bumped, under the slot lock, every time a refresh fails with a [`HelixError`].
    failed_refreshes: AtomicU64,
}

#[derive(Debug, Default)]
struct TokenSlot {
    token: Option<TimeBoundToken>,
    last_failure: Option<HelixError>,
}

impl<T> fmt::Debug for TokenManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("auth_url", &self.auth_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> TokenManager<T> {
    /// Creates a manager with an empty cache; the first [`Self::get_token`] fetches a token.
    pub fn new(
        credentials: Credentials,
        auth_url: impl Into<String>,
        retry: RetryPolicy,
        transport: Arc<T>,
    ) -> Self {
        Self {
            credentials,
            auth_url: auth_url.into(),
            retry,
            transport,
            slot: Mutex::new(TokenSlot::default()),
            failed_refreshes: AtomicU64::new(0),
        }
    }

    /// The credentials used for the client-credentials grant.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns a valid bearer token using the configured [`RetryPolicy`].
    pub async fn get_token(&self) -> eyre::Result<String> {
        self.get_token_with(self.retry.max_retries, self.retry.delay)
            .await
    }

    /// Returns a valid bearer token, fetching a new one if the cached token is missing or
    /// expired.
    ///
    /// A non-success status from the authorization endpoint is retried up to `max_retries`
    /// times, sleeping `retry_delay` between attempts. When every attempt fails the call
    /// returns [`HelixError::Auth`]. Transport errors are returned immediately.
    ///
    /// The returned string is `"<Scheme> <access token>"`, ready to be used as an
    /// `Authorization` header value.
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub async fn get_token_with(
        &self,
        max_retries: u32,
        retry_delay: Duration,
    ) -> eyre::Result<String> {
        let failures_seen = self.failed_refreshes.load(Ordering::Acquire);
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.token.as_ref() {
            if token.is_valid_at(SystemTime::now()) {
                tracing::trace!("using cached access token");
                return Ok(token.value.clone());
            }
            tracing::debug!("cached access token expired");
        }

        // a refresh failed while we were waiting for the lock
        if self.failed_refreshes.load(Ordering::Acquire) != failures_seen {
            if let Some(failure) = slot.last_failure.clone() {
                tracing::debug!("reusing failure of concurrent token refresh");
                return Err(failure.into());
            }
        }

        match self.request_token(max_retries, retry_delay).await {
            Ok(token) => {
                let value = token.value.clone();
                slot.token = Some(token);
                slot.last_failure = None;
                Ok(value)
            }
            Err(e) => {
                if let Some(failure) = e.downcast_ref::<HelixError>() {
                    slot.last_failure = Some(failure.clone());
                    self.failed_refreshes.fetch_add(1, Ordering::Release);
                }
                Err(e)
            }
        }
    }

    /// Drops the cached token so the next [`Self::get_token`] goes to the network.
    pub async fn invalidate(&self) {
        tracing::debug!("invalidating cached access token");
        self.slot.lock().await.token = None;
    }

    /// Expiry of the cached token, if there is one.
    pub async fn expires_at(&self) -> Option<SystemTime> {
        self.slot.lock().await.token.as_ref().map(|t| t.expires_at)
    }

    fn grant_request(&self) -> HttpRequest {
        let mut request = HttpRequest::new(Method::POST, self.auth_url.as_str());
        request.json_body = Some(serde_json::json!({
            "client_id": self.credentials.id,
            "client_secret": self.credentials.secret,
            "grant_type": "client_credentials",
        }));
        request
    }

    async fn request_token(
        &self,
        max_retries: u32,
        retry_delay: Duration,
    ) -> eyre::Result<TimeBoundToken> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = self
                .transport
                .send(self.grant_request())
                .await
                .context("request app access token")?;

            if response.is_success() {
                let grant: TokenGrant = response.json().context("parse token response")?;
                tracing::debug!(
                    attempts,
                    expires_in = grant.expires_in,
                    "obtained new access token"
                );
                return TimeBoundToken::from_grant(grant);
            }

            if attempts > max_retries {
                tracing::error!(attempts, status = %response.status, "giving up on access token");
                return Err(HelixError::Auth {
                    attempts,
                    status: response.status,
                }
                .into());
            }

            tracing::warn!(attempts, status = %response.status, "token request failed, retrying");
            if !retry_delay.is_zero() {
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}
