//! Endpoint and retry configuration for [`HelixClient`](crate::HelixClient).

use std::time::Duration;

/// Twitch OAuth2 token endpoint used for the client-credentials grant.
pub const AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Base URL of the Helix API. Resource paths are appended to it.
pub const HELIX_URL: &str = "https://api.twitch.tv/helix";

/// The largest number of lookup keys Helix accepts in a single request.
pub const MAX_BATCH_SIZE: usize = 100;

/// How the token manager reacts to a non-success status from the authorization endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt. `0` means a single attempt.
    pub max_retries: u32,
    /// Pause between attempts. No pause when zero.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::ZERO,
        }
    }
}

/// Configuration shared by the token manager and the resource fetcher.
#[derive(Debug, Clone)]
pub struct HelixConfig {
    pub(crate) auth_url: String,
    pub(crate) helix_url: String,
    pub(crate) batch_size: usize,
    pub(crate) retry: RetryPolicy,
    pub(crate) request_timeout: Duration,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            auth_url: AUTH_URL.to_string(),
            helix_url: HELIX_URL.to_string(),
            batch_size: MAX_BATCH_SIZE,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HelixConfig {
    /// Points the token manager at a different authorization endpoint.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Points resource queries at a different Helix base URL.
    pub fn with_helix_url(mut self, url: impl Into<String>) -> Self {
        self.helix_url = url.into();
        self
    }

    /// Sets how many keys go into one request, clamped to `1..=100`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Replaces the retry policy for the authorization endpoint.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Timeout applied by [`ReqwestTransport`](crate::ReqwestTransport) to every request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Retry policy used by [`TokenManager::get_token`](crate::TokenManager::get_token).
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Number of keys sent per request.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Full URL for a Helix resource path such as `streams`.
    pub(crate) fn resource_url(&self, path: &str) -> String {
        format!("{}/{}", self.helix_url.trim_end_matches('/'), path)
    }
}
