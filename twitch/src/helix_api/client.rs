//! The public Helix client.

use crate::auth::{Credentials, TokenManager};
use crate::config::HelixConfig;
use crate::helix_api::fetch::ResourceFetcher;
use crate::helix_api::{Lookup, Resource, Stream, User};
use crate::transport::{ReqwestTransport, Transport};
use std::sync::Arc;
use tracing::instrument;

/// Client for looking up streams and users on the Twitch Helix API with an app access token.
///
/// Every query first makes sure a valid token is cached (fetching one through the
/// client-credentials grant if needed) and then looks the keys up in batches of at most 100.
/// Cloning is cheap, and clones share the token cache.
#[derive(Debug)]
pub struct HelixClient<T = ReqwestTransport> {
    transport: Arc<T>,
    tokens: Arc<TokenManager<T>>,
    fetcher: Arc<ResourceFetcher<T>>,
}

impl<T> Clone for HelixClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tokens: Arc::clone(&self.tokens),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl HelixClient<ReqwestTransport> {
    /// Creates a client talking to the real Twitch endpoints with default settings.
    pub fn new(credentials: Credentials) -> eyre::Result<Self> {
        Self::with_config(credentials, HelixConfig::default())
    }

    /// Creates a client with custom endpoints, batch size or retry policy.
    pub fn with_config(credentials: Credentials, config: HelixConfig) -> eyre::Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Self::with_transport(credentials, config, transport)
    }
}

impl<T: Transport> HelixClient<T> {
    /// Creates a client that sends every request through `transport`.
    pub fn with_transport(
        credentials: Credentials,
        config: HelixConfig,
        transport: T,
    ) -> eyre::Result<Self> {
        let transport = Arc::new(transport);
        let fetcher = ResourceFetcher::new(Arc::clone(&transport), &credentials.id, config.clone())?;
        let tokens = TokenManager::new(
            credentials,
            config.auth_url,
            config.retry,
            Arc::clone(&transport),
        );
        Ok(Self {
            transport,
            tokens: Arc::new(tokens),
            fetcher: Arc::new(fetcher),
        })
    }

    /// The transport every request goes through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The token manager shared by all clones of this client.
    pub fn token_manager(&self) -> &TokenManager<T> {
        &self.tokens
    }

    /// Returns a valid `Authorization` header value, refreshing the cached token if needed.
    pub async fn get_token(&self) -> eyre::Result<String> {
        self.tokens.get_token().await
    }

    /// Looks up the live streams of the users with the given ids.
    ///
    /// Users that are not live produce no record.
    #[instrument(skip_all, fields(n = user_ids.len()))]
    pub async fn get_streams_by_id<S: AsRef<str>>(&self, user_ids: &[S]) -> eyre::Result<Vec<Stream>> {
        self.lookup(user_ids, Lookup::Id).await
    }

    /// Looks up the live streams of the users with the given login names.
    #[instrument(skip_all, fields(n = user_logins.len()))]
    pub async fn get_streams_by_login<S: AsRef<str>>(
        &self,
        user_logins: &[S],
    ) -> eyre::Result<Vec<Stream>> {
        self.lookup(user_logins, Lookup::Login).await
    }

    /// Looks up users by id.
    #[instrument(skip_all, fields(n = ids.len()))]
    pub async fn get_users_by_id<S: AsRef<str>>(&self, ids: &[S]) -> eyre::Result<Vec<User>> {
        self.lookup(ids, Lookup::Id).await
    }

    /// Looks up users by login name.
    #[instrument(skip_all, fields(n = logins.len()))]
    pub async fn get_users_by_login<S: AsRef<str>>(&self, logins: &[S]) -> eyre::Result<Vec<User>> {
        self.lookup(logins, Lookup::Login).await
    }

    async fn lookup<R: Resource, S: AsRef<str>>(
        &self,
        keys: &[S],
        lookup: Lookup,
    ) -> eyre::Result<Vec<R>> {
        // no token request for an empty query either
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let bearer = self.tokens.get_token().await?;
        self.fetcher.fetch_by_key(&bearer, keys, lookup).await
    }
}
