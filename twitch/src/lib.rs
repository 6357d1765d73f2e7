//! Client-credentials authentication and batched stream/user lookups for the Twitch Helix API.
//!
//! The crate is split along the two stateful pieces of a Helix app client:
//!
//! - [`auth::TokenManager`] caches the app access token and refreshes it on demand.
//! - [`helix_api::ResourceFetcher`] splits lookups into batches and merges the results.
//!
//! [`HelixClient`] ties the two together and is what most callers want. HTTP goes through the
//! [`Transport`] trait so the client can run against [`ReqwestTransport`] in production and a
//! scripted [`mock::MockTransport`] in tests (enable the `mock` feature to use it downstream).

pub mod auth;
pub mod config;
pub mod error;
pub mod helix_api;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod transport;

pub use auth::{Credentials, TokenManager};
pub use config::{HelixConfig, RetryPolicy};
pub use error::HelixError;
pub use helix_api::{HelixClient, Lookup, Stream, User};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
