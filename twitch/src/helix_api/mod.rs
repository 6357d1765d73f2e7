//! Batched lookups against the Twitch Helix API.
//!
//! Helix exposes users and live streams as list endpoints that accept up to 100 lookup keys
//! per request, either numeric user ids or login names:
//!
//! | resource   | by id         | by login         |
//! |------------|---------------|------------------|
//! | [`Stream`] | `user_id=...` | `user_login=...` |
//! | [`User`]   | `id=...`      | `login=...`      |
//!
//! [`HelixClient`] turns an arbitrarily long key list into as many requests as needed, sends
//! them concurrently, and returns the records in key order. A query either succeeds as a
//! whole or fails as a whole.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use twitch_helix::{Credentials, HelixClient};
//!
//! # async fn example() -> eyre::Result<()> {
//! let client = HelixClient::new(Credentials::new("client-id", "client-secret"))?;
//! for user in client.get_users_by_login(&["twitchdev", "twitch"]).await? {
//!     println!("{} ({})", user.display_name, user.id);
//! }
//! let live = client.get_streams_by_login(&["twitchdev"]).await?;
//! println!("{} of them are live", live.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod fetch;
pub mod streams;
pub mod types;
pub mod users;

pub use client::HelixClient;
pub use fetch::ResourceFetcher;
pub use streams::Stream;
pub use types::{Lookup, Resource, ResourcePayload};
pub use users::User;
