//! Shared types for Helix lookups.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The envelope every Helix list endpoint wraps its records in.
///
/// Helix also sends a `pagination` cursor on some endpoints; lookups by id or login never
/// need it, so it is ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourcePayload<T> {
    pub data: Vec<T>,
}

/// What the lookup keys of a query identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Numeric user ids, sent as strings.
    Id,
    /// Login names.
    Login,
}

/// A record type that can be looked up in batches on a Helix endpoint.
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Path below the Helix base URL, e.g. `streams`.
    const PATH: &'static str;
    /// Query parameter used when looking up by [`Lookup::Id`].
    const ID_PARAM: &'static str;
    /// Query parameter used when looking up by [`Lookup::Login`].
    const LOGIN_PARAM: &'static str;

    fn query_param(lookup: Lookup) -> &'static str {
        match lookup {
            Lookup::Id => Self::ID_PARAM,
            Lookup::Login => Self::LOGIN_PARAM,
        }
    }
}
