//! Failure kinds that callers may want to branch on.
//!
//! Public functions in this crate return [`eyre::Result`]. When a failure has one of the
//! shapes below, the [`eyre::Report`] carries a [`HelixError`] that can be recovered with
//! [`eyre::Report::downcast_ref`].

use http::StatusCode;

/// A failure reported by the Twitch endpoints themselves (as opposed to the transport).
#[derive(Debug, Clone, thiserror::Error)]
pub enum HelixError {
    /// The authorization endpoint kept answering with a non-success status until all
    /// retries were used up.
    #[error("authorization failed after {attempts} attempt(s), last status {status}")]
    Auth {
        /// Total number of requests sent, including the first one.
        attempts: u32,
        /// Status of the final response.
        status: StatusCode,
    },

    /// At least one batch of a resource query returned a non-success status.
    ///
    /// No partial results are returned alongside this error.
    #[error("resource request failed with status {status}")]
    ResourceFetch {
        /// Status of the first failing batch, in batch order.
        status: StatusCode,
    },

    /// The authorization endpoint answered with success but the body did not hold a usable
    /// token.
    #[error("authorization response did not contain a usable token: {0}")]
    InvalidToken(&'static str),
}
