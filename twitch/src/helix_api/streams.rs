//! Helix `streams` resource.

use crate::helix_api::types::Resource;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A live stream, as returned by `GET /helix/streams`.
///
/// Only channels that are live right now produce a record, so looking up an offline user
/// simply yields nothing for that user.
///
/// See: <https://dev.twitch.tv/docs/api/reference/#get-streams>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    /// Identifies the stream.
    pub id: String,
    /// Id of the broadcasting user.
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_login: Option<String>,
    /// Display name of the broadcasting user.
    pub user_name: String,
    pub game_id: String,
    pub game_name: String,
    /// `live`, or empty if an error occurred on Twitch's side.
    #[serde(rename = "type")]
    pub stream_type: String,
    pub title: String,
    pub viewer_count: u64,
    /// When the broadcast began.
    pub started_at: Timestamp,
    pub language: String,
    /// Template URL with `{width}` and `{height}` placeholders.
    pub thumbnail_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_mature: bool,
}

impl Resource for Stream {
    const PATH: &'static str = "streams";
    const ID_PARAM: &'static str = "user_id";
    const LOGIN_PARAM: &'static str = "user_login";
}
