//! Helix `users` resource.

use crate::helix_api::types::Resource;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A Twitch user, as returned by `GET /helix/users`.
///
/// Only `login` is guaranteed. Everything else defaults when Twitch leaves it out.
///
/// See: <https://dev.twitch.tv/docs/api/reference/#get-users>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    /// `admin`, `global_mod`, `staff`, or empty.
    #[serde(default, rename = "type")]
    pub user_type: String,
    /// `affiliate`, `partner`, or empty.
    #[serde(default)]
    pub broadcaster_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub offline_image_url: String,
    /// Deprecated by Twitch; usually 0.
    #[serde(default)]
    pub view_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Only present for user access tokens with the `user:read:email` scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Resource for User {
    const PATH: &'static str = "users";
    const ID_PARAM: &'static str = "id";
    const LOGIN_PARAM: &'static str = "login";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helix_api::types::Lookup;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_full_user() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "141981764",
            "login": "twitchdev",
            "display_name": "TwitchDev",
            "type": "",
            "broadcaster_type": "partner",
            "description": "Supporting third-party developers building Twitch integrations.",
            "profile_image_url": "https://static-cdn.jtvnw.net/jtv_user_pictures/profile.png",
            "offline_image_url": "https://static-cdn.jtvnw.net/jtv_user_pictures/offline.png",
            "view_count": 5980557,
            "created_at": "2016-12-14T20:32:28Z"
        }))
        .unwrap();

        assert_eq!(user.login, "twitchdev");
        assert_eq!(user.broadcaster_type, "partner");
        assert_eq!(user.created_at.unwrap().as_second(), 1481747548);
        assert_eq!(user.email, None);
    }

    #[test]
    fn login_is_enough() {
        let user: User = serde_json::from_value(serde_json::json!({ "login": "eager" })).unwrap();
        assert_eq!(user.login, "eager");
        assert_eq!(user.id, "");
        assert_eq!(user.created_at, None);
    }

    #[test]
    fn login_is_required() {
        assert!(serde_json::from_value::<User>(serde_json::json!({ "id": "1" })).is_err());
    }

    #[test]
    fn query_params() {
        assert_eq!(User::query_param(Lookup::Id), "id");
        assert_eq!(User::query_param(Lookup::Login), "login");
    }
}
