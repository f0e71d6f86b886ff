//! Profile and presence models (remote API shapes)

use serde::{Deserialize, Serialize};

/// A user profile as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// User ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Username/handle
    #[serde(default)]
    pub username: String,
    /// Avatar URL
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Bio text
    #[serde(default)]
    pub bio: Option<String>,
}

/// Identity announced on the presence channel when connecting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    /// User ID
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Tri-state of a remote fetch, as consumed by the display layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState<T> {
    /// Request in flight
    #[default]
    Loading,
    /// Data arrived
    Success(T),
    /// Request failed
    Error(String),
}

impl<T> FetchState<T> {
    /// Is the request still in flight?
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The data, if it arrived
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }
}

impl<T> From<anyhow::Result<T>> for FetchState<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::Error(format!("{e:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_from_connect_message() {
        let json = r#"{"userId":"u1","name":"Asha","profileImage":"https://cdn/x.png"}"#;
        let presence: Presence = serde_json::from_str(json).unwrap();
        assert_eq!(presence.user_id, "u1");
        assert_eq!(presence.profile_image.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn test_fetch_state_from_result() {
        let ok: FetchState<u32> = Ok(3).into();
        assert_eq!(ok.data(), Some(&3));

        let err: FetchState<u32> = Err(anyhow::anyhow!("boom")).into();
        assert_eq!(err, FetchState::Error("boom".to_string()));
        assert!(FetchState::<u32>::default().is_loading());
    }
}
