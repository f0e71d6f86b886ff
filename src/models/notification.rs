//! Push payload and notification display models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload delivered by the push service
///
/// Every field is optional; absent fields fall back to configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    /// Notification title
    #[serde(default)]
    pub title: Option<String>,
    /// Notification body
    #[serde(default)]
    pub body: Option<String>,
    /// Extra data (deep link)
    #[serde(default)]
    pub data: Option<PayloadData>,
}

/// The `data` object of a push payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadData {
    /// Deep link to open on click
    #[serde(default)]
    pub url: Option<String>,
}

impl PushPayload {
    /// Parse a raw payload. Bytes that are not JSON become the empty payload;
    /// otherwise each field is read on its own, and a missing, mistyped or
    /// empty field is treated as absent.
    pub fn parse(raw: &[u8]) -> Self {
        let value = match serde_json::from_slice::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Unparseable push payload, using defaults: {}", e);
                return Self::default();
            }
        };

        let url = value.get("data").and_then(|data| text_field(data, "url"));
        Self {
            title: text_field(&value, "title"),
            body: text_field(&value, "body"),
            data: url.map(|url| PayloadData { url: Some(url) }),
        }
    }

    /// Target URL, if the payload carries one
    pub fn url(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.url.as_deref())
    }
}

/// Non-empty string field of a JSON object
fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Data attached to a displayed notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Deep link opened on click
    pub url: String,
}

/// Options passed to the platform's notification display call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    /// Body text
    pub body: String,
    /// Icon path
    pub icon: String,
    /// Associated data
    pub data: NotificationData,
}

/// A fully resolved notification ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Title line
    pub title: String,
    /// Display options
    pub options: NotificationOptions,
}

impl NotificationRequest {
    /// Target URL of this notification
    pub fn url(&self) -> &str {
        &self.options.data.url
    }
}
