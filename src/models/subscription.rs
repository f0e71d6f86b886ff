//! Push subscription model

use serde::{Deserialize, Serialize};

/// Request sent to the push service when subscribing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Every push must result in a visible notification
    pub user_visible_only: bool,
    /// Raw VAPID public key bytes
    pub application_server_key: Vec<u8>,
}

/// Encryption keys of a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Client public key (base64url)
    pub p256dh: String,
    /// Authentication secret (base64url)
    pub auth: String,
}

/// Opaque subscription descriptor returned by the push service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    /// Endpoint the application server pushes to
    pub endpoint: String,
    /// Expiry (epoch milliseconds), if any
    #[serde(default)]
    pub expiration_time: Option<i64>,
    /// Encryption keys
    pub keys: SubscriptionKeys,
}
