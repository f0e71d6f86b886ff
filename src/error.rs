//! Error types for the tracker, the alert slot and the push bridge

use thiserror::Error;

/// Errors reported by the operation tracker
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// An operation with this id is already tracked
    #[error("operation already tracked: {0}")]
    DuplicateId(String),

    /// The tracker task has shut down
    #[error("operation tracker is not running")]
    Closed,
}

/// Errors reported by the alert slot
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlertError {
    /// The alert task has shut down
    #[error("alert slot is not running")]
    Closed,
}

/// Errors reported by push setup and the background worker
#[derive(Debug, Error)]
pub enum PushError {
    /// The user (or platform policy) refused notifications
    #[error("notification permission denied")]
    PermissionDenied,

    /// The platform cannot run a background worker
    #[error("background workers are not supported on this platform")]
    UnsupportedPlatform,

    /// The configured VAPID public key is not valid base64url
    #[error("invalid VAPID public key: {0}")]
    InvalidVapidKey(String),

    /// Worker registration was rejected
    #[error("worker registration failed: {0}")]
    Registration(String),

    /// The push service rejected or failed the subscription
    #[error("push subscription failed: {0}")]
    SubscriptionFailed(String),

    /// Showing a notification failed
    #[error("failed to display notification: {0}")]
    Display(String),

    /// Focusing or opening a view failed
    #[error("view operation failed: {0}")]
    View(String),

    /// The background worker task has shut down
    #[error("background worker is not running")]
    WorkerClosed,
}

/// Result alias for push operations
pub type PushResult<T> = std::result::Result<T, PushError>;
