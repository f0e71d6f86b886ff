//! In-app alert model

use serde::{Deserialize, Serialize};

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Neutral information
    #[default]
    Info,
    /// Something went well
    Success,
    /// Non-critical issue
    Warning,
    /// Something failed
    Error,
}

impl AlertKind {
    /// Get emoji for kind
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Success => "✅",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

/// The single alert currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Text to show
    pub message: String,
    /// Severity
    pub kind: AlertKind,
}

impl Alert {
    /// Create an alert
    pub fn new(message: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Informational alert
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, AlertKind::Info)
    }

    /// Error alert
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, AlertKind::Error)
    }
}
