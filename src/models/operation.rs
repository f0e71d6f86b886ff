//! Operation record model (in-flight uploads and actions)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum OperationStatus {
    /// Queued, not started yet
    Pending,
    /// In progress
    #[default]
    Loading,
    /// Finished successfully (expires shortly after)
    Success,
    /// Failed, waits for retry or dismissal
    Error,
}

impl OperationStatus {
    /// Get status as string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Get emoji for status
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Pending => "⏳",
            Self::Loading => "📤",
            Self::Success => "✅",
            Self::Error => "❌",
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of media attached to an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

/// Media preview shown on a status card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Media kind
    pub kind: AttachmentKind,
    /// Preview reference (URL or local path)
    pub preview: String,
}

impl Attachment {
    /// Image attachment
    pub fn image(preview: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            preview: preview.into(),
        }
    }

    /// Video attachment
    pub fn video(preview: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Video,
            preview: preview.into(),
        }
    }
}

/// An operation record as seen by the display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Caller-supplied unique identifier
    pub id: String,
    /// Attached media, fixed at creation
    pub attachments: Vec<Attachment>,
    /// Descriptive text, fixed at creation
    pub label: String,
    /// Current status
    pub status: OperationStatus,
    /// Whether a retry handler is bound
    pub retryable: bool,
    /// When this was created
    pub created_at: DateTime<Utc>,
}

impl Operation {
    /// Create a new loading operation
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attachments: Vec::new(),
            label: label.into(),
            status: OperationStatus::Loading,
            retryable: false,
            created_at: Utc::now(),
        }
    }

    /// Attach media previews
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Override the initial status
    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }

    /// Apply a patch. Only mutable fields are touched.
    pub fn apply(&mut self, patch: &OperationPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// One-line card text for terminal display
    pub fn card(&self) -> String {
        let media = if self.attachments.is_empty() {
            String::new()
        } else {
            format!(" [{} media]", self.attachments.len())
        };
        let retry = if self.retryable && self.status == OperationStatus::Error {
            " (r to retry)"
        } else {
            ""
        };
        format!("{} {}{}{}", self.status.emoji(), self.label, media, retry)
    }
}

/// Partial update to an operation
///
/// Only the status is mutable; id, label and attachments are fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPatch {
    /// New status
    pub status: Option<OperationStatus>,
}

impl OperationPatch {
    /// Patch that sets the status
    pub const fn status(status: OperationStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}
