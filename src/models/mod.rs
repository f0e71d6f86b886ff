//! Data models for Dostana

mod alert;
mod notification;
mod operation;
mod profile;
mod subscription;

pub use alert::{Alert, AlertKind};
pub use notification::{
    NotificationData, NotificationOptions, NotificationRequest, PayloadData, PushPayload,
};
pub use operation::{Attachment, AttachmentKind, Operation, OperationPatch, OperationStatus};
pub use profile::{FetchState, Presence, Profile};
pub use subscription::{PushSubscription, SubscriptionKeys, SubscriptionOptions};
