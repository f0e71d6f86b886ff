//! Push notification bridge
//!
//! Connects the platform's background push delivery to the application's
//! views. The platform itself (worker registration, permission prompt,
//! push service, notification display, open views) sits behind the traits
//! in this module so the decision logic stays testable.

pub mod foreground;
pub mod setup;
pub mod worker;

pub use foreground::ForegroundListener;
pub use setup::{PushSetup, decode_vapid_key};
pub use worker::{
    ClickAction, ServiceWorker, WorkerEvent, WorkerHandle, WorkerOutcome, notification_from_push,
    route_click, spawn_worker,
};

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::PushResult;
use crate::models::{NotificationRequest, PushSubscription, SubscriptionOptions};

/// Notification permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Never asked
    #[default]
    Default,
    /// User allowed notifications
    Granted,
    /// User refused notifications
    Denied,
}

impl Permission {
    /// Get permission as string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

/// A registered background worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Script path
    pub path: String,
    /// Scope the worker controls
    pub scope: String,
}

/// An open application view (window or tab)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInfo {
    /// Platform identifier of the view
    pub id: String,
    /// URL the view currently shows
    pub url: String,
}

/// Platform services needed to set up push delivery
#[allow(async_fn_in_trait)]
pub trait PushPlatform {
    /// Can this platform run a background worker at all?
    fn supports_background(&self) -> bool;

    /// Register the background worker script
    async fn register_worker(&self, path: &str, scope: &str) -> PushResult<Registration>;

    /// Current permission, without prompting
    fn permission(&self) -> Permission;

    /// Ask the user for permission
    async fn request_permission(&self) -> Permission;

    /// Subscribe the worker to the push service
    async fn subscribe(
        &self,
        registration: &Registration,
        options: &SubscriptionOptions,
    ) -> PushResult<PushSubscription>;
}

/// Displays system notifications
pub trait Notifier: Send + Sync {
    /// Show a notification
    fn show_notification(
        &self,
        notification: &NotificationRequest,
    ) -> impl Future<Output = PushResult<()>> + Send;

    /// Close a delivered notification
    fn close(&self, notification: &NotificationRequest) -> impl Future<Output = ()> + Send;
}

/// Enumerates, focuses and opens application views
pub trait ViewHost: Send + Sync {
    /// Views currently open
    fn open_views(&self) -> impl Future<Output = Vec<ViewInfo>> + Send;

    /// Bring a view to the front
    fn focus(&self, view_id: &str) -> impl Future<Output = PushResult<()>> + Send;

    /// Open a new view at `url`
    fn open(&self, url: &str) -> impl Future<Output = PushResult<ViewInfo>> + Send;
}

/// Fallback text and icon used for notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    /// Title when the payload has none
    pub title: String,
    /// Body when the payload has none
    pub body: String,
    /// Deep link when the payload has none
    pub url: String,
    /// Icon on every notification
    pub icon: String,
}

impl NotificationDefaults {
    /// Defaults taken from the configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.app_name.clone(),
            body: config.default_body.clone(),
            url: config.default_url.clone(),
            icon: config.icon.clone(),
        }
    }
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
