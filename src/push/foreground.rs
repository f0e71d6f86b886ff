//! Foreground message path
//!
//! Used while the app is open: messages arrive directly instead of through
//! the background worker and are shown only if permission was granted
//! earlier. Nothing here ever prompts.

use crate::error::PushResult;
use crate::models::NotificationRequest;

use super::worker::notification_from_push;
use super::{NotificationDefaults, Notifier, Permission};

/// Shows foreground push messages as notifications
pub struct ForegroundListener<N> {
    notifier: N,
    defaults: NotificationDefaults,
}

impl<N: Notifier> ForegroundListener<N> {
    /// Create a listener
    pub const fn new(notifier: N, defaults: NotificationDefaults) -> Self {
        Self { notifier, defaults }
    }

    /// Handle one message. Returns the shown notification, or `None` when
    /// the message was dropped for lack of permission.
    pub async fn on_message(
        &self,
        permission: Permission,
        data: &[u8],
    ) -> PushResult<Option<NotificationRequest>> {
        if permission != Permission::Granted {
            tracing::debug!(
                "Dropping foreground message, permission is {}",
                permission.as_str()
            );
            return Ok(None);
        }

        let notification = notification_from_push(Some(data), &self.defaults);
        self.notifier.show_notification(&notification).await?;
        Ok(Some(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingNotifier {
        shown: Arc<Mutex<Vec<String>>>,
    }

    impl Notifier for CountingNotifier {
        async fn show_notification(&self, notification: &NotificationRequest) -> PushResult<()> {
            self.shown.lock().unwrap().push(notification.title.clone());
            Ok(())
        }

        async fn close(&self, _notification: &NotificationRequest) {}
    }

    #[tokio::test]
    async fn test_shows_when_granted() {
        let notifier = CountingNotifier::default();
        let listener = ForegroundListener::new(notifier.clone(), NotificationDefaults::default());

        let shown = listener
            .on_message(Permission::Granted, br#"{"title":"New message from Kabir"}"#)
            .await
            .unwrap();
        assert_eq!(shown.unwrap().title, "New message from Kabir");
        assert_eq!(*notifier.shown.lock().unwrap(), ["New message from Kabir"]);
    }

    #[tokio::test]
    async fn test_drops_without_permission() {
        let notifier = CountingNotifier::default();
        let listener = ForegroundListener::new(notifier.clone(), NotificationDefaults::default());

        for permission in [Permission::Default, Permission::Denied] {
            let shown = listener.on_message(permission, b"{}").await.unwrap();
            assert!(shown.is_none());
        }
        assert!(notifier.shown.lock().unwrap().is_empty());
    }
}
