//! Terminal notifier: prints notification cards and keeps a history

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::error::{PushError, PushResult};
use crate::models::NotificationRequest;
use crate::push::Notifier;

/// Shows notifications on stdout
#[derive(Clone, Default)]
pub struct TerminalNotifier {
    db: Option<Arc<Mutex<Database>>>,
}

impl TerminalNotifier {
    /// Notifier that records every shown notification
    pub fn with_history(db: Arc<Mutex<Database>>) -> Self {
        Self { db: Some(db) }
    }

    /// Render a notification as a terminal card
    pub fn card(notification: &NotificationRequest) -> String {
        let width = notification
            .title
            .chars()
            .count()
            .max(notification.options.body.chars().count())
            .max(notification.url().chars().count() + 2)
            + 2;
        let rule = "─".repeat(width);
        format!(
            "┌{rule}┐\n│ 🔔 {}\n│ {}\n│ → {}\n└{rule}┘",
            notification.title,
            notification.options.body,
            notification.url()
        )
    }
}

impl Notifier for TerminalNotifier {
    async fn show_notification(&self, notification: &NotificationRequest) -> PushResult<()> {
        println!("{}", Self::card(notification));

        if let Some(db) = &self.db {
            let db = db.lock().await;
            db.log_notification(notification)
                .map_err(|e| PushError::Display(format!("{e:#}")))?;
        }

        Ok(())
    }

    async fn close(&self, notification: &NotificationRequest) {
        tracing::debug!("Closed notification \"{}\"", notification.title);
    }
}
