//! Database module for `SQLite` storage (push subscription, notification history)

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{NotificationRequest, PushSubscription, SubscriptionKeys};
use crate::paths;

/// A notification that was shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedNotification {
    /// Row ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Deep link
    pub url: String,
    /// When it was shown
    pub shown_at: DateTime<Utc>,
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

/// Fixed-width UTC timestamp so text order matches time order
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        paths::database_path()
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            -- Active push subscription (at most one row)
            CREATE TABLE IF NOT EXISTS push_subscription (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                endpoint TEXT NOT NULL,
                expiration_time INTEGER,
                p256dh TEXT NOT NULL,
                auth TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Notifications shown on this device
            CREATE TABLE IF NOT EXISTS notification_log (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                url TEXT NOT NULL,
                shown_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notification_log_shown_at ON notification_log(shown_at);
            ",
        )?;

        Ok(())
    }

    // === Push subscription ===

    /// Store the active subscription, replacing any previous one
    pub fn save_subscription(&self, subscription: &PushSubscription) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO push_subscription
             (slot, endpoint, expiration_time, p256dh, auth, created_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)",
            params![
                subscription.endpoint,
                subscription.expiration_time,
                subscription.keys.p256dh,
                subscription.keys.auth,
                timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Get the stored subscription
    pub fn get_subscription(&self) -> Result<Option<PushSubscription>> {
        let subscription = self
            .conn
            .query_row(
                "SELECT endpoint, expiration_time, p256dh, auth
                 FROM push_subscription WHERE slot = 1",
                [],
                |row| {
                    Ok(PushSubscription {
                        endpoint: row.get(0)?,
                        expiration_time: row.get(1)?,
                        keys: SubscriptionKeys {
                            p256dh: row.get(2)?,
                            auth: row.get(3)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(subscription)
    }

    /// Forget the stored subscription
    pub fn clear_subscription(&self) -> Result<bool> {
        let count = self.conn.execute("DELETE FROM push_subscription", [])?;
        Ok(count > 0)
    }

    // === Notification history ===

    /// Record a shown notification
    pub fn log_notification(&self, notification: &NotificationRequest) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notification_log (id, title, body, url, shown_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                notification.title,
                notification.options.body,
                notification.url(),
                timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Most recent notifications, newest first
    pub fn recent_notifications(&self, limit: usize) -> Result<Vec<LoggedNotification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, body, url, shown_at FROM notification_log
             ORDER BY shown_at DESC, rowid DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let id: String = row.get(0)?;
            let shown_at: String = row.get(4)?;
            Ok(LoggedNotification {
                id: Uuid::parse_str(&id).unwrap_or_default(),
                title: row.get(1)?,
                body: row.get(2)?,
                url: row.get(3)?,
                shown_at: DateTime::parse_from_rfc3339(&shown_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to read notification history")
    }

    /// Delete history entries older than `max_age_hours`
    pub fn clear_old_notifications(&self, max_age_hours: u64) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours as i64);
        let count = self.conn.execute(
            "DELETE FROM notification_log WHERE shown_at < ?1",
            params![timestamp(cutoff)],
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::NotificationDefaults;
    use crate::push::notification_from_push;
    use tempfile::tempdir;

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            endpoint: endpoint.to_string(),
            expiration_time: Some(1_700_000_000_000),
            keys: SubscriptionKeys {
                p256dh: "BPk".to_string(),
                auth: "c2Vj".to_string(),
            },
        }
    }

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let _db = Database::open_path(&path).unwrap();
        // Opening twice must not fail on existing tables
        let _db = Database::open_path(&path).unwrap();
    }

    #[test]
    fn test_subscription_single_slot() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();
        assert!(db.get_subscription().unwrap().is_none());

        db.save_subscription(&subscription("https://push/a")).unwrap();
        db.save_subscription(&subscription("https://push/b")).unwrap();
        assert_eq!(db.get_subscription().unwrap(), Some(subscription("https://push/b")));

        assert!(db.clear_subscription().unwrap());
        assert!(!db.clear_subscription().unwrap());
        assert!(db.get_subscription().unwrap().is_none());
    }

    #[test]
    fn test_notification_history_newest_first() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();
        let defaults = NotificationDefaults::default();

        for title in ["one", "two", "three"] {
            let raw = format!(r#"{{"title":"{title}"}}"#);
            db.log_notification(&notification_from_push(Some(raw.as_bytes()), &defaults))
                .unwrap();
        }

        let recent = db.recent_notifications(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "three");
        assert_eq!(recent[1].title, "two");
        assert_eq!(recent[0].url, "/");

        assert_eq!(db.clear_old_notifications(1).unwrap(), 0);
    }

    #[test]
    fn test_clear_old_notifications_prunes_past_cutoff() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();
        let defaults = NotificationDefaults::default();

        db.log_notification(&notification_from_push(None, &defaults))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert_eq!(db.clear_old_notifications(0).unwrap(), 1);
        assert!(db.recent_notifications(10).unwrap().is_empty());
    }
}
