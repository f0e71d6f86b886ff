//! # Dostana 🤝
//!
//! Client core for the Dostana social network.
//!
//! ## Overview
//!
//! The web client is mostly presentation; the pieces with real state live
//! here: the tracker behind the transient "uploading…/posted/failed" cards,
//! the single in-app alert banner, and the push bridge that turns push
//! deliveries into system notifications and notification clicks into
//! focused or newly opened views.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐   ┌──────────────────────┐
//! │  Operation Tracker   │   │      Alert Slot      │   │     Push Bridge      │
//! │                      │   │                      │   │                      │
//! │ • add/update/remove  │   │ • show / dismiss     │   │ • setup (subscribe)  │
//! │ • retry / dismiss    │   │ • auto-hide timer    │   │ • background worker  │
//! │ • success expiry     │   │                      │   │ • foreground path    │
//! └──────────────────────┘   └──────────────────────┘   └──────────────────────┘
//!            │                          │                          │
//!            └──────── tokio tasks, mpsc commands, watch snapshots ┘
//!                                       │
//!          ┌────────────────────────────┼────────────────────────────┐
//!          ▼                            ▼                            ▼
//! ┌─────────────────┐        ┌─────────────────┐        ┌─────────────────┐
//! │     Config      │        │    Database     │        │     Desktop     │
//! │ • TOML file     │        │ • Subscription  │        │ • Terminal      │
//! │ • Defaults      │        │ • History       │        │ • Browser views │
//! └─────────────────┘        └─────────────────┘        └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tracker`] — Ephemeral operation tracker
//! - [`alert`] — Single-slot alert banner
//! - [`push`] — Push notification bridge (setup, worker, foreground)
//! - [`desktop`] — Terminal/browser implementations of the push platform
//! - [`api`] — Profile API client
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` storage for the subscription and history
//! - [`models`] — Data models
//!
//! ## Example
//!
//! ```no_run
//! use dostana::models::{Operation, OperationStatus};
//! use dostana::tracker::spawn_tracker;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let tracker = spawn_tracker();
//! tracker.add(Operation::new("up-1", "Uploading photo"), None).await?;
//! tracker.set_status("up-1", OperationStatus::Success).await?;
//! // Gone again two seconds later
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/dostana/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::future_not_send)]

pub mod alert;
pub mod api;
pub mod config;
pub mod db;
pub mod desktop;
pub mod error;
pub mod models;
pub mod paths;
pub mod push;
pub mod tracker;

// Re-export main types for convenience
pub use alert::{AlertHandle, spawn_alerts};
pub use config::Config;
pub use db::Database;
pub use error::{AlertError, PushError, TrackerError};
pub use models::{Alert, Operation, OperationStatus, PushPayload, PushSubscription};
pub use tracker::{TrackerHandle, spawn_tracker};

/// ASCII logo for the application
pub const LOGO: &str = r"
   ___          _
  / _ \___  ___| |_ __ _ _ __   __ _
 / // / _ \(_-<  _/ _` | '  \ / _` |
/____/\___/__/\__\__,_|_||_|\__,_|
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
