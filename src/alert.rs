//! Single-slot alert ("current alert" banner)
//!
//! Same lifecycle as a tracked operation but with room for exactly one
//! alert: showing a new alert replaces the old one, and every alert hides
//! itself after a timeout unless dismissed first.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::AlertError;
use crate::models::Alert;

/// Default time an alert stays visible
pub const ALERT_TIMEOUT: Duration = Duration::from_millis(3000);

enum AlertCommand {
    Show(Alert),
    Dismiss,
}

/// Handle for the alert slot
#[derive(Clone)]
pub struct AlertHandle {
    cmd_tx: mpsc::UnboundedSender<AlertCommand>,
    current_rx: watch::Receiver<Option<Alert>>,
}

/// Spawn the alert slot task
pub fn spawn_alerts(timeout: Duration) -> AlertHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<AlertCommand>();
    let (hide_tx, mut hide_rx) = mpsc::unbounded_channel::<u64>();
    let (current_tx, current_rx) = watch::channel(None);

    tokio::spawn(async move {
        let mut generation = 0u64;
        let mut timer: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if let Some(t) = timer.take() {
                        t.abort();
                    }
                    generation += 1;
                    match cmd {
                        AlertCommand::Show(alert) => {
                            tracing::debug!("Alert: {}", alert.message);
                            current_tx.send_replace(Some(alert));
                            let hide_tx = hide_tx.clone();
                            let shown = generation;
                            timer = Some(tokio::spawn(async move {
                                tokio::time::sleep(timeout).await;
                                let _ = hide_tx.send(shown);
                            }));
                        }
                        AlertCommand::Dismiss => {
                            current_tx.send_replace(None);
                        }
                    }
                }
                Some(shown) = hide_rx.recv() => {
                    if shown == generation {
                        timer = None;
                        current_tx.send_replace(None);
                    }
                }
            }
        }

        if let Some(t) = timer {
            t.abort();
        }
    });

    AlertHandle { cmd_tx, current_rx }
}

impl AlertHandle {
    /// Show an alert, replacing the current one
    pub fn show(&self, alert: Alert) -> Result<(), AlertError> {
        self.send(AlertCommand::Show(alert))
    }

    /// Hide the current alert
    pub fn dismiss(&self) -> Result<(), AlertError> {
        self.send(AlertCommand::Dismiss)
    }

    fn send(&self, cmd: AlertCommand) -> Result<(), AlertError> {
        self.cmd_tx.send(cmd).map_err(|_| AlertError::Closed)
    }

    /// Alert on screen right now
    pub fn current(&self) -> Option<Alert> {
        self.current_rx.borrow().clone()
    }

    /// Receiver notified whenever the slot changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Alert>> {
        self.current_rx.clone()
    }
}
