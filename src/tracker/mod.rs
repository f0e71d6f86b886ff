//! Ephemeral operation tracker
//!
//! Owns the list of in-flight operations (uploads, posts, reactions) shown
//! as transient status cards. The list lives in a single task; callers talk
//! to it through a cloneable [`TrackerHandle`] and read snapshots from a
//! `watch` channel.
//!
//! Successful operations expire on their own after a fixed delay. Each
//! expiry timer is cancelled when the record is removed or leaves `success`,
//! and is re-checked against a generation counter when it fires.

mod list;

pub use list::{OperationList, RetryHandler, StatusChange};

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::TrackerError;
use crate::models::{Operation, OperationPatch, OperationStatus};

/// Default time a successful operation stays visible
pub const SUCCESS_EXPIRY: Duration = Duration::from_millis(2000);

/// Commands sent from handles to the tracker task
enum TrackerCommand {
    Add {
        operation: Operation,
        retry: Option<RetryHandler>,
        reply: oneshot::Sender<Result<(), TrackerError>>,
    },
    Update {
        id: String,
        patch: OperationPatch,
        reply: oneshot::Sender<()>,
    },
    Remove {
        id: String,
        reply: oneshot::Sender<()>,
    },
    Retry {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Fired by an expiry timer
struct Expired {
    id: String,
    generation: u64,
}

struct ExpiryTimer {
    generation: u64,
    task: JoinHandle<()>,
}

/// Handle for talking to the tracker task
#[derive(Clone)]
pub struct TrackerHandle {
    cmd_tx: mpsc::Sender<TrackerCommand>,
    snapshot_rx: watch::Receiver<Vec<Operation>>,
}

/// Spawn the tracker with the default success expiry
pub fn spawn_tracker() -> TrackerHandle {
    spawn_tracker_with_expiry(SUCCESS_EXPIRY)
}

/// Spawn the tracker task and return a handle
pub fn spawn_tracker_with_expiry(expiry: Duration) -> TrackerHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<TrackerCommand>(32);
    let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());

    let tracker = Tracker::new(expiry, snapshot_tx);
    tokio::spawn(tracker.run(cmd_rx));

    TrackerHandle {
        cmd_tx,
        snapshot_rx,
    }
}

impl TrackerHandle {
    /// Start tracking an operation.
    ///
    /// Fails with [`TrackerError::DuplicateId`] if the id is already tracked.
    pub async fn add(
        &self,
        operation: Operation,
        retry: Option<RetryHandler>,
    ) -> Result<(), TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerCommand::Add {
            operation,
            retry,
            reply,
        })
        .await?;
        rx.await.map_err(|_| TrackerError::Closed)?
    }

    /// Merge a patch into an operation. Unknown ids are ignored.
    pub async fn update(&self, id: &str, patch: OperationPatch) -> Result<(), TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerCommand::Update {
            id: id.to_string(),
            patch,
            reply,
        })
        .await?;
        rx.await.map_err(|_| TrackerError::Closed)
    }

    /// Set an operation's status
    pub async fn set_status(&self, id: &str, status: OperationStatus) -> Result<(), TrackerError> {
        self.update(id, OperationPatch::status(status)).await
    }

    /// Stop tracking an operation. Unknown ids are ignored.
    pub async fn remove(&self, id: &str) -> Result<(), TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerCommand::Remove {
            id: id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| TrackerError::Closed)
    }

    /// User dismissed a status card
    pub async fn dismiss(&self, id: &str) -> Result<(), TrackerError> {
        self.remove(id).await
    }

    /// User asked to retry a failed operation.
    ///
    /// Returns `true` if a retry handler ran and the operation is loading again.
    pub async fn retry(&self, id: &str) -> Result<bool, TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerCommand::Retry {
            id: id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| TrackerError::Closed)
    }

    /// Track a piece of work from start to finish.
    ///
    /// The operation is added as `loading`, then marked `success` or `error`
    /// depending on the outcome of `work`.
    pub async fn track<F, T, E>(
        &self,
        operation: Operation,
        retry: Option<RetryHandler>,
        work: F,
    ) -> Result<Result<T, E>, TrackerError>
    where
        F: Future<Output = Result<T, E>>,
    {
        let id = operation.id.clone();
        self.add(operation.with_status(OperationStatus::Loading), retry)
            .await?;

        let result = work.await;
        let status = if result.is_ok() {
            OperationStatus::Success
        } else {
            OperationStatus::Error
        };
        self.set_status(&id, status).await?;

        Ok(result)
    }

    /// Current operations in insertion order
    pub fn snapshot(&self) -> Vec<Operation> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that is notified whenever the list changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<Operation>> {
        self.snapshot_rx.clone()
    }

    /// Stop the tracker task
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(TrackerCommand::Shutdown).await;
    }

    async fn send(&self, cmd: TrackerCommand) -> Result<(), TrackerError> {
        self.cmd_tx.send(cmd).await.map_err(|_| TrackerError::Closed)
    }
}

/// State owned by the tracker task
struct Tracker {
    list: OperationList,
    expiry: Duration,
    timers: HashMap<String, ExpiryTimer>,
    next_generation: u64,
    expired_tx: mpsc::UnboundedSender<Expired>,
    expired_rx: mpsc::UnboundedReceiver<Expired>,
    snapshot_tx: watch::Sender<Vec<Operation>>,
}

impl Tracker {
    fn new(expiry: Duration, snapshot_tx: watch::Sender<Vec<Operation>>) -> Self {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        Self {
            list: OperationList::new(),
            expiry,
            timers: HashMap::new(),
            next_generation: 0,
            expired_tx,
            expired_rx,
            snapshot_tx,
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<TrackerCommand>) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        None | Some(TrackerCommand::Shutdown) => break,
                        Some(cmd) => self.handle(cmd),
                    }
                }
                Some(expired) = self.expired_rx.recv() => {
                    self.handle_expired(&expired);
                }
            }
        }

        for (_, timer) in self.timers.drain() {
            timer.task.abort();
        }
        tracing::debug!("Operation tracker stopped");
    }

    fn handle(&mut self, cmd: TrackerCommand) {
        match cmd {
            TrackerCommand::Add {
                operation,
                retry,
                reply,
            } => {
                let id = operation.id.clone();
                let status = operation.status;
                let result = self.list.add(operation, retry);
                match &result {
                    Ok(()) => {
                        tracing::debug!("Tracking operation {} ({})", id, status);
                        if status == OperationStatus::Success {
                            self.arm_expiry(&id);
                        }
                        self.publish();
                    }
                    Err(e) => tracing::warn!("{}", e),
                }
                let _ = reply.send(result);
            }
            TrackerCommand::Update { id, patch, reply } => {
                if let Some(change) = self.list.update(&id, &patch) {
                    if change.entered_success() {
                        self.arm_expiry(&id);
                    } else if change.left_success() {
                        self.cancel_expiry(&id);
                    }
                    tracing::debug!("Operation {}: {} -> {}", id, change.from, change.to);
                    self.publish();
                }
                let _ = reply.send(());
            }
            TrackerCommand::Remove { id, reply } => {
                if self.list.remove(&id).is_some() {
                    self.cancel_expiry(&id);
                    tracing::debug!("Removed operation {}", id);
                    self.publish();
                }
                let _ = reply.send(());
            }
            TrackerCommand::Retry { id, reply } => {
                let retried = match self.list.retry(&id) {
                    Some(handler) => {
                        tracing::info!("Retrying operation {}", id);
                        handler();
                        self.publish();
                        true
                    }
                    None => false,
                };
                let _ = reply.send(retried);
            }
            TrackerCommand::Shutdown => {}
        }
    }

    fn handle_expired(&mut self, expired: &Expired) {
        let current = self
            .timers
            .get(&expired.id)
            .is_some_and(|t| t.generation == expired.generation);
        if !current {
            return;
        }
        self.timers.remove(&expired.id);

        if self.list.expire(&expired.id) {
            tracing::debug!("Operation {} expired", expired.id);
            self.publish();
        }
    }

    fn arm_expiry(&mut self, id: &str) {
        self.cancel_expiry(id);

        self.next_generation += 1;
        let generation = self.next_generation;
        let expired_tx = self.expired_tx.clone();
        let expiry = self.expiry;
        let owned_id = id.to_string();

        let task = tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            let _ = expired_tx.send(Expired {
                id: owned_id,
                generation,
            });
        });

        self.timers
            .insert(id.to_string(), ExpiryTimer { generation, task });
    }

    fn cancel_expiry(&mut self, id: &str) {
        if let Some(timer) = self.timers.remove(id) {
            timer.task.abort();
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.list.snapshot());
    }
}
