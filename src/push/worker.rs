//! Background worker: reacts to push and notification-click events
//!
//! Runs as its own task with no state shared with the foreground. Each
//! event is answered only after the display/focus/open call it triggers has
//! completed, so the sender knows the event is fully handled.

use tokio::sync::{mpsc, oneshot};

use crate::error::{PushError, PushResult};
use crate::models::{NotificationData, NotificationOptions, NotificationRequest, PushPayload};

use super::{NotificationDefaults, Notifier, ViewHost, ViewInfo};

/// Events the platform delivers to the worker
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Worker script installed
    Install,
    /// Worker took control of its scope
    Activate,
    /// Push message arrived (raw payload, possibly absent)
    Push {
        /// Raw payload bytes
        data: Option<Vec<u8>>,
    },
    /// User clicked a delivered notification
    NotificationClick {
        /// The notification that was clicked
        notification: NotificationRequest,
    },
}

/// What the worker did in response to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Install handled
    Installed,
    /// Activate handled
    Activated,
    /// A notification was shown
    Displayed(NotificationRequest),
    /// An existing view was focused
    Focused(ViewInfo),
    /// A new view was opened
    Opened(ViewInfo),
}

/// Decision for a notification click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Focus the view that already shows the target
    Focus(ViewInfo),
    /// Open a new view at this URL
    Open(String),
}

/// Build the notification to show for a push payload
pub fn notification_from_push(
    data: Option<&[u8]>,
    defaults: &NotificationDefaults,
) -> NotificationRequest {
    let payload = data.map(PushPayload::parse).unwrap_or_default();

    let url = payload
        .url()
        .filter(|u| !u.is_empty())
        .unwrap_or(&defaults.url)
        .to_string();

    NotificationRequest {
        title: payload.title.unwrap_or_else(|| defaults.title.clone()),
        options: NotificationOptions {
            body: payload.body.unwrap_or_else(|| defaults.body.clone()),
            icon: defaults.icon.clone(),
            data: NotificationData { url },
        },
    }
}

/// Decide whether a click focuses an open view or opens a new one
pub fn route_click(url: &str, views: &[ViewInfo]) -> ClickAction {
    views
        .iter()
        .find(|view| shows_target(&view.url, url))
        .map_or_else(
            || ClickAction::Open(url.to_string()),
            |view| ClickAction::Focus(view.clone()),
        )
}

/// Does a view at `view_url` already show `target`?
///
/// Targets are usually app-relative (`/chat/42`) while views report absolute
/// URLs, so a relative target is compared against the view's path.
fn shows_target(view_url: &str, target: &str) -> bool {
    if view_url == target {
        return true;
    }
    if !target.starts_with('/') {
        return false;
    }
    let Some((_, rest)) = view_url.split_once("://") else {
        return false;
    };
    let path = rest.find('/').map_or("/", |idx| &rest[idx..]);
    path == target
}

/// Event handlers bound to the platform's notifier and view host
pub struct ServiceWorker<N, V> {
    notifier: N,
    views: V,
    defaults: NotificationDefaults,
}

impl<N: Notifier, V: ViewHost> ServiceWorker<N, V> {
    /// Create a worker
    pub const fn new(notifier: N, views: V, defaults: NotificationDefaults) -> Self {
        Self {
            notifier,
            views,
            defaults,
        }
    }

    /// Handle one event to completion
    pub async fn handle(&self, event: WorkerEvent) -> PushResult<WorkerOutcome> {
        match event {
            WorkerEvent::Install => {
                tracing::debug!("Worker installed");
                Ok(WorkerOutcome::Installed)
            }
            WorkerEvent::Activate => {
                tracing::debug!("Worker activated");
                Ok(WorkerOutcome::Activated)
            }
            WorkerEvent::Push { data } => {
                let notification = notification_from_push(data.as_deref(), &self.defaults);
                self.notifier.show_notification(&notification).await?;
                Ok(WorkerOutcome::Displayed(notification))
            }
            WorkerEvent::NotificationClick { notification } => {
                self.notifier.close(&notification).await;

                let url = if notification.url().is_empty() {
                    self.defaults.url.as_str()
                } else {
                    notification.url()
                };

                let views = self.views.open_views().await;
                match route_click(url, &views) {
                    ClickAction::Focus(view) => {
                        self.views.focus(&view.id).await?;
                        tracing::debug!("Focused view {} at {}", view.id, view.url);
                        Ok(WorkerOutcome::Focused(view))
                    }
                    ClickAction::Open(url) => {
                        let view = self.views.open(&url).await?;
                        tracing::debug!("Opened view {} at {}", view.id, view.url);
                        Ok(WorkerOutcome::Opened(view))
                    }
                }
            }
        }
    }
}

struct Envelope {
    event: WorkerEvent,
    reply: oneshot::Sender<PushResult<WorkerOutcome>>,
}

/// Handle for delivering events to the worker task
#[derive(Clone)]
pub struct WorkerHandle {
    event_tx: mpsc::Sender<Envelope>,
}

/// Spawn the worker task and return a handle
pub fn spawn_worker<N, V>(worker: ServiceWorker<N, V>) -> WorkerHandle
where
    N: Notifier + 'static,
    V: ViewHost + 'static,
{
    let (event_tx, mut event_rx) = mpsc::channel::<Envelope>(32);

    tokio::spawn(async move {
        while let Some(Envelope { event, reply }) = event_rx.recv().await {
            let result = worker.handle(event).await;
            if let Err(e) = &result {
                tracing::error!("Worker event failed: {}", e);
            }
            let _ = reply.send(result);
        }
        tracing::debug!("Worker stopped");
    });

    WorkerHandle { event_tx }
}

impl WorkerHandle {
    /// Deliver an event and wait until it is fully handled
    pub async fn dispatch(&self, event: WorkerEvent) -> PushResult<WorkerOutcome> {
        let (reply, rx) = oneshot::channel();
        self.event_tx
            .send(Envelope { event, reply })
            .await
            .map_err(|_| PushError::WorkerClosed)?;
        rx.await.map_err(|_| PushError::WorkerClosed)?
    }

    /// Deliver a push payload
    pub async fn push(&self, data: Option<Vec<u8>>) -> PushResult<WorkerOutcome> {
        self.dispatch(WorkerEvent::Push { data }).await
    }

    /// Deliver a notification click
    pub async fn click(&self, notification: NotificationRequest) -> PushResult<WorkerOutcome> {
        self.dispatch(WorkerEvent::NotificationClick { notification })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        shown: Arc<Mutex<Vec<NotificationRequest>>>,
        closed: Arc<Mutex<usize>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        async fn show_notification(&self, notification: &NotificationRequest) -> PushResult<()> {
            if self.fail {
                return Err(PushError::Display("no display".to_string()));
            }
            self.shown.lock().unwrap().push(notification.clone());
            Ok(())
        }

        async fn close(&self, _notification: &NotificationRequest) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    #[derive(Clone, Default)]
    struct FakeViews {
        views: Arc<Mutex<Vec<ViewInfo>>>,
        focused: Arc<Mutex<Vec<String>>>,
    }

    impl FakeViews {
        fn with(urls: &[&str]) -> Self {
            let views = urls
                .iter()
                .enumerate()
                .map(|(i, url)| ViewInfo {
                    id: format!("v{i}"),
                    url: (*url).to_string(),
                })
                .collect();
            Self {
                views: Arc::new(Mutex::new(views)),
                ..Self::default()
            }
        }
    }

    impl ViewHost for FakeViews {
        async fn open_views(&self) -> Vec<ViewInfo> {
            self.views.lock().unwrap().clone()
        }

        async fn focus(&self, view_id: &str) -> PushResult<()> {
            self.focused.lock().unwrap().push(view_id.to_string());
            Ok(())
        }

        async fn open(&self, url: &str) -> PushResult<ViewInfo> {
            let mut views = self.views.lock().unwrap();
            let view = ViewInfo {
                id: format!("v{}", views.len()),
                url: url.to_string(),
            };
            views.push(view.clone());
            Ok(view)
        }
    }

    fn click_on(url: &str) -> NotificationRequest {
        let mut n = notification_from_push(None, &NotificationDefaults::default());
        n.options.data.url = url.to_string();
        n
    }

    #[test]
    fn test_garbage_payload_uses_defaults() {
        let n = notification_from_push(Some(b"not json"), &NotificationDefaults::default());
        assert_eq!(n.title, "Dostana Notification");
        assert_eq!(n.options.body, "You have a new message.");
        assert_eq!(n.url(), "/");
        assert_eq!(n.options.icon, "/icons/icon-192x192.png");
    }

    #[test]
    fn test_payload_fields_override_defaults() {
        let raw = br#"{"title":"Riya liked your post","data":{"url":"/post/9"}}"#;
        let n = notification_from_push(Some(raw), &NotificationDefaults::default());
        assert_eq!(n.title, "Riya liked your post");
        assert_eq!(n.options.body, "You have a new message.");
        assert_eq!(n.url(), "/post/9");
    }

    #[test]
    fn test_mistyped_data_keeps_title_and_body() {
        let raw = br#"{"title":"Riya liked your post","body":"tap","data":"oops"}"#;
        let n = notification_from_push(Some(raw), &NotificationDefaults::default());
        assert_eq!(n.title, "Riya liked your post");
        assert_eq!(n.options.body, "tap");
        assert_eq!(n.url(), "/");
    }

    #[test]
    fn test_empty_title_uses_default() {
        let n = notification_from_push(Some(br#"{"title":""}"#), &NotificationDefaults::default());
        assert_eq!(n.title, "Dostana Notification");
    }

    #[test]
    fn test_route_click_matches_relative_target() {
        let views = vec![
            ViewInfo {
                id: "a".to_string(),
                url: "https://dostana.app/feed".to_string(),
            },
            ViewInfo {
                id: "b".to_string(),
                url: "https://dostana.app/chat/42".to_string(),
            },
        ];
        assert_eq!(
            route_click("/chat/42", &views),
            ClickAction::Focus(views[1].clone())
        );
        assert_eq!(
            route_click("https://dostana.app/feed", &views),
            ClickAction::Focus(views[0].clone())
        );
        assert_eq!(
            route_click("/chat/7", &views),
            ClickAction::Open("/chat/7".to_string())
        );
        assert_eq!(
            route_click("/", &[]),
            ClickAction::Open("/".to_string())
        );
    }

    #[test]
    fn test_root_target_matches_bare_origin() {
        assert!(shows_target("https://dostana.app", "/"));
        assert!(shows_target("https://dostana.app/", "/"));
        assert!(!shows_target("https://dostana.app/feed", "/"));
    }

    #[tokio::test]
    async fn test_push_displays_and_waits() {
        let notifier = RecordingNotifier::default();
        let worker = spawn_worker(ServiceWorker::new(
            notifier.clone(),
            FakeViews::default(),
            NotificationDefaults::default(),
        ));

        let outcome = worker.push(Some(b"not json".to_vec())).await.unwrap();
        let WorkerOutcome::Displayed(shown) = outcome else {
            panic!("expected a displayed notification");
        };
        assert_eq!(shown.title, "Dostana Notification");
        // Display completed before the event was acknowledged
        assert_eq!(notifier.shown.lock().unwrap().len(), 1);

        let outcome = worker.push(None).await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Displayed(_)));
    }

    #[tokio::test]
    async fn test_display_failure_reaches_sender() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let worker = spawn_worker(ServiceWorker::new(
            notifier,
            FakeViews::default(),
            NotificationDefaults::default(),
        ));
        let err = worker.push(None).await.unwrap_err();
        assert!(matches!(err, PushError::Display(_)));
    }

    #[tokio::test]
    async fn test_click_focuses_existing_view() {
        let notifier = RecordingNotifier::default();
        let views = FakeViews::with(&["https://dostana.app/feed", "https://dostana.app/chat/42"]);
        let worker = spawn_worker(ServiceWorker::new(
            notifier.clone(),
            views.clone(),
            NotificationDefaults::default(),
        ));

        let outcome = worker.click(click_on("/chat/42")).await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Focused(ref v) if v.id == "v1"));
        assert_eq!(*views.focused.lock().unwrap(), ["v1"]);
        assert_eq!(views.views.lock().unwrap().len(), 2);
        assert_eq!(*notifier.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_click_opens_exactly_one_view() {
        let views = FakeViews::with(&["https://dostana.app/feed"]);
        let worker = spawn_worker(ServiceWorker::new(
            RecordingNotifier::default(),
            views.clone(),
            NotificationDefaults::default(),
        ));

        let outcome = worker.click(click_on("/profile/3")).await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Opened(ref v) if v.url == "/profile/3"));
        assert_eq!(views.views.lock().unwrap().len(), 2);

        // Second click on the same link focuses the view we just opened
        let outcome = worker.click(click_on("/profile/3")).await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Focused(_)));
        assert_eq!(views.views.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_click_without_url_targets_root() {
        let views = FakeViews::with(&["https://dostana.app/"]);
        let worker = spawn_worker(ServiceWorker::new(
            RecordingNotifier::default(),
            views.clone(),
            NotificationDefaults::default(),
        ));
        let outcome = worker.click(click_on("")).await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Focused(_)));
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let worker = spawn_worker(ServiceWorker::new(
            RecordingNotifier::default(),
            FakeViews::default(),
            NotificationDefaults::default(),
        ));
        assert_eq!(
            worker.dispatch(WorkerEvent::Install).await.unwrap(),
            WorkerOutcome::Installed
        );
        assert_eq!(
            worker.dispatch(WorkerEvent::Activate).await.unwrap(),
            WorkerOutcome::Activated
        );
    }
}
