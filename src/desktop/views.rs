//! Browser-backed view host

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{PushError, PushResult};
use crate::push::{ViewHost, ViewInfo};

/// Views opened in the system browser during this session
pub struct BrowserViews {
    base_url: String,
    launch_browser: bool,
    views: Mutex<Vec<ViewInfo>>,
    next_id: AtomicU64,
}

impl BrowserViews {
    /// Create a view host for the app served at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            launch_browser: true,
            views: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Track views without starting a browser
    pub fn headless(mut self) -> Self {
        self.launch_browser = false;
        self
    }

    /// Views already open before the first event
    pub fn with_views<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            let view = self.new_view(url.as_ref());
            self.lock_views().push(view);
        }
        self
    }

    /// Resolve an app-relative link against the base URL
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url.to_string()
        }
    }

    fn new_view(&self, url: &str) -> ViewInfo {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        ViewInfo {
            id: format!("view-{id}"),
            url: self.resolve(url),
        }
    }

    fn lock_views(&self) -> std::sync::MutexGuard<'_, Vec<ViewInfo>> {
        self.views
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ViewHost for BrowserViews {
    async fn open_views(&self) -> Vec<ViewInfo> {
        self.lock_views().clone()
    }

    async fn focus(&self, view_id: &str) -> PushResult<()> {
        let known = self.lock_views().iter().any(|v| v.id == view_id);
        if !known {
            return Err(PushError::View(format!("no open view {view_id}")));
        }
        println!("↗ Focusing {view_id}");
        Ok(())
    }

    async fn open(&self, url: &str) -> PushResult<ViewInfo> {
        let view = self.new_view(url);

        if self.launch_browser {
            open::that_detached(&view.url)
                .map_err(|e| PushError::View(format!("failed to open {}: {e}", view.url)))?;
        }
        println!("↗ Opened {}", view.url);

        self.lock_views().push(view.clone());
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{ClickAction, route_click};

    #[tokio::test]
    async fn test_seeded_views_are_resolved() {
        let views = BrowserViews::new("https://dostana.app/")
            .headless()
            .with_views(["/feed", "https://dostana.app/chat/1"]);
        let open = views.open_views().await;
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].url, "https://dostana.app/feed");
        assert_ne!(open[0].id, open[1].id);
    }

    #[tokio::test]
    async fn test_open_then_route_focuses() {
        let views = BrowserViews::new("https://dostana.app").headless();
        let opened = views.open("/chat/9").await.unwrap();
        assert_eq!(opened.url, "https://dostana.app/chat/9");

        let open = views.open_views().await;
        assert_eq!(route_click("/chat/9", &open), ClickAction::Focus(opened.clone()));
        assert!(views.focus(&opened.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_focus_unknown_view_fails() {
        let views = BrowserViews::new("https://dostana.app").headless();
        assert!(matches!(
            views.focus("view-99").await,
            Err(PushError::View(_))
        ));
    }
}
