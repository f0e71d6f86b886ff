//! One-time push setup: register worker, ask permission, subscribe

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::config::Config;
use crate::error::{PushError, PushResult};
use crate::models::{PushSubscription, SubscriptionOptions};

use super::{Permission, PushPlatform};

/// Decode a base64url VAPID public key into raw bytes.
///
/// Trailing `=` padding and surrounding whitespace are tolerated.
pub fn decode_vapid_key(key: &str) -> PushResult<Vec<u8>> {
    let trimmed = key.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(PushError::InvalidVapidKey("key is empty".to_string()));
    }

    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| PushError::InvalidVapidKey(e.to_string()))
}

/// Push subscription state for this client
pub struct PushSetup {
    worker_path: String,
    worker_scope: String,
    vapid_public_key: String,
    subscription: Option<PushSubscription>,
}

impl PushSetup {
    /// Create setup state from the configuration
    pub fn new(config: &Config) -> Self {
        Self {
            worker_path: config.worker_path.clone(),
            worker_scope: config.worker_scope.clone(),
            vapid_public_key: config.vapid_public_key.clone(),
            subscription: None,
        }
    }

    /// Restore a previously stored subscription
    pub fn with_subscription(mut self, subscription: Option<PushSubscription>) -> Self {
        self.subscription = subscription;
        self
    }

    /// The active subscription, if setup has succeeded
    pub const fn subscription(&self) -> Option<&PushSubscription> {
        self.subscription.as_ref()
    }

    /// Forget the active subscription, returning it
    pub fn reset(&mut self) -> Option<PushSubscription> {
        self.subscription.take()
    }

    /// Register the worker and subscribe it to the push service.
    ///
    /// Idempotent: once a subscription exists it is returned as is. Errors
    /// are reported, never retried here; a later call starts over.
    pub async fn setup<P: PushPlatform>(&mut self, platform: &P) -> PushResult<PushSubscription> {
        if let Some(existing) = &self.subscription {
            tracing::debug!("Push already set up ({})", existing.endpoint);
            return Ok(existing.clone());
        }

        let result = self.try_setup(platform).await;
        match &result {
            Ok(subscription) => {
                tracing::info!("Subscribed to push service: {}", subscription.endpoint);
                self.subscription = Some(subscription.clone());
            }
            Err(e) => {
                tracing::warn!("Push setup failed: {}", e);
                self.subscription = None;
            }
        }
        result
    }

    async fn try_setup<P: PushPlatform>(&self, platform: &P) -> PushResult<PushSubscription> {
        if !platform.supports_background() {
            return Err(PushError::UnsupportedPlatform);
        }

        let registration = platform
            .register_worker(&self.worker_path, &self.worker_scope)
            .await?;
        tracing::debug!(
            "Worker registered at {} (scope {})",
            registration.path,
            registration.scope
        );

        let permission = match platform.permission() {
            Permission::Granted => Permission::Granted,
            _ => platform.request_permission().await,
        };
        if permission != Permission::Granted {
            return Err(PushError::PermissionDenied);
        }

        let options = SubscriptionOptions {
            user_visible_only: true,
            application_server_key: decode_vapid_key(&self.vapid_public_key)?,
        };

        platform.subscribe(&registration, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionKeys;
    use crate::push::Registration;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // 65-byte uncompressed P-256 point, base64url
    const VAPID_KEY: &str =
        "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U";

    struct FakePlatform {
        background: bool,
        answer: Permission,
        fail_subscribe: bool,
        subscribe_calls: AtomicUsize,
        last_options: Mutex<Option<SubscriptionOptions>>,
    }

    impl FakePlatform {
        fn new(answer: Permission) -> Self {
            Self {
                background: true,
                answer,
                fail_subscribe: false,
                subscribe_calls: AtomicUsize::new(0),
                last_options: Mutex::new(None),
            }
        }
    }

    impl PushPlatform for FakePlatform {
        fn supports_background(&self) -> bool {
            self.background
        }

        async fn register_worker(&self, path: &str, scope: &str) -> PushResult<Registration> {
            Ok(Registration {
                path: path.to_string(),
                scope: scope.to_string(),
            })
        }

        fn permission(&self) -> Permission {
            Permission::Default
        }

        async fn request_permission(&self) -> Permission {
            self.answer
        }

        async fn subscribe(
            &self,
            registration: &Registration,
            options: &SubscriptionOptions,
        ) -> PushResult<PushSubscription> {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_options.lock().unwrap() = Some(options.clone());
            if self.fail_subscribe {
                return Err(PushError::SubscriptionFailed("service down".to_string()));
            }
            Ok(PushSubscription {
                endpoint: format!("https://push.test{}", registration.path),
                expiration_time: None,
                keys: SubscriptionKeys {
                    p256dh: "p".to_string(),
                    auth: "a".to_string(),
                },
            })
        }
    }

    fn setup_with_key() -> PushSetup {
        let config = Config {
            vapid_public_key: VAPID_KEY.to_string(),
            ..Config::default()
        };
        PushSetup::new(&config)
    }

    #[test]
    fn test_decode_vapid_key() {
        let raw = decode_vapid_key(VAPID_KEY).unwrap();
        assert_eq!(raw.len(), 65);
        assert_eq!(raw[0], 0x04);

        let padded = decode_vapid_key("AQID==").unwrap();
        assert_eq!(padded, vec![1, 2, 3]);

        assert!(matches!(
            decode_vapid_key("not base64!"),
            Err(PushError::InvalidVapidKey(_))
        ));
        assert!(matches!(
            decode_vapid_key("  "),
            Err(PushError::InvalidVapidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_setup_subscribes_with_decoded_key() {
        let platform = FakePlatform::new(Permission::Granted);
        let mut setup = setup_with_key();

        let sub = setup.setup(&platform).await.unwrap();
        assert_eq!(sub.endpoint, "https://push.test/sw.js");
        assert_eq!(setup.subscription(), Some(&sub));

        let options = platform.last_options.lock().unwrap().clone().unwrap();
        assert!(options.user_visible_only);
        assert_eq!(options.application_server_key.len(), 65);
    }

    #[tokio::test]
    async fn test_setup_is_idempotent() {
        let platform = FakePlatform::new(Permission::Granted);
        let mut setup = setup_with_key();

        let first = setup.setup(&platform).await.unwrap();
        let second = setup.setup(&platform).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(platform.subscribe_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_forces_fresh_subscription() {
        let platform = FakePlatform::new(Permission::Granted);
        let mut setup = setup_with_key();

        let first = setup.setup(&platform).await.unwrap();
        assert_eq!(setup.reset(), Some(first));
        assert!(setup.subscription().is_none());
        assert_eq!(setup.reset(), None);

        setup.setup(&platform).await.unwrap();
        assert_eq!(platform.subscribe_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let mut platform = FakePlatform::new(Permission::Granted);
        platform.background = false;
        let mut setup = setup_with_key();

        let err = setup.setup(&platform).await.unwrap_err();
        assert!(matches!(err, PushError::UnsupportedPlatform));
        assert!(setup.subscription().is_none());
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let platform = FakePlatform::new(Permission::Denied);
        let mut setup = setup_with_key();

        let err = setup.setup(&platform).await.unwrap_err();
        assert!(matches!(err, PushError::PermissionDenied));
        assert_eq!(platform.subscribe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscription_failure_leaves_state_empty() {
        let mut platform = FakePlatform::new(Permission::Granted);
        platform.fail_subscribe = true;
        let mut setup = setup_with_key();

        let err = setup.setup(&platform).await.unwrap_err();
        assert!(matches!(err, PushError::SubscriptionFailed(_)));
        assert!(setup.subscription().is_none());

        // A fresh call tries again
        let _ = setup.setup(&platform).await;
        assert_eq!(platform.subscribe_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let platform = FakePlatform::new(Permission::Granted);
        let mut setup = PushSetup::new(&Config::default());

        let err = setup.setup(&platform).await.unwrap_err();
        assert!(matches!(err, PushError::InvalidVapidKey(_)));
    }
}
