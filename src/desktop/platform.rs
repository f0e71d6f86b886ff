//! Push platform backed by an HTTP push service

use std::io::{BufRead, IsTerminal, Write};
use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use serde::Serialize;

use crate::error::{PushError, PushResult};
use crate::models::{PushSubscription, SubscriptionOptions};
use crate::push::{Permission, PushPlatform, Registration};

/// Body of the subscription request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeRequest<'a> {
    user_visible_only: bool,
    application_server_key: String,
    scope: &'a str,
}

/// Subscribes through the push service's HTTP API and asks for permission
/// on the terminal
pub struct HttpPushPlatform {
    client: Client,
    service_url: String,
    permission: Mutex<Permission>,
}

impl HttpPushPlatform {
    /// Create a platform for the push service at `service_url`
    pub fn new(service_url: &str) -> Self {
        Self {
            client: Client::new(),
            service_url: service_url.trim_end_matches('/').to_string(),
            permission: Mutex::new(Permission::Default),
        }
    }

    /// Start with a known permission (e.g. from `--yes`)
    pub fn with_permission(self, permission: Permission) -> Self {
        self.set_permission(permission);
        self
    }

    fn set_permission(&self, permission: Permission) {
        *self
            .permission
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = permission;
    }

    fn subscribe_body<'a>(
        registration: &'a Registration,
        options: &SubscriptionOptions,
    ) -> SubscribeRequest<'a> {
        SubscribeRequest {
            user_visible_only: options.user_visible_only,
            application_server_key: URL_SAFE_NO_PAD.encode(&options.application_server_key),
            scope: &registration.scope,
        }
    }
}

fn prompt_permission() -> Permission {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Permission::Denied;
    }

    print!("🔔 Allow Dostana to show notifications? [y/N] ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return Permission::Denied;
    }

    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Permission::Granted,
        _ => Permission::Denied,
    }
}

impl PushPlatform for HttpPushPlatform {
    fn supports_background(&self) -> bool {
        true
    }

    async fn register_worker(&self, path: &str, scope: &str) -> PushResult<Registration> {
        if !path.starts_with('/') {
            return Err(PushError::Registration(format!(
                "worker path must be absolute: {path}"
            )));
        }
        Ok(Registration {
            path: path.to_string(),
            scope: scope.to_string(),
        })
    }

    fn permission(&self) -> Permission {
        *self
            .permission
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn request_permission(&self) -> Permission {
        let current = self.permission();
        if current != Permission::Default {
            return current;
        }

        let answer = tokio::task::spawn_blocking(prompt_permission)
            .await
            .unwrap_or(Permission::Denied);
        self.set_permission(answer);
        answer
    }

    async fn subscribe(
        &self,
        registration: &Registration,
        options: &SubscriptionOptions,
    ) -> PushResult<PushSubscription> {
        let url = format!("{}/subscriptions", self.service_url);
        let body = Self::subscribe_body(registration, options);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::SubscriptionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PushError::SubscriptionFailed(format!(
                "push service error {status}: {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PushError::SubscriptionFailed(format!("bad subscription response: {e}")))
    }
}
