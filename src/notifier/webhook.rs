//! Webhook delivery.
//!
//! Delivery is single-attempt: no retry, no backoff. Failures are logged and
//! reported as `false`; the caller decides what that means for the entry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::config::WebhookConfig;
use crate::error::{RelayError, Result};
use crate::feed::Entry;
use crate::notifier::card::build_card;

/// Sink for entry notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one entry. Returns `true` on success.
    async fn notify(&self, entry: &Entry) -> bool;
}

/// Response body of the chat webhook.
///
/// Depending on the endpoint version the status lives in `code` or
/// `StatusCode`; either being `0` means success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "StatusCode")]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default, rename = "StatusMessage")]
    pub status_message: Option<String>,
}

impl WebhookResponse {
    /// Whether the endpoint accepted the message.
    pub fn is_success(&self) -> bool {
        self.code == Some(0) || self.status_code == Some(0)
    }

    fn describe(&self) -> String {
        let code = self.code.or(self.status_code);
        let msg = self.msg.as_deref().or(self.status_message.as_deref());
        match (code, msg) {
            (Some(code), Some(msg)) => format!("code {}: {}", code, msg),
            (Some(code), None) => format!("code {}", code),
            (None, Some(msg)) => msg.to_string(),
            (None, None) => "response carried no status code".to_string(),
        }
    }
}

/// Posts card messages to a chat webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier for the configured webhook.
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Post a payload once and check the application-level status.
    pub async fn deliver(&self, payload: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayError::Delivery(format!("failed to reach webhook: {}", e)))?;

        let status = response.status();
        let body: WebhookResponse = response.json().await.map_err(|e| {
            RelayError::Delivery(format!("unexpected webhook response (HTTP {}): {}", status, e))
        })?;

        if body.is_success() {
            Ok(())
        } else {
            Err(RelayError::Delivery(body.describe()))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, entry: &Entry) -> bool {
        match self.deliver(&build_card(entry)).await {
            Ok(()) => {
                info!(guid = %entry.guid, title = %entry.title, "Notification sent");
                true
            }
            Err(e) => {
                error!(guid = %entry.guid, error = %e, "Notification failed");
                false
            }
        }
    }
}
