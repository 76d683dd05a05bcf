//! Webhook notifier with retry and signature.
//!
//! Posts `{chat_id, text, spoilers}` JSON to a chat gateway:
//! - HMAC-SHA256 payload signing when a secret is configured
//! - exponential backoff on network errors and 5xx responses
//! - 4xx responses are rejected without retrying

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NotifierConfig;
use crate::error::{ErrorCode, LexicardError, LexicardResult};
use crate::traits::{Markup, Notifier};
use crate::types::ChatId;

/// Header carrying the `sha256=<hex>` payload signature.
pub const SIGNATURE_HEADER: &str = "X-Lexicard-Signature";

#[derive(Debug, Serialize)]
struct Payload<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "no_spoilers")]
    spoilers: &'a [String],
}

fn no_spoilers(spoilers: &&[String]) -> bool {
    spoilers.is_empty()
}

/// Delivers messages to an HTTP endpoint.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    config: NotifierConfig,
}

impl WebhookNotifier {
    /// Build a notifier for `config.webhook_url`.
    pub fn new(config: NotifierConfig) -> LexicardResult<Self> {
        let url = config
            .webhook_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| LexicardError::Configuration("webhook_url is not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| LexicardError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, url, config })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_once(&self, body: &str, signature: Option<&str>) -> LexicardResult<()> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body.to_string());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LexicardError::notification(format!("Network error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() {
            Err(LexicardError::notification(format!("Server error: {}", status)))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(LexicardError::notification_rejected(format!(
                "Client error {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, chat_id: ChatId, text: &str, markup: Option<&Markup>) -> LexicardResult<()> {
        let payload = Payload {
            chat_id,
            text,
            spoilers: markup.map(|m| m.spoilers.as_slice()).unwrap_or_default(),
        };
        let body = serde_json::to_string(&payload)?;
        let signature = self
            .config
            .secret
            .as_deref()
            .map(|secret| sign_payload(&body, secret));

        let policy = &self.config.retry_policy;
        (|| self.post_once(&body, signature.as_deref()))
            .retry(
                ExponentialBuilder::default()
                    .with_max_times(policy.max_retries as usize)
                    .with_min_delay(Duration::from_millis(policy.initial_delay_ms))
                    .with_max_delay(Duration::from_millis(policy.max_delay_ms))
                    .with_factor(policy.multiplier),
            )
            .when(|e| e.code() == ErrorCode::NtfDeliveryFailed)
            .notify(|err, dur| {
                warn!(chat_id, url = %self.url, error = %err, "Delivery failed, retrying in {:?}", dur);
            })
            .await?;

        debug!(chat_id, "Message delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// `sha256=<hex>` HMAC of `payload`.
pub fn sign_payload(payload: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Check a signature produced by [`sign_payload`].
///
/// For gateways receiving lexicard webhooks.
pub fn verify_signature(payload: &str, secret: &str, signature: &str) -> bool {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());
    let Some(hex_part) = signature.strip_prefix("sha256=") else {
        return false;
    };
    match hex::decode(hex_part) {
        Ok(bytes) => mac.verify_slice(&bytes).is_ok(),
        Err(_) => false,
    }
}
