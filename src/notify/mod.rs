// src/notify/mod.rs
pub mod alert;
pub mod format;
pub mod telegram;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{RelayError, Result};
use crate::types::{DeliveryOutcome, Offer};

pub use alert::AlertNotifier;
pub use telegram::TelegramMessenger;

/// Raw messaging API. Implementations return the decoded API reply; deciding
/// whether it counts as an acknowledgment is the dispatcher's job.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<Value>;
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Value>;
}

/// `{"ok": true, ...}` is the only acknowledgment we accept.
pub fn acknowledged(reply: &Value) -> Result<()> {
    if reply.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let why = reply
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "unexpected reply: {}",
                crate::types::preview(&reply.to_string(), 200)
            )
        });
    Err(RelayError::DeliveryFailure(why))
}

/// Photo-first delivery with a text fallback, spaced out to respect chat rate limits.
pub struct NotificationDispatcher {
    messenger: Arc<dyn Messenger>,
    spacing: Duration,
    last_send: Mutex<Option<Instant>>,
}

impl NotificationDispatcher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self {
            messenger,
            spacing: Duration::from_millis(1500),
            last_send: Mutex::new(None),
        }
    }

    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    pub async fn deliver(&self, destination: &str, offer: &Offer) -> DeliveryOutcome {
        self.pace().await;

        if offer.image_url.trim().is_empty() {
            tracing::debug!(offer_id = %offer.id, "no image, sending text");
        } else {
            let caption = format::format_caption(offer);
            let photo = self
                .messenger
                .send_photo(destination, &offer.image_url, &caption)
                .await
                .and_then(|reply| acknowledged(&reply));
            match photo {
                Ok(()) => {
                    counter!("relay_deliveries_total", "kind" => "photo").increment(1);
                    tracing::info!(offer_id = %offer.id, title = %offer.title, "offer delivered");
                    return DeliveryOutcome::Delivered;
                }
                Err(e) => {
                    tracing::warn!(
                        offer_id = %offer.id,
                        error = %e,
                        "photo send failed, falling back to text"
                    );
                }
            }
        }

        let text = format::format_fallback_text(offer);
        match self
            .messenger
            .send_message(destination, &text)
            .await
            .and_then(|reply| acknowledged(&reply))
        {
            Ok(()) => {
                counter!("relay_deliveries_total", "kind" => "text").increment(1);
                counter!("relay_delivery_fallbacks_total").increment(1);
                tracing::info!(
                    offer_id = %offer.id,
                    title = %offer.title,
                    "offer delivered as text"
                );
                DeliveryOutcome::DeliveredAsFallback
            }
            Err(e) => {
                counter!("relay_delivery_failures_total").increment(1);
                tracing::error!(offer_id = %offer.id, error = %e, "offer delivery failed");
                DeliveryOutcome::Failed
            }
        }
    }

    /// Plain text path (alerts, probes).
    pub async fn send_text(&self, destination: &str, text: &str) -> Result<()> {
        self.pace().await;
        let reply = self.messenger.send_message(destination, text).await?;
        acknowledged(&reply)
    }

    async fn pace(&self) {
        let wait = {
            let last = self.last_send.lock().unwrap_or_else(|p| p.into_inner());
            (*last).map(|t| (t + self.spacing).saturating_duration_since(Instant::now()))
        };
        if let Some(w) = wait.filter(|w| !w.is_zero()) {
            tokio::time::sleep(w).await;
        }
        *self.last_send.lock().unwrap_or_else(|p| p.into_inner()) = Some(Instant::now());
    }
}
