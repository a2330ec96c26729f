// src/notify/telegram.rs
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::Messenger;
use crate::error::{RelayError, Result};
use crate::transport::HttpTransport;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API over the shared transport (`sendPhoto` / `sendMessage`, HTML parse mode).
pub struct TelegramMessenger {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    token: String,
}

impl TelegramMessenger {
    pub fn new(transport: Arc<dyn HttpTransport>, token: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
        }
    }

    /// Point at a different Bot API server (local bot API, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call(&self, method: &str, form: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .transport
            .post_form(&self.method_url(method), form)
            .await
            // reqwest errors embed the URL, which contains the bot token
            .map_err(|e| match e {
                RelayError::TransportFailure(msg) => {
                    RelayError::TransportFailure(redact(&msg, &self.token))
                }
                other => other,
            })?;
        serde_json::from_str(&resp.body).map_err(|e| {
            RelayError::MalformedResponse(format!(
                "{method}: status {} invalid json: {e}",
                resp.status
            ))
        })
    }
}

impl fmt::Debug for TelegramMessenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramMessenger")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<Value> {
        let form = [
            ("chat_id", chat_id.to_string()),
            ("photo", photo_url.to_string()),
            ("caption", caption.to_string()),
            ("parse_mode", "HTML".to_string()),
        ];
        self.call("sendPhoto", &form).await
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Value> {
        let form = [
            ("chat_id", chat_id.to_string()),
            ("text", text.to_string()),
            ("parse_mode", "HTML".to_string()),
            ("disable_web_page_preview", "true".to_string()),
        ];
        self.call("sendMessage", &form).await
    }
}

fn redact(s: &str, secret: &str) -> String {
    if secret.is_empty() {
        s.to_string()
    } else {
        s.replace(secret, "<token>")
    }
}
