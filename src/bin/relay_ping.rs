//! Sends a single test message to the configured chat to verify bot wiring.

use std::sync::Arc;

use anyhow::Context;
use offer_relay::notify::{NotificationDispatcher, TelegramMessenger};
use offer_relay::transport::ReqwestTransport;
use offer_relay::{telemetry, RelayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = RelayConfig::from_env().context("loading configuration")?;
    let transport = Arc::new(ReqwestTransport::new()?);
    let dispatcher = NotificationDispatcher::new(Arc::new(TelegramMessenger::new(
        transport,
        &config.bot_token,
    )));

    let text = format!(
        "Teste automático ✅ ({} palavras-chave: {})",
        config.keywords.len(),
        config.keywords.join(", ")
    );
    dispatcher
        .send_text(&config.chat_id, &html_escape::encode_text(&text))
        .await
        .context("sending test message")?;

    println!("relay-ping done");
    Ok(())
}
