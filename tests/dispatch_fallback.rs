// tests/dispatch_fallback.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use offer_relay::notify::{AlertNotifier, Messenger, NotificationDispatcher};
use offer_relay::{DeliveryOutcome, FetchAttemptRecord, Offer, RelayError, SourceTier};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Photo { chat: String, photo: String, caption: String },
    Text { chat: String, text: String },
}

type Reply = fn() -> Result<Value, RelayError>;

/// Scripted Telegram stand-in.
struct MockMessenger {
    photo_reply: Reply,
    text_reply: Reply,
    calls: Mutex<Vec<Call>>,
}

impl MockMessenger {
    fn new(photo_reply: Reply, text_reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            photo_reply,
            text_reply,
            calls: Mutex::new(vec![]),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_photo(
        &self,
        chat_id: &str,
        photo_url: &str,
        caption: &str,
    ) -> Result<Value, RelayError> {
        self.calls.lock().unwrap().push(Call::Photo {
            chat: chat_id.into(),
            photo: photo_url.into(),
            caption: caption.into(),
        });
        (self.photo_reply)()
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Value, RelayError> {
        self.calls.lock().unwrap().push(Call::Text {
            chat: chat_id.into(),
            text: text.into(),
        });
        (self.text_reply)()
    }
}

fn ok() -> Result<Value, RelayError> {
    Ok(json!({"ok": true, "result": {"message_id": 1}}))
}
fn rejected() -> Result<Value, RelayError> {
    Ok(json!({"ok": false, "error_code": 400, "description": "Bad Request: failed to get HTTP URL content"}))
}
fn transport_err() -> Result<Value, RelayError> {
    Err(RelayError::TransportFailure("connection reset".into()))
}
fn garbage() -> Result<Value, RelayError> {
    Ok(json!("<html>"))
}

fn offer() -> Offer {
    Offer {
        id: "pub-55-9".into(),
        title: "Fone JBL Tune".into(),
        price_display: "R$ 89.90".into(),
        url: "https://shopee.com.br/product/55/9".into(),
        image_url: "https://down-br.img.susercontent.com/file/abc".into(),
    }
}

fn dispatcher(m: Arc<MockMessenger>) -> NotificationDispatcher {
    NotificationDispatcher::new(m).with_spacing(Duration::ZERO)
}

#[tokio::test]
async fn photo_success_is_delivered_without_text() {
    let m = MockMessenger::new(ok, ok);
    let out = dispatcher(m.clone()).deliver("-100", &offer()).await;
    assert_eq!(out, DeliveryOutcome::Delivered);

    let calls = m.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::Photo { chat, photo, caption } => {
            assert_eq!(chat, "-100");
            assert_eq!(photo, &offer().image_url);
            assert!(caption.contains("<b>Fone JBL Tune</b>"));
            assert!(caption.contains("R$ 89.90"));
            assert!(caption.contains("https://shopee.com.br/product/55/9"));
        }
        other => panic!("expected photo, got {other:?}"),
    }
}

#[tokio::test]
async fn every_kind_of_photo_failure_triggers_exactly_one_text_fallback() {
    for photo_reply in [rejected as Reply, transport_err, garbage] {
        let m = MockMessenger::new(photo_reply, ok);
        let out = dispatcher(m.clone()).deliver("-100", &offer()).await;
        assert_eq!(out, DeliveryOutcome::DeliveredAsFallback);

        let texts: Vec<String> = m
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 1);
        let body = &texts[0];
        assert!(body.contains("Fone JBL Tune"));
        assert!(body.contains("R$ 89.90"));
        assert!(body.contains("https://shopee.com.br/product/55/9"));
        assert!(body.contains("imagem indisponível"));
    }
}

#[tokio::test]
async fn empty_image_goes_straight_to_text() {
    let m = MockMessenger::new(ok, ok);
    let mut o = offer();
    o.image_url.clear();
    let out = dispatcher(m.clone()).deliver("-100", &o).await;
    assert_eq!(out, DeliveryOutcome::DeliveredAsFallback);
    assert!(matches!(m.calls().as_slice(), [Call::Text { .. }]));
}

#[tokio::test]
async fn both_paths_failing_is_a_failed_delivery() {
    let m = MockMessenger::new(transport_err, rejected);
    let out = dispatcher(m.clone()).deliver("-100", &offer()).await;
    assert_eq!(out, DeliveryOutcome::Failed);
    assert_eq!(m.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn successive_deliveries_are_spaced() {
    let m = MockMessenger::new(ok, ok);
    let d = NotificationDispatcher::new(m.clone()).with_spacing(Duration::from_millis(1500));
    let t0 = tokio::time::Instant::now();
    d.deliver("-100", &offer()).await;
    d.deliver("-100", &offer()).await;
    d.deliver("-100", &offer()).await;
    assert!(t0.elapsed() >= Duration::from_millis(3000));
}

fn zero(kw: &str, err: Option<&str>) -> FetchAttemptRecord {
    FetchAttemptRecord::new(
        kw,
        "relevance",
        SourceTier::Primary,
        0,
        err.map(String::from),
        r#"{"data":null}"#,
    )
}

#[tokio::test]
async fn alert_goes_to_alert_destination_only_when_everything_is_empty() {
    let m = MockMessenger::new(ok, ok);
    let d = dispatcher(m.clone());
    let notifier = AlertNotifier::new(&d);

    let productive = FetchAttemptRecord::new("casa", "public", SourceTier::Public, 2, None, "{}");
    assert!(!notifier.maybe_alert(&[zero("casa", Some("boom")), productive], "-999").await);
    assert!(m.calls().is_empty());

    assert!(notifier.maybe_alert(&[zero("casa", Some("boom")), zero("moda", None)], "-999").await);
    match m.calls().as_slice() {
        [Call::Text { chat, text }] => {
            assert_eq!(chat, "-999");
            assert!(text.contains("casa"));
            assert!(text.contains("moda"));
            assert!(text.contains("boom"));
        }
        other => panic!("expected one alert text, got {other:?}"),
    }
}

#[tokio::test]
async fn alert_send_failure_is_swallowed() {
    let m = MockMessenger::new(ok, transport_err);
    let d = dispatcher(m.clone());
    let sent = AlertNotifier::new(&d).maybe_alert(&[zero("casa", None)], "-999").await;
    assert!(!sent);
    assert_eq!(m.calls().len(), 1);
}
