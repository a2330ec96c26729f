// src/notify/alert.rs
use html_escape::encode_text;
use metrics::counter;

use super::format::MESSAGE_MAX_CHARS;
use super::NotificationDispatcher;
use crate::types::{preview, FetchAttemptRecord};

const RAW_PREVIEW_IN_ALERT: usize = 300;
const ERROR_DETAIL_IN_ALERT: usize = 120;
const KEYWORD_IN_ALERT: usize = 80;

/// Operational alert for runs where no source produced anything.
///
/// Records from the public fallback tier count the same as primary ones: a
/// run that found offers only through public search is not alert-worthy.
pub struct AlertNotifier<'a> {
    dispatcher: &'a NotificationDispatcher,
}

impl<'a> AlertNotifier<'a> {
    pub fn new(dispatcher: &'a NotificationDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Returns true when an alert was sent. Send failures are logged only.
    pub async fn maybe_alert(&self, records: &[FetchAttemptRecord], destination: &str) -> bool {
        if !should_alert(records) {
            return false;
        }
        let text = compose_alert(records);
        match self.dispatcher.send_text(destination, &text).await {
            Ok(()) => {
                counter!("relay_alerts_total").increment(1);
                tracing::warn!(attempts = records.len(), "all sources empty, alert sent");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "alert delivery failed");
                false
            }
        }
    }
}

/// No attempts at all (empty keyword list) is not a source failure.
pub fn should_alert(records: &[FetchAttemptRecord]) -> bool {
    !records.is_empty() && !records.iter().any(FetchAttemptRecord::is_productive)
}

pub fn compose_alert(records: &[FetchAttemptRecord]) -> String {
    let header = format!(
        "⚠️ <b>Nenhuma oferta encontrada</b> ({} tentativas)",
        records.len()
    );
    let lines: Vec<String> = records.iter().map(record_line).collect();
    let raw = records
        .iter()
        .rev()
        .find(|r| !r.raw_preview.trim().is_empty())
        .map(|last| {
            format!(
                "Última resposta ({} / {}):\n<pre>{}</pre>",
                encode_text(&last.keyword),
                encode_text(&last.variant),
                encode_text(&preview(&last.raw_preview, RAW_PREVIEW_IN_ALERT))
            )
        });

    let mut full = vec![header.clone()];
    full.extend(lines.iter().cloned());
    full.extend(raw);
    let text = full.join("\n");
    if text.chars().count() <= MESSAGE_MAX_CHARS {
        return text;
    }

    // Too many attempts: drop the <pre> block and keep whole record lines only,
    // so no tag or entity is ever cut in half.
    let mut out = header;
    let mut used = out.chars().count();
    for (i, line) in lines.iter().enumerate() {
        let omitted = omitted_line(lines.len() - i - 1);
        let line_len = line.chars().count() + 1;
        if used + line_len + omitted.chars().count() + 1 > MESSAGE_MAX_CHARS {
            out.push('\n');
            out.push_str(&omitted_line(lines.len() - i));
            return out;
        }
        out.push('\n');
        out.push_str(line);
        used += line_len;
    }
    out
}

fn record_line(r: &FetchAttemptRecord) -> String {
    let mut line = format!(
        "• {} [{}/{}]: {} nodes",
        encode_text(&preview(&r.keyword, KEYWORD_IN_ALERT)),
        r.tier.as_str(),
        encode_text(&r.variant),
        r.node_count
    );
    if let Some(err) = &r.error {
        line.push_str(&format!(" ❌ {}", encode_text(&preview(err, ERROR_DETAIL_IN_ALERT))));
    }
    line
}

fn omitted_line(n: usize) -> String {
    format!("… +{n} tentativas omitidas")
}
