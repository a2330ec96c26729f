// src/telemetry.rs
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "offer_relay=info,warn";

/// One-time metric descriptions, so series carry help text once a recorder exists.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "relay_fetch_attempts_total",
            "Fetch attempts per source tier (keyword x variant)."
        );
        describe_counter!(
            "relay_offers_fetched_total",
            "Offers returned by all sources before filtering."
        );
        describe_counter!(
            "relay_offers_skipped_total",
            "Offers dropped before dispatch (no id, already sent, duplicate)."
        );
        describe_counter!("relay_deliveries_total", "Offers delivered, by kind.");
        describe_counter!(
            "relay_delivery_fallbacks_total",
            "Deliveries that fell back from photo to text."
        );
        describe_counter!(
            "relay_delivery_failures_total",
            "Offers that could not be delivered at all."
        );
        describe_counter!("relay_alerts_total", "Operational alerts sent.");
        describe_counter!(
            "relay_signed_retries_total",
            "Signed requests re-sent with a shifted timestamp."
        );
        describe_gauge!("relay_last_run_ts", "Unix ts when the last run finished.");
    });
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
