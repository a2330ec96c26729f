// src/run.rs
//! One end-to-end run: load ledger → fetch → filter → dispatch → persist.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::{counter, gauge};

use crate::artifact::RunArtifact;
use crate::config::RelayConfig;
use crate::error::Result;
use crate::ledger::DedupLedger;
use crate::notify::{AlertNotifier, NotificationDispatcher, TelegramMessenger};
use crate::orchestrator::{FetchOrchestrator, VariantPolicy};
use crate::signing::{Credentials, SignedRequestBuilder};
use crate::sources::{PrimaryAffiliateSource, PublicSearchSource};
use crate::telemetry::ensure_metrics_described;
use crate::transport::{HttpTransport, ReqwestTransport, SystemClock};
use crate::types::{DeliveryOutcome, Offer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loaded,
    Fetched,
    Filtered,
    Dispatching,
    Persisted,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub without_id: usize,
    pub already_sent: usize,
    pub duplicates: usize,
}

impl FilterStats {
    pub fn total(&self) -> usize {
        self.without_id + self.already_sent + self.duplicates
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub fetched: usize,
    pub filtered: FilterStats,
    pub delivered: usize,
    pub delivered_as_fallback: usize,
    pub failed: usize,
    pub alert_sent: bool,
    pub ledger_persisted: bool,
    pub artifact_written: bool,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            fetched: 0,
            filtered: FilterStats::default(),
            delivered: 0,
            delivered_as_fallback: 0,
            failed: 0,
            alert_sent: false,
            ledger_persisted: false,
            artifact_written: false,
        }
    }
}

/// Admission gate: drop id-less offers, known ids, and repeats within the batch.
pub fn admit(offers: Vec<Offer>, ledger: &DedupLedger) -> (Vec<Offer>, FilterStats) {
    let mut stats = FilterStats::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(offers.len());

    for offer in offers {
        if offer.id.trim().is_empty() {
            stats.without_id += 1;
        } else if ledger.contains(&offer.id) {
            stats.already_sent += 1;
        } else if !seen.insert(offer.id.clone()) {
            stats.duplicates += 1;
        } else {
            keep.push(offer);
        }
    }
    (keep, stats)
}

pub struct RunCoordinator<'a> {
    config: &'a RelayConfig,
    orchestrator: FetchOrchestrator,
    dispatcher: NotificationDispatcher,
    policy: VariantPolicy,
    state: RunState,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(
        config: &'a RelayConfig,
        orchestrator: FetchOrchestrator,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let policy = VariantPolicy {
            max_keywords: config.max_keywords,
            ..VariantPolicy::default()
        };
        Self {
            config,
            orchestrator,
            dispatcher,
            policy,
            state: RunState::Idle,
        }
    }

    /// Production wiring: reqwest transport, signed affiliate source,
    /// public search fallback, Telegram messenger.
    pub fn from_config(config: &'a RelayConfig) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);

        let primary = PrimaryAffiliateSource::new(
            SignedRequestBuilder::new(transport.clone()),
            Credentials::new(&config.app_id, &config.app_secret),
            &config.affiliate_endpoint,
            Arc::new(SystemClock),
        )
        .with_page_limit(config.page_limit)
        .with_match_id(config.match_id);
        let fallback = PublicSearchSource::new(transport.clone(), &config.public_search_endpoint)
            .with_limit(config.page_limit);
        let orchestrator = FetchOrchestrator::new(Box::new(primary), Box::new(fallback))
            .with_spacing(config.fetch_spacing);

        let messenger = Arc::new(TelegramMessenger::new(transport, &config.bot_token));
        let dispatcher =
            NotificationDispatcher::new(messenger).with_spacing(config.delivery_spacing);

        Ok(Self::new(config, orchestrator, dispatcher))
    }

    pub fn with_policy(mut self, policy: VariantPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    pub async fn run(&mut self) -> RunReport {
        ensure_metrics_described();
        let mut report = RunReport::default();

        let mut ledger = DedupLedger::load(&self.config.ledger_path);
        self.advance(RunState::Loaded);

        let collected = self
            .orchestrator
            .collect(&self.config.keywords, &self.policy)
            .await;
        report.fetched = collected.offers.len();
        report.alert_sent = AlertNotifier::new(&self.dispatcher)
            .maybe_alert(&collected.records, self.config.alert_destination())
            .await;
        self.advance(RunState::Fetched);

        let (pending, stats) = admit(collected.offers, &ledger);
        counter!("relay_offers_skipped_total").increment(stats.total() as u64);
        tracing::info!(
            fetched = report.fetched,
            pending = pending.len(),
            already_sent = stats.already_sent,
            without_id = stats.without_id,
            duplicates = stats.duplicates,
            "offers filtered"
        );
        report.filtered = stats;
        self.advance(RunState::Filtered);

        self.advance(RunState::Dispatching);
        let mut artifact = RunArtifact::new();
        for offer in pending {
            match self.dispatcher.deliver(&self.config.chat_id, &offer).await {
                DeliveryOutcome::Delivered => report.delivered += 1,
                DeliveryOutcome::DeliveredAsFallback => report.delivered_as_fallback += 1,
                DeliveryOutcome::Failed => {
                    report.failed += 1;
                    continue;
                }
            }
            artifact.push(offer);
        }

        let new_ids: Vec<String> = artifact.ids().map(str::to_string).collect();
        match ledger.commit(new_ids) {
            Ok(()) => report.ledger_persisted = true,
            Err(e) => tracing::warn!(
                path = %ledger.path().display(),
                error = %e,
                "ledger not persisted, offers may be re-sent next run"
            ),
        }
        match artifact.write(&self.config.artifact_path) {
            Ok(_) => report.artifact_written = true,
            Err(e) => tracing::warn!(
                path = %self.config.artifact_path.display(),
                error = %e,
                "run artifact not written"
            ),
        }
        self.advance(RunState::Persisted);

        gauge!("relay_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        self.advance(RunState::Done);
        report.state = self.state;

        tracing::info!(
            delivered = report.delivered,
            as_text = report.delivered_as_fallback,
            failed = report.failed,
            alert = report.alert_sent,
            ledger_size = ledger.len(),
            "run finished"
        );
        report
    }
}
