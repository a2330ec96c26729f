// src/orchestrator.rs
use std::time::Duration;

use metrics::counter;

use crate::sources::OfferSource;
use crate::types::{FetchAttemptRecord, ListVariant, Offer};

pub const DEFAULT_MAX_KEYWORDS: usize = 5;

/// Which facets to sweep and how far.
#[derive(Debug, Clone)]
pub struct VariantPolicy {
    pub variants: Vec<ListVariant>,
    pub max_keywords: usize,
    pub fallback_enabled: bool,
}

impl Default for VariantPolicy {
    fn default() -> Self {
        Self {
            variants: ListVariant::affiliate_defaults(),
            max_keywords: DEFAULT_MAX_KEYWORDS,
            fallback_enabled: true,
        }
    }
}

/// Output of one collection pass.
#[derive(Debug, Default)]
pub struct Collected {
    pub offers: Vec<Offer>,
    pub records: Vec<FetchAttemptRecord>,
}

/// Keyword × variant sweep over the primary source with a public-search fallback tier.
pub struct FetchOrchestrator {
    primary: Box<dyn OfferSource>,
    fallback: Box<dyn OfferSource>,
    spacing: Duration,
}

impl FetchOrchestrator {
    pub fn new(primary: Box<dyn OfferSource>, fallback: Box<dyn OfferSource>) -> Self {
        Self {
            primary,
            fallback,
            spacing: Duration::from_millis(800),
        }
    }

    /// Pause between consecutive upstream calls.
    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    pub async fn collect(&self, keywords: &[String], policy: &VariantPolicy) -> Collected {
        let cleaned: Vec<&str> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if cleaned.len() > policy.max_keywords {
            tracing::info!(
                kept = policy.max_keywords,
                dropped = cleaned.len() - policy.max_keywords,
                "keyword list truncated"
            );
        }
        let active = &cleaned[..cleaned.len().min(policy.max_keywords)];

        let mut out = Collected::default();
        let mut calls = 0usize;

        for kw in active {
            for variant in &policy.variants {
                self.pace(&mut calls).await;
                let (mut offers, rec) = self.primary.fetch(kw, variant).await;
                log_attempt(self.primary.as_ref(), &rec, offers.len());
                out.offers.append(&mut offers);
                out.records.push(rec);
            }
        }

        if out.offers.is_empty() && policy.fallback_enabled && !active.is_empty() {
            tracing::info!(
                source = self.fallback.name(),
                keywords = active.len(),
                "primary tier empty, falling back"
            );
            let variant = ListVariant::public_search();
            for kw in active {
                self.pace(&mut calls).await;
                let (mut offers, rec) = self.fallback.fetch(kw, &variant).await;
                log_attempt(self.fallback.as_ref(), &rec, offers.len());
                out.offers.append(&mut offers);
                out.records.push(rec);
            }
        }

        counter!("relay_offers_fetched_total").increment(out.offers.len() as u64);
        out
    }

    async fn pace(&self, calls: &mut usize) {
        if *calls > 0 && !self.spacing.is_zero() {
            tokio::time::sleep(self.spacing).await;
        }
        *calls += 1;
    }
}

fn log_attempt(source: &dyn OfferSource, rec: &FetchAttemptRecord, offers: usize) {
    let (name, tier) = (source.name(), source.tier().as_str());
    match &rec.error {
        Some(err) => tracing::warn!(
            source = name,
            tier,
            keyword = %rec.keyword,
            variant = %rec.variant,
            error = %err,
            "fetch attempt failed"
        ),
        None => tracing::info!(
            source = name,
            tier,
            keyword = %rec.keyword,
            variant = %rec.variant,
            nodes = rec.node_count,
            offers,
            "fetch attempt"
        ),
    }
}
