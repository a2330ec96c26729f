// src/types.rs
use serde::{Deserialize, Serialize};

/// Upper bound on the raw-response preview kept per fetch attempt.
pub const RAW_PREVIEW_MAX_CHARS: usize = 500;

/// A normalized marketplace listing, ready for dedup and delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Offer {
    pub id: String, // source-qualified, e.g. "2391..." or "pub-55-9"
    pub title: String,
    pub price_display: String, // already formatted, e.g. "R$ 12.90"
    pub url: String,
    pub image_url: String, // empty => text-only delivery
}

/// Which tier of the source chain produced an attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Primary,
    Public,
}

impl SourceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTier::Primary => "primary",
            SourceTier::Public => "public",
        }
    }
}

/// One facet (list type + sort order) of a keyword query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVariant {
    pub tag: String,
    pub list_type: i64,
    pub sort_type: i64,
}

impl ListVariant {
    pub fn new(tag: &str, list_type: i64, sort_type: i64) -> Self {
        Self {
            tag: tag.to_string(),
            list_type,
            sort_type,
        }
    }

    /// The three facets swept against the affiliate API for every keyword.
    pub fn affiliate_defaults() -> Vec<ListVariant> {
        vec![
            ListVariant::new("relevance", 0, 1),
            ListVariant::new("top-sales", 0, 2),
            ListVariant::new("top-commission", 0, 5),
        ]
    }

    /// Single facet used for the unsigned public search tier.
    pub fn public_search() -> Self {
        ListVariant::new("public", 0, 0)
    }
}

/// Diagnostics for a single (keyword, variant) fetch. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchAttemptRecord {
    pub keyword: String,
    pub variant: String,
    pub tier: SourceTier,
    pub node_count: usize,
    pub error: Option<String>,
    pub raw_preview: String,
}

impl FetchAttemptRecord {
    pub fn new(
        keyword: &str,
        variant: &str,
        tier: SourceTier,
        node_count: usize,
        error: Option<String>,
        raw: &str,
    ) -> Self {
        Self {
            keyword: keyword.to_string(),
            variant: variant.to_string(),
            tier,
            node_count,
            error,
            raw_preview: preview(raw, RAW_PREVIEW_MAX_CHARS),
        }
    }

    /// Attempt that never got a response body.
    pub fn failed(keyword: &str, variant: &str, tier: SourceTier, error: String) -> Self {
        Self::new(keyword, variant, tier, 0, Some(error), "")
    }

    pub fn is_productive(&self) -> bool {
        self.node_count > 0
    }
}

/// Result of delivering one offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    DeliveredAsFallback,
    Failed,
}

impl DeliveryOutcome {
    /// Only successful outcomes earn ledger credit.
    pub fn is_success(self) -> bool {
        !matches!(self, DeliveryOutcome::Failed)
    }
}

/// Char-boundary safe truncation.
pub fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_bounded_and_char_safe() {
        let raw = "ç".repeat(RAW_PREVIEW_MAX_CHARS + 20);
        let rec = FetchAttemptRecord::new("casa", "relevance", SourceTier::Primary, 0, None, &raw);
        assert_eq!(rec.raw_preview.chars().count(), RAW_PREVIEW_MAX_CHARS);
    }

    #[test]
    fn only_failed_outcome_is_unsuccessful() {
        assert!(DeliveryOutcome::Delivered.is_success());
        assert!(DeliveryOutcome::DeliveredAsFallback.is_success());
        assert!(!DeliveryOutcome::Failed.is_success());
    }

    #[test]
    fn offer_serializes_with_stable_field_names() {
        let o = Offer {
            id: "pub-1-2".into(),
            title: "Fone".into(),
            price_display: "R$ 10.00".into(),
            url: "https://x".into(),
            image_url: String::new(),
        };
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["price_display"], "R$ 10.00");
        assert_eq!(v["image_url"], "");
    }
}
