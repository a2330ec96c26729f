// src/sources/public_search.rs
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use super::fields::{format_price, probe_str, PUBLIC_FIELDS, PUBLIC_SHOP_ID};
use super::OfferSource;
use crate::error::RelayError;
use crate::transport::{Headers, HttpTransport, RawResponse};
use crate::types::{FetchAttemptRecord, ListVariant, Offer, SourceTier};

/// Prefix that keeps public-search ids apart from affiliate item ids.
pub const PUBLIC_ID_PREFIX: &str = "pub-";

const PRODUCT_BASE_URL: &str = "https://shopee.com.br/product";
const IMAGE_CDN_BASE: &str = "https://down-br.img.susercontent.com/file";
const BROWSER_UA: &str = "Mozilla/5.0";

/// Unsigned public search endpoint, used as the fallback tier.
pub struct PublicSearchSource {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    limit: u32,
}

impl PublicSearchSource {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            limit: 20,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }
}

#[async_trait]
impl OfferSource for PublicSearchSource {
    async fn fetch(
        &self,
        keyword: &str,
        variant: &ListVariant,
    ) -> (Vec<Offer>, FetchAttemptRecord) {
        counter!("relay_fetch_attempts_total", "tier" => "public").increment(1);
        let query = [
            ("by", "sales".to_string()),
            ("keyword", keyword.to_string()),
            ("limit", self.limit.to_string()),
            ("order", "desc".to_string()),
            ("page_type", "search".to_string()),
        ];
        let headers: Headers = vec![("User-Agent".to_string(), BROWSER_UA.to_string())];

        match self.transport.get(&self.endpoint, &query, &headers).await {
            Ok(resp) => parse_response(keyword, variant, &resp),
            Err(e) => {
                tracing::warn!(keyword, error = %e, "public search failed");
                (
                    vec![],
                    FetchAttemptRecord::failed(
                        keyword,
                        &variant.tag,
                        SourceTier::Public,
                        e.to_string(),
                    ),
                )
            }
        }
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Public
    }

    fn name(&self) -> &'static str {
        "shopee-public-search"
    }
}

pub fn parse_response(
    keyword: &str,
    variant: &ListVariant,
    resp: &RawResponse,
) -> (Vec<Offer>, FetchAttemptRecord) {
    let record = |nodes: usize, err: Option<RelayError>| {
        FetchAttemptRecord::new(
            keyword,
            &variant.tag,
            SourceTier::Public,
            nodes,
            err.map(|e| e.to_string()),
            &resp.body,
        )
    };

    if !resp.is_success() {
        let err = RelayError::MalformedResponse(format!("http status {}", resp.status));
        return (vec![], record(0, Some(err)));
    }

    let root: Value = match serde_json::from_str(&resp.body) {
        Ok(v) => v,
        Err(e) => {
            let err = RelayError::MalformedResponse(format!("invalid json: {e}"));
            return (vec![], record(0, Some(err)));
        }
    };

    // `items: null` is what the endpoint returns for no hits.
    let items: &[Value] = match root.get("items") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) => &[],
        _ => {
            let err = RelayError::MalformedResponse("no items list in response".into());
            return (vec![], record(0, Some(err)));
        }
    };

    let offers: Vec<Offer> = items
        .iter()
        .map(|it| it.get("item_basic").unwrap_or(it))
        .filter_map(item_to_offer)
        .collect();
    (offers, record(items.len(), None))
}

fn item_to_offer(item: &Value) -> Option<Offer> {
    let t = &PUBLIC_FIELDS;
    let item_id = probe_str(item, t.id)?;
    let shop_id = probe_str(item, PUBLIC_SHOP_ID)?;
    let image_url = probe_str(item, t.image)
        .map(|hash| format!("{IMAGE_CDN_BASE}/{hash}"))
        .unwrap_or_default();

    Some(Offer {
        id: format!("{PUBLIC_ID_PREFIX}{shop_id}-{item_id}"),
        title: probe_str(item, t.title).unwrap_or_default(),
        price_display: format_price(item, t),
        url: format!("{PRODUCT_BASE_URL}/{shop_id}/{item_id}"),
        image_url,
    })
}
