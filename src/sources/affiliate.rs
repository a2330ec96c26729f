// src/sources/affiliate.rs
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::{json, Value};

use super::fields::{format_price, probe_nodes, probe_str, AFFILIATE_FIELDS, AFFILIATE_NODE_PATHS};
use super::OfferSource;
use crate::error::RelayError;
use crate::signing::{Credentials, SignedRequestBuilder};
use crate::transport::{Clock, RawResponse};
use crate::types::{FetchAttemptRecord, ListVariant, Offer, SourceTier};

const PRODUCT_OFFER_QUERY: &str = "query ProductOffers($keyword: String, $listType: Int, $sortType: Int, $page: Int, $limit: Int, $matchId: Int64) { productOfferV2(keyword: $keyword, listType: $listType, sortType: $sortType, page: $page, limit: $limit, matchId: $matchId) { nodes { itemId productName priceMin priceMax offerLink productLink imageUrl shopName } pageInfo { page limit hasNextPage } } }";

/// Signed GraphQL source against the affiliate open API.
pub struct PrimaryAffiliateSource {
    signer: SignedRequestBuilder,
    creds: Credentials,
    endpoint: String,
    clock: Arc<dyn Clock>,
    page_limit: u32,
    match_id: Option<i64>,
}

impl PrimaryAffiliateSource {
    pub fn new(
        signer: SignedRequestBuilder,
        creds: Credentials,
        endpoint: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            signer,
            creds,
            endpoint: endpoint.into(),
            clock,
            page_limit: 20,
            match_id: None,
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn with_match_id(mut self, match_id: Option<i64>) -> Self {
        self.match_id = match_id;
        self
    }

    pub fn query_body(&self, keyword: &str, variant: &ListVariant) -> Value {
        let mut variables = json!({
            "keyword": keyword,
            "listType": variant.list_type,
            "sortType": variant.sort_type,
            "page": 1,
            "limit": self.page_limit,
        });
        if let (Some(id), Some(obj)) = (self.match_id, variables.as_object_mut()) {
            obj.insert("matchId".to_string(), json!(id));
        }
        json!({
            "operationName": "ProductOffers",
            "query": PRODUCT_OFFER_QUERY,
            "variables": variables,
        })
    }
}

#[async_trait]
impl OfferSource for PrimaryAffiliateSource {
    async fn fetch(
        &self,
        keyword: &str,
        variant: &ListVariant,
    ) -> (Vec<Offer>, FetchAttemptRecord) {
        counter!("relay_fetch_attempts_total", "tier" => "primary").increment(1);
        let body = self.query_body(keyword, variant);

        match self
            .signer
            .sign_and_send(&self.endpoint, &body, &self.creds, self.clock.as_ref())
            .await
        {
            Ok(resp) => parse_response(keyword, variant, &resp),
            Err(e) => {
                tracing::warn!(
                    keyword,
                    variant = %variant.tag,
                    error = %e,
                    "affiliate fetch failed"
                );
                (
                    vec![],
                    FetchAttemptRecord::failed(
                        keyword,
                        &variant.tag,
                        SourceTier::Primary,
                        e.to_string(),
                    ),
                )
            }
        }
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Primary
    }

    fn name(&self) -> &'static str {
        "shopee-affiliate"
    }
}

/// Map a completed affiliate response into offers + the attempt record.
pub fn parse_response(
    keyword: &str,
    variant: &ListVariant,
    resp: &RawResponse,
) -> (Vec<Offer>, FetchAttemptRecord) {
    let record = |nodes: usize, err: Option<RelayError>| {
        FetchAttemptRecord::new(
            keyword,
            &variant.tag,
            SourceTier::Primary,
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

    if let Some(errors) = root.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let msg = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(keyword, variant = %variant.tag, errors = %msg, "graphql errors");
            return (vec![], record(0, Some(RelayError::UpstreamDomainError(msg))));
        }
    }

    let Some(nodes) = probe_nodes(&root, AFFILIATE_NODE_PATHS) else {
        let err = RelayError::MalformedResponse("no node list in response".into());
        return (vec![], record(0, Some(err)));
    };

    let offers: Vec<Offer> = nodes.iter().filter_map(node_to_offer).collect();
    tracing::debug!(
        keyword,
        variant = %variant.tag,
        nodes = nodes.len(),
        offers = offers.len(),
        "affiliate response parsed"
    );
    (offers, record(nodes.len(), None))
}

fn node_to_offer(node: &Value) -> Option<Offer> {
    let t = &AFFILIATE_FIELDS;
    let id = probe_str(node, t.id)?;
    Some(Offer {
        id,
        title: probe_str(node, t.title).unwrap_or_default(),
        price_display: format_price(node, t),
        url: probe_str(node, t.url).unwrap_or_default(),
        image_url: probe_str(node, t.image).unwrap_or_default(),
    })
}
