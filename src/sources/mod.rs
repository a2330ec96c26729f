// src/sources/mod.rs
pub mod affiliate;
pub mod fields;
pub mod public_search;

use async_trait::async_trait;

use crate::types::{FetchAttemptRecord, ListVariant, Offer, SourceTier};

pub use affiliate::PrimaryAffiliateSource;
pub use public_search::PublicSearchSource;

/// One tier of the offer source chain.
///
/// Implementations never fail: transport, schema and upstream errors are
/// folded into the returned [`FetchAttemptRecord`] with zero offers.
#[async_trait]
pub trait OfferSource: Send + Sync {
    async fn fetch(&self, keyword: &str, variant: &ListVariant) -> (Vec<Offer>, FetchAttemptRecord);
    fn tier(&self) -> SourceTier;
    fn name(&self) -> &'static str;
}
