//! Discovery trait for the external listing source.
//!
//! The marketplace polling/scraping logic lives outside this crate; the
//! monitoring cycle only needs "listings new since the prior tick".

use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::types::listing::NewListing;

/// Surfaces new candidate listings for a watch.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self, watch_id: &str) -> Result<Vec<NewListing>, DiscoveryError>;
}

#[async_trait]
impl<D: Discovery + ?Sized> Discovery for std::sync::Arc<D> {
    async fn discover(&self, watch_id: &str) -> Result<Vec<NewListing>, DiscoveryError> {
        (**self).discover(watch_id).await
    }
}
