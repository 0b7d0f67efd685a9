//! Storage traits for listings, notification records, and settings.
//!
//! The storage layer is split into focused traits:
//! - `ListingStore`: listing rows and their score fields
//! - `NotificationStore`: dispatch-attempt records and quota counts
//! - `SettingsStore`: operator notification preferences
//! - `WatchStore`: composite trait combining all three

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{
    analysis::Analysis,
    listing::{Listing, NewListing},
    notification::{NewNotification, NotificationRecord},
    settings::{SettingsUpdate, WatchSettings},
};

/// Store for listings and their score fields.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a listing or refresh title/price/images on ad-id conflict.
    async fn upsert_listing(&self, listing: &NewListing) -> Result<Listing, StoreError>;

    /// Persist score fields for the listing with the given ad id.
    async fn update_analysis(&self, ad_id: &str, analysis: &Analysis) -> Result<(), StoreError>;

    /// Listings under a watch that have no score yet, newest first.
    async fn listings_needing_analysis(&self, watch_id: &str) -> Result<Vec<Listing>, StoreError>;

    /// Listings scored at or above `min_score` with no prior *sent*
    /// notification record, ordered by score then confidence, descending.
    ///
    /// Failed dispatch records do not exclude a listing; those are retried
    /// on a later cycle.
    async fn alert_candidates(
        &self,
        watch_id: &str,
        min_score: u8,
    ) -> Result<Vec<Listing>, StoreError>;

    /// Look up one listing by ad id.
    async fn get_listing(&self, ad_id: &str) -> Result<Option<Listing>, StoreError>;
}

/// Store for notification dispatch records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Record one dispatch attempt. Records are append-only.
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationRecord, StoreError>;

    /// Number of *sent* records for the recipient in the current UTC day.
    async fn sent_count_today(&self, recipient: &str) -> Result<u32, StoreError>;
}

/// Store for operator settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch settings for a user, creating defaults if none exist.
    async fn get_settings(&self, user_id: &str) -> Result<WatchSettings, StoreError>;

    /// Apply a partial settings update.
    async fn update_settings(
        &self,
        user_id: &str,
        update: &SettingsUpdate,
    ) -> Result<(), StoreError>;
}

/// Composite storage trait used by the monitoring cycle.
pub trait WatchStore: ListingStore + NotificationStore + SettingsStore {}

impl<T: ListingStore + NotificationStore + SettingsStore> WatchStore for T {}
