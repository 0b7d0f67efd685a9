//! In-memory storage implementation for testing and development.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::store::{ListingStore, NotificationStore, SettingsStore};
use crate::types::{
    analysis::Analysis,
    listing::{Listing, NewListing, ScoredFields},
    notification::{NewNotification, NotificationRecord, NotificationStatus},
    settings::{SettingsUpdate, WatchSettings},
};

/// In-memory store for listings, notification records, and settings.
///
/// Useful for testing and development. Not suitable for production as data
/// is lost on restart.
pub struct MemoryStore {
    /// Listings keyed by ad id.
    listings: RwLock<HashMap<String, Listing>>,
    notifications: RwLock<Vec<NotificationRecord>>,
    settings: RwLock<HashMap<String, WatchSettings>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            notifications: RwLock::new(Vec::new()),
            settings: RwLock::new(HashMap::new()),
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.listings.write().unwrap().clear();
        self.notifications.write().unwrap().clear();
        self.settings.write().unwrap().clear();
    }

    /// Number of stored listings.
    pub fn listing_count(&self) -> usize {
        self.listings.read().unwrap().len()
    }

    /// Number of stored notification records.
    pub fn notification_count(&self) -> usize {
        self.notifications.read().unwrap().len()
    }

    /// Snapshot of all notification records, for assertions.
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications.read().unwrap().clone()
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn upsert_listing(&self, listing: &NewListing) -> Result<Listing, StoreError> {
        let mut listings = self.listings.write().unwrap();

        if let Some(existing) = listings.get_mut(&listing.ad_id) {
            existing.title = listing.title.clone();
            existing.price = listing.price;
            existing.images = listing.images.clone();
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let stored = Listing {
            id: Uuid::new_v4(),
            watch_id: listing.watch_id.clone(),
            ad_id: listing.ad_id.clone(),
            title: listing.title.clone(),
            price: listing.price,
            currency: listing.currency.clone(),
            description: listing.description.clone(),
            category: listing.category.clone(),
            condition: listing.condition.clone(),
            location: listing.location.clone(),
            seller_type: listing.seller_type.clone(),
            source_url: listing.source_url.clone(),
            detail_url: listing.detail_url.clone(),
            images: listing.images.clone(),
            discovered_at: now,
            scored: None,
            created_at: now,
            updated_at: now,
        };
        listings.insert(listing.ad_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_analysis(&self, ad_id: &str, analysis: &Analysis) -> Result<(), StoreError> {
        let mut listings = self.listings.write().unwrap();
        let listing = listings.get_mut(ad_id).ok_or(StoreError::NotFound {
            entity: "listing",
            key: ad_id.to_string(),
        })?;

        listing.scored = Some(ScoredFields::from(analysis));
        listing.updated_at = Utc::now();
        Ok(())
    }

    async fn listings_needing_analysis(&self, watch_id: &str) -> Result<Vec<Listing>, StoreError> {
        let mut pending: Vec<Listing> = self
            .listings
            .read()
            .unwrap()
            .values()
            .filter(|l| l.watch_id == watch_id && l.scored.is_none())
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.discovered_at.cmp(&a.discovered_at));
        Ok(pending)
    }

    async fn alert_candidates(
        &self,
        watch_id: &str,
        min_score: u8,
    ) -> Result<Vec<Listing>, StoreError> {
        let notified: Vec<Uuid> = self
            .notifications
            .read()
            .unwrap()
            .iter()
            .filter(|n| n.status == NotificationStatus::Sent)
            .map(|n| n.listing_id)
            .collect();

        let mut candidates: Vec<Listing> = self
            .listings
            .read()
            .unwrap()
            .values()
            .filter(|l| {
                l.watch_id == watch_id
                    && l.scored.as_ref().is_some_and(|s| s.score >= min_score)
                    && !notified.contains(&l.id)
            })
            .cloned()
            .collect();

        candidates.sort_by(|a, b| {
            let (score_a, confidence_a) = sort_key(a);
            let (score_b, confidence_b) = sort_key(b);
            score_b.cmp(&score_a).then(
                confidence_b
                    .partial_cmp(&confidence_a)
                    .unwrap_or(Ordering::Equal),
            )
        });

        Ok(candidates)
    }

    async fn get_listing(&self, ad_id: &str) -> Result<Option<Listing>, StoreError> {
        Ok(self.listings.read().unwrap().get(ad_id).cloned())
    }
}

fn sort_key(listing: &Listing) -> (u8, f32) {
    listing
        .scored
        .as_ref()
        .map(|s| (s.score, s.confidence))
        .unwrap_or((0, 0.0))
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationRecord, StoreError> {
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            listing_id: notification.listing_id,
            recipient: notification.recipient.clone(),
            message: notification.message.clone(),
            status: notification.status,
            delivery_id: notification.delivery_id.clone(),
            error: notification.error.clone(),
            created_at: Utc::now(),
        };
        self.notifications.write().unwrap().push(record.clone());
        Ok(record)
    }

    async fn sent_count_today(&self, recipient: &str) -> Result<u32, StoreError> {
        let today = Utc::now().date_naive();
        let count = self
            .notifications
            .read()
            .unwrap()
            .iter()
            .filter(|n| {
                n.recipient == recipient
                    && n.status == NotificationStatus::Sent
                    && n.created_at.date_naive() == today
            })
            .count();
        Ok(count as u32)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_settings(&self, user_id: &str) -> Result<WatchSettings, StoreError> {
        let mut settings = self.settings.write().unwrap();
        Ok(settings
            .entry(user_id.to_string())
            .or_insert_with(|| WatchSettings::for_user(user_id))
            .clone())
    }

    async fn update_settings(
        &self,
        user_id: &str,
        update: &SettingsUpdate,
    ) -> Result<(), StoreError> {
        let mut settings = self.settings.write().unwrap();
        let entry = settings
            .entry(user_id.to_string())
            .or_insert_with(|| WatchSettings::for_user(user_id));
        update.apply(entry);
        Ok(())
    }
}
