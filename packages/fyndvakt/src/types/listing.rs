use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::analysis::{Analysis, ProfitEstimate};

/// An image attached to a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }
}

/// A marketplace listing tracked by a watch.
///
/// `scored` is `Some` exactly when an analysis has been persisted for the
/// listing, which is how the "scored_at set iff score set" invariant is
/// enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,

    /// Discovery-target (saved search) this listing came from.
    pub watch_id: String,

    /// Source marketplace ad id, unique per listing.
    pub ad_id: String,

    pub title: String,
    pub price: i64,
    pub currency: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub seller_type: Option<String>,

    /// Link to the listing on the source marketplace.
    pub source_url: Option<String>,

    /// Link to the listing in our own UI.
    pub detail_url: Option<String>,

    pub images: Vec<ImageRef>,

    pub discovered_at: DateTime<Utc>,
    pub scored: Option<ScoredFields>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted score fields for a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFields {
    /// Undervaluation score, 1-5.
    pub score: u8,
    /// Model confidence, 0-1.
    pub confidence: f32,
    pub reasoning: String,
    pub factors: Vec<String>,
    pub recommendation: String,
    pub profit: Option<ProfitEstimate>,
    /// Which model produced the score.
    pub model: String,
    pub scored_at: DateTime<Utc>,
}

impl From<&Analysis> for ScoredFields {
    fn from(analysis: &Analysis) -> Self {
        Self {
            score: analysis.score,
            confidence: analysis.confidence,
            reasoning: analysis.reasoning.clone(),
            factors: analysis.factors.clone(),
            recommendation: analysis.recommendation.clone(),
            profit: analysis.profit.clone(),
            model: analysis.model.clone(),
            scored_at: analysis.analyzed_at,
        }
    }
}

/// A listing as delivered by discovery, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListing {
    pub watch_id: String,
    pub ad_id: String,
    pub title: String,
    pub price: i64,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub seller_type: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub detail_url: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// The view of a listing handed to the scoring client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingForAnalysis {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub category: String,
    pub condition: Option<String>,
    pub images: Vec<ImageRef>,
    pub location: String,
    pub seller_type: String,
}

const UNKNOWN: &str = "Unknown";

impl From<&Listing> for ListingForAnalysis {
    fn from(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone().unwrap_or_default(),
            price: listing.price,
            currency: listing.currency.clone(),
            category: listing.category.clone().unwrap_or_else(|| UNKNOWN.into()),
            condition: listing.condition.clone(),
            images: listing.images.clone(),
            location: listing.location.clone().unwrap_or_else(|| UNKNOWN.into()),
            seller_type: listing
                .seller_type
                .clone()
                .unwrap_or_else(|| UNKNOWN.into()),
        }
    }
}

impl From<&NewListing> for ListingForAnalysis {
    fn from(listing: &NewListing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone().unwrap_or_default(),
            price: listing.price,
            currency: listing.currency.clone(),
            category: listing.category.clone().unwrap_or_else(|| UNKNOWN.into()),
            condition: listing.condition.clone(),
            images: listing.images.clone(),
            location: listing.location.clone().unwrap_or_else(|| UNKNOWN.into()),
            seller_type: listing
                .seller_type
                .clone()
                .unwrap_or_else(|| UNKNOWN.into()),
        }
    }
}
