//! Notification throttler - dispatch alerts for high-scoring listings
//! under quota, category, and dedup rules.

use crate::error::Result;
use crate::traits::alert::AlertGateway;
use crate::traits::store::{ListingStore, NotificationStore};
use crate::types::listing::{Listing, ScoredFields};
use crate::types::notification::NewNotification;
use crate::types::settings::{MonitorConfig, CATEGORY_ALL};

/// Throttler inputs for one pass.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub watch_id: String,
    /// Minimum score that qualifies for an alert.
    pub min_score: u8,
    pub recipient: String,
    /// Sender id stamped on outgoing alerts.
    pub sender: String,
    /// Max successful alerts per recipient per calendar day.
    pub daily_quota: u32,
    /// Category allow-list; empty or containing "all" disables filtering.
    pub categories: Vec<String>,
}

impl ThrottleConfig {
    pub fn from_monitor(config: &MonitorConfig) -> Self {
        Self {
            watch_id: config.watch_id.clone(),
            min_score: config.min_score,
            recipient: config.recipient.clone(),
            sender: config.sender.clone(),
            daily_quota: config.daily_quota,
            categories: config.categories.clone(),
        }
    }
}

/// What one throttler pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOutcome {
    /// Candidates after the category filter.
    pub candidates: usize,
    pub dispatched: usize,
    pub failed: usize,
    /// Candidates left undispatched because the quota was reached.
    pub quota_suppressed: usize,
}

/// Run one throttled notification pass.
///
/// Candidates come back from the store ordered by (score desc, confidence
/// desc) with listings that already have a sent record excluded; iteration
/// stops entirely once the running sent count reaches the daily quota.
pub async fn run_throttled<S, G>(
    store: &S,
    gateway: &G,
    config: &ThrottleConfig,
) -> Result<NotifyOutcome>
where
    S: ListingStore + NotificationStore + ?Sized,
    G: AlertGateway + ?Sized,
{
    let mut outcome = NotifyOutcome::default();

    let candidates = store
        .alert_candidates(&config.watch_id, config.min_score)
        .await?;

    if candidates.is_empty() {
        tracing::info!(watch_id = %config.watch_id, "No alert candidates");
        return Ok(outcome);
    }

    let filtered = filter_by_category(candidates, &config.categories);
    outcome.candidates = filtered.len();

    tracing::info!(
        watch_id = %config.watch_id,
        candidates = filtered.len(),
        "Found alert candidates"
    );

    let mut sent_today = store.sent_count_today(&config.recipient).await?;

    for (index, listing) in filtered.iter().enumerate() {
        if sent_today >= config.daily_quota {
            outcome.quota_suppressed = filtered.len() - index;
            tracing::warn!(
                sent_today,
                quota = config.daily_quota,
                suppressed = outcome.quota_suppressed,
                "Daily alert quota reached, stopping notifications"
            );
            break;
        }

        let Some(scored) = listing.scored.as_ref() else {
            // alert_candidates only returns scored listings
            tracing::warn!(ad_id = %listing.ad_id, "Candidate without score fields, skipping");
            continue;
        };

        let message = format_alert(listing, scored);

        match gateway
            .send(&config.recipient, &config.sender, &message)
            .await
        {
            Ok(receipt) => {
                store
                    .create_notification(&NewNotification::sent(
                        listing.id,
                        &config.recipient,
                        &message,
                        receipt.message_id,
                    ))
                    .await?;
                sent_today += 1;
                outcome.dispatched += 1;
                tracing::info!(ad_id = %listing.ad_id, score = scored.score, "Alert sent");
            }
            Err(e) => {
                tracing::warn!(ad_id = %listing.ad_id, error = %e, "Alert dispatch failed");
                store
                    .create_notification(&NewNotification::failed(
                        listing.id,
                        &config.recipient,
                        &message,
                        e.to_string(),
                    ))
                    .await?;
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Apply the category allow-list. The sentinel "all" anywhere in the list
/// bypasses filtering entirely, even alongside other values.
fn filter_by_category(candidates: Vec<Listing>, categories: &[String]) -> Vec<Listing> {
    if categories.is_empty() || categories.iter().any(|c| c == CATEGORY_ALL) {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|listing| {
            listing
                .category
                .as_ref()
                .is_some_and(|c| categories.contains(c))
        })
        .collect()
}

/// Compose the operator-facing alert message.
pub fn format_alert(listing: &Listing, scored: &ScoredFields) -> String {
    let (emoji, headline) = if scored.score >= 5 {
        ("🚨", "HEAVILY UNDERVALUED")
    } else {
        ("💰", "UNDERVALUED")
    };

    let mut message = format!(
        "{} {} LISTING FOUND!\n\nScore: {}/5 ({}% confidence)\nTitle: {}\nPrice: {} {}\n",
        emoji,
        headline,
        scored.score,
        (scored.confidence * 100.0).round() as u32,
        listing.title,
        listing.price,
        listing.currency,
    );

    if let Some(url) = &listing.detail_url {
        message.push_str(&format!("\n🔗 Details: {}", url));
    }
    if let Some(url) = &listing.source_url {
        message.push_str(&format!("\n🛒 Listing: {}", url));
    }

    message.push_str("\n\nBuy quickly before someone else does!");
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn scored_listing(category: &str, score: u8, confidence: f32) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            watch_id: "watch-1".to_string(),
            ad_id: Uuid::new_v4().to_string(),
            title: "Bike".to_string(),
            price: 1000,
            currency: "kr".to_string(),
            description: None,
            category: Some(category.to_string()),
            condition: None,
            location: None,
            seller_type: None,
            source_url: Some("https://market.example.com/ad/1".to_string()),
            detail_url: None,
            images: vec![],
            discovered_at: now,
            scored: Some(ScoredFields {
                score,
                confidence,
                reasoning: "cheap".to_string(),
                factors: vec![],
                recommendation: "buy".to_string(),
                profit: None,
                model: "test".to_string(),
                scored_at: now,
            }),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_category_filter_matches() {
        let candidates = vec![scored_listing("Bikes", 4, 0.8), scored_listing("Boats", 4, 0.8)];
        let filtered = filter_by_category(candidates, &["Bikes".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category.as_deref(), Some("Bikes"));
    }

    #[test]
    fn test_all_sentinel_bypasses_filter_even_with_other_values() {
        let candidates = vec![scored_listing("Bikes", 4, 0.8), scored_listing("Boats", 4, 0.8)];
        let categories = vec!["Bikes".to_string(), CATEGORY_ALL.to_string()];
        let filtered = filter_by_category(candidates, &categories);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_empty_allow_list_bypasses_filter() {
        let candidates = vec![scored_listing("Boats", 4, 0.8)];
        assert_eq!(filter_by_category(candidates, &[]).len(), 1);
    }

    #[test]
    fn test_format_alert_contents() {
        let listing = scored_listing("Bikes", 5, 0.92);
        let scored = listing.scored.clone().unwrap();
        let message = format_alert(&listing, &scored);

        assert!(message.contains("HEAVILY UNDERVALUED"));
        assert!(message.contains("Score: 5/5 (92% confidence)"));
        assert!(message.contains("1000 kr"));
        assert!(message.contains("https://market.example.com/ad/1"));
    }
}
