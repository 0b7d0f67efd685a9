//! Batch orchestrator - drive the scoring client over an ordered listing
//! set in fixed windows with resumable progress.
//!
//! One chunk call processes exactly `[start, start + chunk_size)`. The
//! cursor is owned by the caller between calls; `analyze_all` is the
//! canonical driving loop for callers that want the whole set.

use std::time::Duration;

use crate::types::analysis::Analysis;
use crate::types::batch::{BatchProgress, ChunkOutcome, ItemOutcome};
use crate::types::listing::ListingForAnalysis;

use super::analyze::Analyzer;
use crate::traits::images::ImageFetcher;
use crate::traits::model::ScoringModel;

/// Configuration for one chunk call.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Listings per chunk.
    pub chunk_size: usize,
    /// Pause between listings, to respect scoring-service rate limits.
    pub item_delay: Duration,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            item_delay: Duration::from_millis(500),
        }
    }
}

/// Configuration for the full driving loop.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub chunk: ChunkConfig,
    /// Pause between chunks.
    pub chunk_delay: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            chunk_delay: Duration::from_secs(1),
        }
    }
}

/// Score one window of the listing set.
///
/// Never fails: a per-listing error becomes a failure entry in the results
/// and the rest of the chunk continues.
pub async fn analyze_chunk<M, F>(
    analyzer: &Analyzer<M, F>,
    listings: &[ListingForAnalysis],
    start: usize,
    config: &ChunkConfig,
) -> ChunkOutcome
where
    M: ScoringModel,
    F: ImageFetcher,
{
    let total = listings.len();
    let chunk_size = config.chunk_size.max(1);
    let window_start = start.min(total);
    let window_end = (start.saturating_add(chunk_size)).min(total);

    tracing::info!(
        start = window_start,
        end = window_end,
        total,
        "Processing batch chunk"
    );

    let mut results = Vec::with_capacity(window_end - window_start);

    for (offset, listing) in listings[window_start..window_end].iter().enumerate() {
        match analyzer.try_analyze(listing).await {
            Ok(analysis) => {
                results.push(ItemOutcome {
                    listing_title: listing.title.clone(),
                    analysis,
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(title = %listing.title, error = %e, "Listing analysis failed");
                results.push(ItemOutcome {
                    listing_title: listing.title.clone(),
                    analysis: Analysis::fallback("Analysis failed. Try again later."),
                    success: false,
                    error: Some(e.to_string()),
                });
            }
        }

        if window_start + offset + 1 < window_end {
            tokio::time::sleep(config.item_delay).await;
        }
    }

    let completed = window_end;
    let has_more = completed < total;

    ChunkOutcome {
        results,
        progress: BatchProgress::new(completed, total),
        has_more,
        next_cursor: has_more.then_some(completed),
    }
}

/// Drive the orchestrator over the whole listing set, chunk by chunk.
///
/// Invokes `on_progress` after each chunk so callers can surface a progress
/// indicator.
pub async fn analyze_all<M, F>(
    analyzer: &Analyzer<M, F>,
    listings: &[ListingForAnalysis],
    config: &DriveConfig,
    mut on_progress: impl FnMut(&BatchProgress),
) -> Vec<ItemOutcome>
where
    M: ScoringModel,
    F: ImageFetcher,
{
    let mut all = Vec::with_capacity(listings.len());
    let mut cursor = 0;

    loop {
        let outcome = analyze_chunk(analyzer, listings, cursor, &config.chunk).await;
        on_progress(&outcome.progress);
        all.extend(outcome.results);

        match outcome.next_cursor {
            Some(next) => {
                cursor = next;
                tokio::time::sleep(config.chunk_delay).await;
            }
            None => break,
        }
    }

    all
}
