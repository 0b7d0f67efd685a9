//! Scoring client - analyze one listing end to end.
//!
//! Builds the prompt, embeds images, makes exactly one scoring-service
//! call, repair-parses the reply, and optionally persists the result.

use base64::Engine;

use crate::error::{Result, StoreError};
use crate::images::is_placeholder;
use crate::pipeline::prompts::build_scoring_prompt;
use crate::pipeline::repair::parse_analysis;
use crate::traits::images::ImageFetcher;
use crate::traits::model::{EncodedImage, ScoreRequest, ScoringModel};
use crate::traits::store::ListingStore;
use crate::types::analysis::Analysis;
use crate::types::listing::ListingForAnalysis;

/// The scoring client.
///
/// `M` and `F` are typically `Arc`-wrapped so the analyzer can be cloned
/// into the monitoring cycle's task.
#[derive(Clone)]
pub struct Analyzer<M, F> {
    model: M,
    images: F,
}

impl<M, F> Analyzer<M, F>
where
    M: ScoringModel,
    F: ImageFetcher,
{
    pub fn new(model: M, images: F) -> Self {
        Self { model, images }
    }

    /// Analyze one listing, propagating a scoring-service failure.
    ///
    /// Image fetch failures and malformed replies never surface here; only
    /// the model call itself can fail.
    pub async fn try_analyze(&self, listing: &ListingForAnalysis) -> Result<Analysis> {
        let mut request = ScoreRequest::new(build_scoring_prompt(listing));
        request.images = self.embed_images(listing).await;

        let raw = self.model.score(&request).await?;

        Ok(parse_analysis(&raw, self.model.model_id()))
    }

    /// Analyze one listing; a scoring-service failure degrades to the
    /// sentinel fallback result instead of an error.
    pub async fn analyze(&self, listing: &ListingForAnalysis) -> Analysis {
        match self.try_analyze(listing).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(
                    title = %listing.title,
                    error = %e,
                    "Scoring failed, returning fallback analysis"
                );
                Analysis::fallback("Scoring failed. Check API credentials and network connectivity.")
            }
        }
    }

    /// Analyze and persist the result for a known listing.
    ///
    /// A persistence failure is logged and swallowed; the caller still
    /// receives the analysis.
    pub async fn analyze_and_persist<S>(
        &self,
        listing: &ListingForAnalysis,
        ad_id: &str,
        watch_id: &str,
        store: &S,
    ) -> Analysis
    where
        S: ListingStore + ?Sized,
    {
        let analysis = self.analyze(listing).await;

        if let Err(e) = store.update_analysis(ad_id, &analysis).await {
            log_persist_failure(ad_id, watch_id, &e);
        } else {
            tracing::debug!(ad_id, watch_id, score = analysis.score, "Analysis saved");
        }

        analysis
    }

    /// Fetch and encode every non-placeholder image. A failure on one image
    /// skips it and never blocks the others or the analysis.
    async fn embed_images(&self, listing: &ListingForAnalysis) -> Vec<EncodedImage> {
        let mut encoded = Vec::new();

        for image in &listing.images {
            if is_placeholder(&image.url) {
                continue;
            }
            match self.images.fetch(&image.url).await {
                Ok(fetched) => encoded.push(EncodedImage {
                    media_type: fetched.media_type,
                    data: base64::engine::general_purpose::STANDARD.encode(&fetched.bytes),
                }),
                Err(e) => {
                    tracing::warn!(url = %image.url, error = %e, "Skipping image");
                }
            }
        }

        encoded
    }
}

fn log_persist_failure(ad_id: &str, watch_id: &str, error: &StoreError) {
    tracing::warn!(
        ad_id,
        watch_id,
        error = %error,
        "Failed to persist analysis; returning result to caller anyway"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockImageFetcher, MockModel};
    use crate::types::listing::ImageRef;

    fn listing_with_images(urls: &[&str]) -> ListingForAnalysis {
        ListingForAnalysis {
            title: "Cannondale road bike".to_string(),
            description: "Some rust on the chain".to_string(),
            price: 2000,
            currency: "kr".to_string(),
            category: "Bikes".to_string(),
            condition: Some("Used".to_string()),
            images: urls.iter().map(|u| ImageRef::new(*u)).collect(),
            location: "Uppsala".to_string(),
            seller_type: "private".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_model_reply() {
        let model = MockModel::new().with_response(r#"{"score": 4, "confidence": 0.8}"#);
        let analyzer = Analyzer::new(model, MockImageFetcher::new());

        let analysis = analyzer.analyze(&listing_with_images(&[])).await;
        assert_eq!(analysis.score, 4);
        assert_eq!(analysis.confidence, 0.8);
        assert_eq!(analysis.model, "mock-model");
    }

    #[tokio::test]
    async fn test_service_failure_degrades_to_fallback() {
        let model = MockModel::new().failing();
        let analyzer = Analyzer::new(model, MockImageFetcher::new());

        let analysis = analyzer.analyze(&listing_with_images(&[])).await;
        assert_eq!(analysis.score, 3);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.is_fallback());
    }

    #[tokio::test]
    async fn test_image_failure_skips_that_image_only() {
        let model = MockModel::new().with_response(r#"{"score": 5}"#);
        let fetcher = MockImageFetcher::new().failing_for("https://img.example.com/bad.webp");
        let analyzer = Analyzer::new(model.clone(), fetcher);

        let listing = listing_with_images(&[
            "https://img.example.com/good.webp",
            "https://img.example.com/bad.webp",
        ]);
        let analysis = analyzer.analyze(&listing).await;

        assert_eq!(analysis.score, 5);
        // Only the good image made it into the request
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].images.len(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_images_are_not_fetched() {
        let model = MockModel::new().with_response(r#"{"score": 3}"#);
        let fetcher = MockImageFetcher::new();
        let analyzer = Analyzer::new(model, fetcher.clone());

        let listing = listing_with_images(&["https://cdn.example.com/placeholder.png"]);
        analyzer.analyze(&listing).await;

        assert!(fetcher.fetched_urls().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_is_swallowed() {
        use crate::stores::MemoryStore;

        let model = MockModel::new().with_response(r#"{"score": 4}"#);
        let analyzer = Analyzer::new(model, MockImageFetcher::new());
        let store = MemoryStore::new();

        // No listing with this ad id exists, so update_analysis fails
        let analysis = analyzer
            .analyze_and_persist(&listing_with_images(&[]), "missing-ad", "watch-1", &store)
            .await;

        assert_eq!(analysis.score, 4);
    }
}
