use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Model name stamped on results that were produced by the degradation
/// path rather than a real scoring-service reply.
pub const FALLBACK_MODEL: &str = "fallback";

/// How long an analysis is considered fresh before re-scoring is worthwhile.
const FRESHNESS_HOURS: i64 = 24;

/// A validated scoring result for one listing.
///
/// Always well-formed: score is 1-5 and confidence is 0-1 on every path,
/// including the fallback variant produced when the scoring service or the
/// response parse fails outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Undervaluation score, 1 (overpriced) to 5 (strongly undervalued).
    pub score: u8,
    /// Model confidence, 0-1.
    pub confidence: f32,
    pub reasoning: String,
    pub factors: Vec<String>,
    pub recommendation: String,
    #[serde(default)]
    pub profit: Option<ProfitEstimate>,
    pub analyzed_at: DateTime<Utc>,
    /// Which model produced the result (or [`FALLBACK_MODEL`]).
    pub model: String,
}

impl Analysis {
    /// The sentinel result returned when the scoring call or parse fails
    /// outright: neutral score, zero confidence.
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            score: 3,
            confidence: 0.0,
            reasoning: reasoning.into(),
            factors: vec!["Analysis failed".to_string()],
            recommendation: "Manual review recommended".to_string(),
            profit: None,
            analyzed_at: Utc::now(),
            model: FALLBACK_MODEL.to_string(),
        }
    }

    /// Whether this analysis was produced by the degradation path.
    pub fn is_fallback(&self) -> bool {
        self.model == FALLBACK_MODEL
    }

    /// Whether the analysis is recent enough to reuse instead of re-scoring.
    pub fn is_fresh(&self) -> bool {
        Utc::now() - self.analyzed_at < Duration::hours(FRESHNESS_HOURS)
    }
}

/// Resale profit estimate produced alongside the score.
///
/// Free-text amounts as emitted by the model; the pipeline treats these as
/// opaque operator-facing strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitEstimate {
    #[serde(default)]
    pub estimated_repair_cost: String,
    #[serde(default)]
    pub estimated_repair_time: String,
    #[serde(default)]
    pub estimated_sale_price: String,
    #[serde(default)]
    pub estimated_profit: String,
    #[serde(default)]
    pub profit_margin_percent: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub repair_items: Vec<String>,
    #[serde(default)]
    pub market_comparison: String,
}
