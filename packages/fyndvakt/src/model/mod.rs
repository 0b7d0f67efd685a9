//! Scoring-model implementations.

pub mod anthropic;
pub mod rate_limited;

pub use anthropic::AnthropicModel;
pub use rate_limited::{ModelExt, RateLimitedModel};
