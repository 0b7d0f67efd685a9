//! Marketplace Undervaluation Watcher
//!
//! A library that scores marketplace listings for undervaluation with an
//! LLM scoring service and dispatches rate-limited SMS alerts when a
//! listing scores highly.
//!
//! # Design Philosophy
//!
//! **"Never let one bad item take down the run"**
//!
//! - The scoring service is an untrusted free-text channel: replies go
//!   through an ordered pipeline of idempotent repair stages terminating in
//!   a guaranteed-valid default, never an error.
//! - Every unit of work (an image, a listing, a chunk, a tick) isolates its
//!   failures; outcomes are explicit values, not swallowed exceptions.
//! - External collaborators (model, storage, discovery, alert gateway) sit
//!   behind traits so the pipeline is testable without network access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fyndvakt::{
//!     Analyzer, Monitor, MonitorConfig,
//!     model::{AnthropicModel, ModelExt},
//!     images::HttpImageFetcher,
//!     alert::ElksGateway,
//!     stores::PostgresStore,
//! };
//!
//! let model = Arc::new(AnthropicModel::from_env()?.serialized());
//! let analyzer = Analyzer::new(model, Arc::new(HttpImageFetcher::new()));
//! let store = Arc::new(PostgresStore::new(&database_url).await?);
//! let gateway = Arc::new(ElksGateway::from_env()?);
//!
//! let monitor = Monitor::new(
//!     MonitorConfig::new("11998349"),
//!     discovery,
//!     analyzer,
//!     store,
//!     gateway,
//! );
//! monitor.start().await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (ScoringModel, WatchStore, ...)
//! - [`types`] - Listing, analysis, batch, and notification types
//! - [`pipeline`] - Repair parser, scoring client, batch orchestrator,
//!   notification throttler, and monitoring cycle
//! - [`model`] - Scoring-model implementations (Anthropic, rate-limited)
//! - [`images`] - Listing-image fetching
//! - [`alert`] - Alert gateway implementations (46elks)
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`testing`] - Mock implementations for testing

pub mod alert;
pub mod error;
pub mod images;
pub mod model;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    AlertError, DiscoveryError, ImageError, ModelError, Result, StoreError, WatchError,
};
pub use traits::{
    alert::{AlertGateway, AlertReceipt},
    discovery::Discovery,
    images::{FetchedImage, ImageFetcher},
    model::{EncodedImage, ScoreRequest, ScoringModel},
    store::{ListingStore, NotificationStore, SettingsStore, WatchStore},
};
pub use types::{
    Analysis, BatchProgress, ChunkOutcome, ImageRef, ItemOutcome, Listing, ListingForAnalysis,
    MonitorConfig, MonitorConfigUpdate, NewListing, NewNotification, NotificationRecord,
    NotificationStatus, ProfitEstimate, ScoredFields, SettingsUpdate, WatchSettings, CATEGORY_ALL,
    FALLBACK_MODEL,
};

// Re-export pipeline components
pub use pipeline::{
    analyze_all, analyze_chunk, build_scoring_prompt, format_alert, parse_analysis, run_throttled,
    Analyzer, ChunkConfig, DriveConfig, Monitor, MonitorStatus, NotifyOutcome, ThrottleConfig,
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
