//! Core data types for the watcher pipeline.

pub mod analysis;
pub mod batch;
pub mod listing;
pub mod notification;
pub mod settings;

pub use analysis::{Analysis, ProfitEstimate, FALLBACK_MODEL};
pub use batch::{BatchProgress, ChunkOutcome, ItemOutcome};
pub use listing::{ImageRef, Listing, ListingForAnalysis, NewListing, ScoredFields};
pub use notification::{NewNotification, NotificationRecord, NotificationStatus};
pub use settings::{
    MonitorConfig, MonitorConfigUpdate, SettingsUpdate, WatchSettings, CATEGORY_ALL,
};
