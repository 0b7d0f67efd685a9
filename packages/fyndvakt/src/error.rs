//! Typed errors for the watcher pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Several operations
//! deliberately do NOT return these errors: the response repair parser is
//! total, the scoring client degrades to a fallback analysis, and a batch
//! chunk converts per-item errors into failure entries.

use thiserror::Error;

/// Errors that can occur in the watcher pipeline.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Scoring service call failed
    #[error("scoring model error: {0}")]
    Model(#[from] ModelError),

    /// Image fetch failed
    #[error("image fetch error: {0}")]
    Image(#[from] ImageError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Alert dispatch failed
    #[error("alert gateway error: {0}")]
    Alert(#[from] AlertError),

    /// Listing discovery failed
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Errors from the scoring-service boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP transport failed (network, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider returned a non-success status (auth, quota, bad request)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Provider returned no usable content
    #[error("empty response from model {model}")]
    EmptyResponse { model: String },

    /// API key missing or placeholder
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
}

/// Errors fetching a listing image for embedding.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("image fetch returned status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Errors from the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the alert gateway.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("dispatch failed: {0}")]
    Dispatch(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Errors from the external discovery collaborator.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("discovery target not available: {0}")]
    TargetUnavailable(String),
}

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatchError>;
