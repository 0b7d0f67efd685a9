use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one alert dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Failed,
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            _ => Err(format!("invalid notification status: {}", s)),
        }
    }
}

/// A persisted record of one dispatch attempt. Written once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub recipient: String,
    pub message: String,
    pub status: NotificationStatus,
    /// Gateway message id, present on successful dispatch.
    #[serde(default)]
    pub delivery_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a notification record.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub listing_id: Uuid,
    pub recipient: String,
    pub message: String,
    pub status: NotificationStatus,
    pub delivery_id: Option<String>,
    pub error: Option<String>,
}

impl NewNotification {
    pub fn sent(
        listing_id: Uuid,
        recipient: impl Into<String>,
        message: impl Into<String>,
        delivery_id: Option<String>,
    ) -> Self {
        Self {
            listing_id,
            recipient: recipient.into(),
            message: message.into(),
            status: NotificationStatus::Sent,
            delivery_id,
            error: None,
        }
    }

    pub fn failed(
        listing_id: Uuid,
        recipient: impl Into<String>,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            listing_id,
            recipient: recipient.into(),
            message: message.into(),
            status: NotificationStatus::Failed,
            delivery_id: None,
            error: Some(error.into()),
        }
    }
}
