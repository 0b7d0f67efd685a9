use serde::{Deserialize, Serialize};

/// Response returned by 46elks when an SMS is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsResponse {
    /// 46elks message id, e.g. "s70df59406a1b4643b96fbe6e173b911a"
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub parts: Option<u32>,
    #[serde(default)]
    pub cost: Option<i64>,
}

/// Delivery state of a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Pending,
}

/// Raw status payload from `GET /a1/sms/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsStatusResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub delivered: Option<String>,
}

impl SmsStatusResponse {
    pub fn delivery_status(&self) -> DeliveryStatus {
        match self.status.as_str() {
            "delivered" => DeliveryStatus::Delivered,
            "failed" => DeliveryStatus::Failed,
            _ => DeliveryStatus::Pending,
        }
    }
}
