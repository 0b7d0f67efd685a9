//! Alert-gateway trait for the outbound notification boundary.

use async_trait::async_trait;

use crate::error::AlertError;

/// Receipt for a successfully dispatched alert.
#[derive(Debug, Clone, Default)]
pub struct AlertReceipt {
    /// Gateway message id, when the transport provides one.
    pub message_id: Option<String>,
}

/// The external message-dispatch boundary.
///
/// An `Err` means the alert was not delivered to the gateway; the throttler
/// records it as a failed attempt without consuming quota.
#[async_trait]
pub trait AlertGateway: Send + Sync {
    async fn send(&self, to: &str, from: &str, message: &str) -> Result<AlertReceipt, AlertError>;
}

#[async_trait]
impl<G: AlertGateway + ?Sized> AlertGateway for std::sync::Arc<G> {
    async fn send(&self, to: &str, from: &str, message: &str) -> Result<AlertReceipt, AlertError> {
        (**self).send(to, from, message).await
    }
}
