//! 46elks implementation of the alert gateway.

use async_trait::async_trait;

use elks::{ElksClient, ElksOptions};

use crate::error::{AlertError, WatchError};
use crate::traits::alert::{AlertGateway, AlertReceipt};

/// SMS alert gateway backed by the 46elks API.
#[derive(Debug, Clone)]
pub struct ElksGateway {
    client: ElksClient,
}

impl ElksGateway {
    pub fn new(client: ElksClient) -> Self {
        Self { client }
    }

    /// Create from `ELKS_API_USERNAME` / `ELKS_API_PASSWORD` / `ELKS_SENDER`
    /// environment variables.
    pub fn from_env() -> Result<Self, WatchError> {
        let api_username = std::env::var("ELKS_API_USERNAME")
            .map_err(|_| WatchError::Config("ELKS_API_USERNAME not set".to_string()))?;
        let api_password = std::env::var("ELKS_API_PASSWORD")
            .map_err(|_| WatchError::Config("ELKS_API_PASSWORD not set".to_string()))?;
        let sender = std::env::var("ELKS_SENDER").unwrap_or_else(|_| "Fyndvakt".to_string());

        Ok(Self::new(ElksClient::new(ElksOptions {
            api_username,
            api_password,
            sender,
        })))
    }

    /// Default sender id from the client options.
    pub fn sender(&self) -> &str {
        self.client.sender()
    }
}

#[async_trait]
impl AlertGateway for ElksGateway {
    async fn send(&self, to: &str, from: &str, message: &str) -> Result<AlertReceipt, AlertError> {
        if !elks::validate_phone_number(to) {
            return Err(AlertError::InvalidRecipient(to.to_string()));
        }
        let to = elks::format_phone_number(to);

        let response = self
            .client
            .send_sms(&to, from, message)
            .await
            .map_err(|e| AlertError::Dispatch(Box::new(e)))?;

        Ok(AlertReceipt {
            message_id: Some(response.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_recipient_rejected_before_dispatch() {
        let gateway = ElksGateway::new(ElksClient::new(ElksOptions {
            api_username: "u".to_string(),
            api_password: "p".to_string(),
            sender: "Fyndvakt".to_string(),
        }));

        let result = gateway.send("not-a-number", "Fyndvakt", "hello").await;
        assert!(matches!(result, Err(AlertError::InvalidRecipient(_))));
    }
}
