// 46elks SMS API client: https://46elks.com/docs/send-sms

use std::collections::HashMap;

pub mod models;

use reqwest::Client;
use thiserror::Error;

use crate::models::{SmsResponse, SmsStatusResponse};

const DEFAULT_BASE_URL: &str = "https://api.46elks.com/a1";

#[derive(Debug, Error)]
pub enum ElksError {
    #[error("request to 46elks failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("46elks returned an error ({status}): {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct ElksOptions {
    pub api_username: String,
    pub api_password: String,
    /// Default alphanumeric sender id, e.g. "Fyndvakt".
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct ElksClient {
    options: ElksOptions,
    base_url: String,
    client: Client,
}

impl ElksClient {
    pub fn new(options: ElksOptions) -> Self {
        Self {
            options,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the API base URL (for test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn sender(&self) -> &str {
        &self.options.sender
    }

    /// Send an SMS. `from` may be a phone number or an alphanumeric sender id.
    pub async fn send_sms(
        &self,
        to: &str,
        from: &str,
        message: &str,
    ) -> Result<SmsResponse, ElksError> {
        let url = format!("{}/sms", self.base_url);

        let mut form: HashMap<&str, &str> = HashMap::new();
        form.insert("to", to);
        form.insert("from", from);
        form.insert("message", message);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.api_username, Some(&self.options.api_password))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ElksError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<SmsResponse>().await?)
    }

    /// Look up the delivery status of a previously sent message.
    pub async fn sms_status(&self, message_id: &str) -> Result<SmsStatusResponse, ElksError> {
        let url = format!("{}/sms/{}", self.base_url, message_id);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.options.api_username, Some(&self.options.api_password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ElksError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<SmsStatusResponse>().await?)
    }
}

/// Validate a Swedish phone number (+46701234567 or 0701234567).
pub fn validate_phone_number(phone: &str) -> bool {
    let digits = phone.strip_prefix("+46").or_else(|| phone.strip_prefix('0'));
    match digits {
        Some(rest) => {
            rest.len() == 9
                && rest.starts_with(|c: char| ('1'..='9').contains(&c))
                && rest.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Normalize a Swedish phone number to international format.
pub fn format_phone_number(phone: &str) -> String {
    if let Some(rest) = phone.strip_prefix('0') {
        format!("+46{}", rest)
    } else if phone.starts_with("+46") {
        phone.to_string()
    } else {
        format!("+46{}", phone)
    }
}
