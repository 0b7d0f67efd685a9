//! Anthropic implementation of the scoring model.
//!
//! Calls the Messages API with the analysis prompt plus base64-embedded
//! listing images.
//!
//! # Example
//!
//! ```rust,ignore
//! use fyndvakt::model::AnthropicModel;
//!
//! let model = AnthropicModel::from_env()?.with_model("claude-opus-4-1-20250805");
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::traits::model::{ScoreRequest, ScoringModel};

const DEFAULT_MODEL: &str = "claude-opus-4-1-20250805";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Low temperature for consistent scoring across runs.
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1000;

/// Anthropic-backed scoring model.
#[derive(Clone)]
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicModel {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ModelError::MissingCredentials("ANTHROPIC_API_KEY not set".into()))?;
        if api_key.is_empty() || api_key == "your_api_key_here" {
            return Err(ModelError::MissingCredentials(
                "ANTHROPIC_API_KEY is a placeholder".into(),
            ));
        }
        Ok(Self::new(api_key))
    }

    /// Set the model id (default: claude-opus-4-1-20250805).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ScoringModel for AnthropicModel {
    async fn score(&self, request: &ScoreRequest) -> Result<String, ModelError> {
        let mut content: Vec<ContentBlock> = vec![ContentBlock::Text {
            text: request.prompt.clone(),
        }];
        for image in &request.images {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    source_type: "base64".to_string(),
                    media_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
        };

        tracing::debug!(
            model = %self.model,
            prompt_length = request.prompt.len(),
            images = request.images.len(),
            "Calling scoring model"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Http(Box::new(e)))?;

        let text = reply
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| ModelError::EmptyResponse {
                model: self.model.clone(),
            })?;

        tracing::debug!(response_length = text.len(), "Scoring model replied");

        Ok(text.trim().to_string())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}
