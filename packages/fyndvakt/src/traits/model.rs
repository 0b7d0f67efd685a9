//! Scoring-model trait for the LLM boundary.
//!
//! Implementations wrap a specific provider and handle the transport
//! specifics. The reply is deliberately raw text: the provider enforces no
//! schema, so response validation belongs to the repair parser, not here.

use async_trait::async_trait;

use crate::error::ModelError;

/// An image embedded into a scoring request, already fetched and encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// MIME type, e.g. `image/webp`.
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// One scoring request: the analysis prompt plus zero or more images.
#[derive(Debug, Clone, Default)]
pub struct ScoreRequest {
    pub prompt: String,
    pub images: Vec<EncodedImage>,
}

impl ScoreRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: EncodedImage) -> Self {
        self.images.push(image);
        self
    }
}

/// The LLM scoring service.
#[async_trait]
pub trait ScoringModel: Send + Sync {
    /// Invoke the model once and return its raw free-form reply.
    async fn score(&self, request: &ScoreRequest) -> Result<String, ModelError>;

    /// Identifier stamped onto analyses produced through this model.
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<M: ScoringModel + ?Sized> ScoringModel for std::sync::Arc<M> {
    async fn score(&self, request: &ScoreRequest) -> Result<String, ModelError> {
        (**self).score(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}
