//! Image-fetch trait for embedding listing photos in scoring requests.

use async_trait::async_trait;

use crate::error::ImageError;

/// A fetched image ready for encoding.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// MIME type, e.g. `image/webp`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Fetches listing images by URL.
///
/// A failure fetching one image never aborts a listing's analysis; callers
/// skip the image and continue.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError>;
}

#[async_trait]
impl<F: ImageFetcher + ?Sized> ImageFetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        (**self).fetch(url).await
    }
}
