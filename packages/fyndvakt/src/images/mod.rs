//! Listing-image fetching for scoring requests.
//!
//! The source marketplace serves downscaled thumbnails by default; the
//! fetcher rewrites image URLs to the original-quality variant before
//! downloading so the model sees usable detail.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ImageError;
use crate::traits::images::{FetchedImage, ImageFetcher};

/// HTTP implementation of [`ImageFetcher`].
#[derive(Clone, Default)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        let fetch_url = original_quality_url(url);

        let response = self
            .client
            .get(&fetch_url)
            .send()
            .await
            .map_err(|e| ImageError::Http {
                url: fetch_url.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status {
                url: fetch_url,
                status: status.as_u16(),
            });
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .map(|v| v.to_string())
            .unwrap_or_else(|| media_type_for_url(&fetch_url).to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Http {
                url: fetch_url,
                source: Box::new(e),
            })?
            .to_vec();

        Ok(FetchedImage { media_type, bytes })
    }
}

/// Rewrite a marketplace image URL to its original-quality variant:
/// query parameters stripped, `.webp` extension, `?type=original`.
pub fn original_quality_url(url: &str) -> String {
    let clean = url.split('?').next().unwrap_or(url);

    if clean.contains(".webp") {
        return format!("{}?type=original", clean);
    }

    match clean.rsplit_once('/') {
        Some((base, file)) => {
            let stem = file.split('.').next().unwrap_or(file);
            format!("{}/{}.webp?type=original", base, stem)
        }
        // Not a path we understand; leave it as-is
        None => url.to_string(),
    }
}

/// Whether an image URL is a placeholder not worth sending to the model.
pub fn is_placeholder(url: &str) -> bool {
    url.is_empty() || url.contains("placeholder")
}

/// Guess a MIME type from the URL extension.
pub fn media_type_for_url(url: &str) -> &'static str {
    if url.contains(".webp") {
        "image/webp"
    } else if url.contains(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_quality_url_strips_query_and_converts() {
        assert_eq!(
            original_quality_url("https://img.example.com/images/123abc.jpg?h=300"),
            "https://img.example.com/images/123abc.webp?type=original"
        );
    }

    #[test]
    fn test_original_quality_url_keeps_webp() {
        assert_eq!(
            original_quality_url("https://img.example.com/images/123abc.webp?h=300"),
            "https://img.example.com/images/123abc.webp?type=original"
        );
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("https://example.com/placeholder.png"));
        assert!(!is_placeholder("https://img.example.com/images/123abc.webp"));
    }

    #[test]
    fn test_media_type_for_url() {
        assert_eq!(media_type_for_url("a/b.webp?type=original"), "image/webp");
        assert_eq!(media_type_for_url("a/b.png"), "image/png");
        assert_eq!(media_type_for_url("a/b.jpg"), "image/jpeg");
    }
}
