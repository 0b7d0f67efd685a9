//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the watcher pipeline
//! without making real model, network, or gateway calls.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{AlertError, DiscoveryError, ImageError, ModelError};
use crate::traits::{
    alert::{AlertGateway, AlertReceipt},
    discovery::Discovery,
    images::{FetchedImage, ImageFetcher},
    model::{ScoreRequest, ScoringModel},
};
use crate::types::listing::NewListing;

const MOCK_MODEL_ID: &str = "mock-model";

/// A mock scoring model with scripted replies, failure injection, and call
/// tracking.
#[derive(Clone, Default)]
pub struct MockModel {
    /// Replies consumed in order before falling back to the default.
    queued: Arc<Mutex<VecDeque<String>>>,
    default_response: Arc<RwLock<String>>,
    fail_all: Arc<RwLock<bool>>,
    /// 1-based call numbers that fail.
    fail_on: Arc<RwLock<HashSet<usize>>>,
    requests: Arc<RwLock<Vec<ScoreRequest>>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            default_response: Arc::new(RwLock::new(r#"{"score": 3}"#.to_string())),
            ..Default::default()
        }
    }

    /// Set the default reply for every call.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        *self.default_response.write().unwrap() = response.into();
        self
    }

    /// Queue replies consumed one per call, in order.
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queued
            .lock()
            .unwrap()
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Make every call fail.
    pub fn failing(self) -> Self {
        *self.fail_all.write().unwrap() = true;
        self
    }

    /// Make the nth call (1-based) fail.
    pub fn failing_on_call(self, call: usize) -> Self {
        self.fail_on.write().unwrap().insert(call);
        self
    }

    /// All requests made against this mock.
    pub fn requests(&self) -> Vec<ScoreRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.write().unwrap().clear();
    }
}

#[async_trait]
impl ScoringModel for MockModel {
    async fn score(&self, request: &ScoreRequest) -> Result<String, ModelError> {
        let call_number = {
            let mut requests = self.requests.write().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if *self.fail_all.read().unwrap() || self.fail_on.read().unwrap().contains(&call_number) {
            return Err(ModelError::Api {
                status: 500,
                message: "simulated scoring failure".to_string(),
            });
        }

        if let Some(queued) = self.queued.lock().unwrap().pop_front() {
            return Ok(queued);
        }
        Ok(self.default_response.read().unwrap().clone())
    }

    fn model_id(&self) -> &str {
        MOCK_MODEL_ID
    }
}

/// A mock image fetcher returning small fixed payloads.
#[derive(Clone, Default)]
pub struct MockImageFetcher {
    failing: Arc<RwLock<HashSet<String>>>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make fetches of this exact URL fail.
    pub fn failing_for(self, url: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(url.into());
        self
    }

    /// URLs fetched so far.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.read().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for MockImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        self.fetched.write().unwrap().push(url.to_string());

        if self.failing.read().unwrap().contains(url) {
            return Err(ImageError::Status {
                url: url.to_string(),
                status: 404,
            });
        }

        Ok(FetchedImage {
            media_type: "image/webp".to_string(),
            bytes: vec![0xAB; 16],
        })
    }
}

/// A dispatched alert captured by [`MockGateway`].
#[derive(Debug, Clone)]
pub struct SentAlert {
    pub to: String,
    pub from: String,
    pub message: String,
}

/// A mock alert gateway with failure injection and call tracking.
#[derive(Clone, Default)]
pub struct MockGateway {
    fail_all: Arc<RwLock<bool>>,
    /// Fail this many calls before starting to succeed.
    fail_first: Arc<Mutex<u32>>,
    sent: Arc<RwLock<Vec<SentAlert>>>,
    attempts: Arc<Mutex<u32>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every dispatch fail.
    pub fn failing(self) -> Self {
        *self.fail_all.write().unwrap() = true;
        self
    }

    /// Make the first `count` dispatches fail, then succeed.
    pub fn failing_first(self, count: u32) -> Self {
        *self.fail_first.lock().unwrap() = count;
        self
    }

    /// Successfully dispatched alerts.
    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.read().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap().len()
    }
}

#[async_trait]
impl AlertGateway for MockGateway {
    async fn send(&self, to: &str, from: &str, message: &str) -> Result<AlertReceipt, AlertError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };

        if *self.fail_all.read().unwrap() {
            return Err(AlertError::Dispatch(
                "simulated dispatch failure".to_string().into(),
            ));
        }
        {
            let mut fail_first = self.fail_first.lock().unwrap();
            if *fail_first > 0 {
                *fail_first -= 1;
                return Err(AlertError::Dispatch(
                    "simulated dispatch failure".to_string().into(),
                ));
            }
        }

        self.sent.write().unwrap().push(SentAlert {
            to: to.to_string(),
            from: from.to_string(),
            message: message.to_string(),
        });

        Ok(AlertReceipt {
            message_id: Some(format!("mock-{}", attempt)),
        })
    }
}

/// A mock discovery source.
///
/// Each batch queued with [`with_listings`](Self::with_listings) is returned
/// exactly once, matching "listings new since the prior tick".
#[derive(Clone, Default)]
pub struct MockDiscovery {
    pending: Arc<Mutex<HashMap<String, Vec<NewListing>>>>,
    fail_all: Arc<RwLock<bool>>,
    calls: Arc<Mutex<u32>>,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue listings to surface on the next discover call for a watch.
    pub fn with_listings(self, watch_id: impl Into<String>, listings: Vec<NewListing>) -> Self {
        self.pending
            .lock()
            .unwrap()
            .entry(watch_id.into())
            .or_default()
            .extend(listings);
        self
    }

    /// Make every discover call fail.
    pub fn failing(self) -> Self {
        *self.fail_all.write().unwrap() = true;
        self
    }

    /// Number of discover calls made.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Discovery for MockDiscovery {
    async fn discover(&self, watch_id: &str) -> Result<Vec<NewListing>, DiscoveryError> {
        *self.calls.lock().unwrap() += 1;

        if *self.fail_all.read().unwrap() {
            return Err(DiscoveryError::TargetUnavailable(watch_id.to_string()));
        }

        Ok(self
            .pending
            .lock()
            .unwrap()
            .remove(watch_id)
            .unwrap_or_default())
    }
}
