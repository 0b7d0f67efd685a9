//! Monitoring cycle controller - the recurring discover → score → notify
//! loop with an explicit lifecycle.
//!
//! One `Monitor` owns one timer task and its config. Ticks never overlap:
//! the task runs a tick to completion before sleeping for the next one. A
//! failure anywhere inside a tick is caught and logged at the top of the
//! tick; the schedule is unaffected.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::pipeline::analyze::Analyzer;
use crate::pipeline::notify::{self, NotifyOutcome, ThrottleConfig};
use crate::traits::alert::AlertGateway;
use crate::traits::discovery::Discovery;
use crate::traits::images::ImageFetcher;
use crate::traits::model::ScoringModel;
use crate::traits::store::WatchStore;
use crate::types::listing::ListingForAnalysis;
use crate::types::settings::{MonitorConfig, MonitorConfigUpdate};

/// Snapshot returned by [`Monitor::status`].
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    pub is_running: bool,
    pub config: MonitorConfig,
    /// Estimated time of the next tick, when running.
    pub next_run: Option<DateTime<Utc>>,
}

struct MonitorState {
    config: MonitorConfig,
    /// Cancellation token of the running cycle task, if any.
    cycle: Option<CancellationToken>,
}

/// The recurring monitoring cycle.
pub struct Monitor<D, M, F, S, G> {
    discovery: Arc<D>,
    analyzer: Analyzer<M, F>,
    store: Arc<S>,
    gateway: Arc<G>,
    state: Mutex<MonitorState>,
    next_run: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl<D, M, F, S, G> Monitor<D, M, F, S, G>
where
    D: Discovery + 'static,
    M: ScoringModel + Clone + 'static,
    F: ImageFetcher + Clone + 'static,
    S: WatchStore + 'static,
    G: AlertGateway + 'static,
{
    pub fn new(
        config: MonitorConfig,
        discovery: Arc<D>,
        analyzer: Analyzer<M, F>,
        store: Arc<S>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            discovery,
            analyzer,
            store,
            gateway,
            state: Mutex::new(MonitorState {
                config,
                cycle: None,
            }),
            next_run: Arc::new(RwLock::new(None)),
        }
    }

    /// Start the recurring cycle. No-op if already running.
    ///
    /// The first tick runs immediately; subsequent ticks fire after each
    /// configured interval, measured from tick completion.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.cycle.is_some() {
            tracing::warn!("Monitoring cycle is already running");
            return;
        }

        self.spawn_cycle(&mut state);
        tracing::info!(
            watch_id = %state.config.watch_id,
            interval_minutes = state.config.check_interval_minutes,
            "Monitoring cycle started"
        );
    }

    /// Stop the recurring cycle. An in-flight tick runs to completion;
    /// only future ticks are cancelled. Idempotent.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        match state.cycle.take() {
            Some(cancel) => {
                cancel.cancel();
                *self.next_run.write().unwrap() = None;
                tracing::info!("Monitoring cycle stopped");
            }
            None => tracing::debug!("Monitoring cycle already stopped"),
        }
    }

    /// Merge a partial config update. If the cycle is running it restarts
    /// with the merged config as one atomic operation.
    pub async fn update_config(&self, update: &MonitorConfigUpdate) {
        let mut state = self.state.lock().await;
        state.config = state.config.merged(update);
        tracing::info!(config = ?state.config, "Monitoring config updated");

        if let Some(cancel) = state.cycle.take() {
            cancel.cancel();
            self.spawn_cycle(&mut state);
            tracing::info!("Monitoring cycle restarted with merged config");
        }
    }

    /// Run a single tick right now, outside the recurring schedule.
    pub async fn run_once(&self) {
        let config = self.state.lock().await.config.clone();
        run_cycle(
            &*self.discovery,
            &self.analyzer,
            &*self.store,
            &*self.gateway,
            &config,
        )
        .await;
    }

    pub async fn status(&self) -> MonitorStatus {
        let state = self.state.lock().await;
        let is_running = state.cycle.is_some();
        MonitorStatus {
            is_running,
            config: state.config.clone(),
            next_run: if is_running {
                *self.next_run.read().unwrap()
            } else {
                None
            },
        }
    }

    fn spawn_cycle(&self, state: &mut MonitorState) {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let config = state.config.clone();
        let discovery = Arc::clone(&self.discovery);
        let analyzer = self.analyzer.clone();
        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        let next_run = Arc::clone(&self.next_run);

        set_next_run(&self.next_run, &state.config);

        tokio::spawn(async move {
            loop {
                run_cycle(&*discovery, &analyzer, &*store, &*gateway, &config).await;
                set_next_run(&next_run, &config);

                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(config.check_interval()) => {}
                }
            }
            tracing::debug!("Monitoring task exited");
        });

        state.cycle = Some(cancel);
    }
}

fn set_next_run(next_run: &RwLock<Option<DateTime<Utc>>>, config: &MonitorConfig) {
    let estimate = Utc::now() + chrono::Duration::seconds(config.check_interval_minutes as i64 * 60);
    *next_run.write().unwrap() = Some(estimate);
}

/// One tick: discover → persist-then-score → notify. Failures are caught
/// here so the recurring schedule is never affected.
async fn run_cycle<D, M, F, S, G>(
    discovery: &D,
    analyzer: &Analyzer<M, F>,
    store: &S,
    gateway: &G,
    config: &MonitorConfig,
) where
    D: Discovery + ?Sized,
    M: ScoringModel,
    F: ImageFetcher,
    S: WatchStore + ?Sized,
    G: AlertGateway + ?Sized,
{
    tracing::info!(watch_id = %config.watch_id, "Starting monitoring cycle");

    match try_cycle(discovery, analyzer, store, gateway, config).await {
        Ok(outcome) => tracing::info!(
            dispatched = outcome.dispatched,
            failed = outcome.failed,
            quota_suppressed = outcome.quota_suppressed,
            "Monitoring cycle completed"
        ),
        Err(e) => tracing::error!(error = %e, "Monitoring cycle failed"),
    }
}

async fn try_cycle<D, M, F, S, G>(
    discovery: &D,
    analyzer: &Analyzer<M, F>,
    store: &S,
    gateway: &G,
    config: &MonitorConfig,
) -> Result<NotifyOutcome>
where
    D: Discovery + ?Sized,
    M: ScoringModel,
    F: ImageFetcher,
    S: WatchStore + ?Sized,
    G: AlertGateway + ?Sized,
{
    // (a) Discovery: new listings since the prior tick
    let discovered = discovery.discover(&config.watch_id).await?;
    tracing::info!(count = discovered.len(), "Discovered listings");

    for new_listing in &discovered {
        if let Err(e) = store.upsert_listing(new_listing).await {
            tracing::warn!(
                ad_id = %new_listing.ad_id,
                error = %e,
                "Failed to persist discovered listing"
            );
        }
    }

    // (b) Persist-then-score everything still missing a score. This also
    // retries listings whose analysis failed to persist on an earlier tick.
    let pending = store.listings_needing_analysis(&config.watch_id).await?;
    if !pending.is_empty() {
        tracing::info!(count = pending.len(), "Scoring unanalyzed listings");
    }

    for listing in &pending {
        let view = ListingForAnalysis::from(listing);
        let analysis = analyzer
            .analyze_and_persist(&view, &listing.ad_id, &config.watch_id, store)
            .await;
        tracing::debug!(ad_id = %listing.ad_id, score = analysis.score, "Listing scored");
    }

    // (c) Throttled notifications
    notify::run_throttled(store, gateway, &ThrottleConfig::from_monitor(config)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{MockDiscovery, MockGateway, MockImageFetcher, MockModel};

    fn monitor(
        config: MonitorConfig,
    ) -> Monitor<MockDiscovery, MockModel, MockImageFetcher, MemoryStore, MockGateway> {
        Monitor::new(
            config,
            Arc::new(MockDiscovery::new()),
            Analyzer::new(
                MockModel::new().with_response(r#"{"score": 4, "confidence": 0.9}"#),
                MockImageFetcher::new(),
            ),
            Arc::new(MemoryStore::new()),
            Arc::new(MockGateway::new()),
        )
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let monitor = monitor(MonitorConfig::new("watch-1"));

        monitor.start().await;
        monitor.start().await;

        let status = monitor.status().await;
        assert!(status.is_running);
        assert!(status.next_run.is_some());

        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_stop_reports_not_running() {
        let monitor = monitor(MonitorConfig::new("watch-1"));

        monitor.start().await;
        monitor.stop().await;

        let status = monitor.status().await;
        assert!(!status.is_running);
        assert!(status.next_run.is_none());

        // Stopping again is harmless
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_update_config_merges_while_stopped() {
        let monitor = monitor(MonitorConfig::new("watch-1"));

        monitor
            .update_config(&MonitorConfigUpdate {
                min_score: Some(5),
                ..Default::default()
            })
            .await;

        let status = monitor.status().await;
        assert!(!status.is_running);
        assert_eq!(status.config.min_score, 5);
        assert_eq!(status.config.watch_id, "watch-1");
    }

    #[tokio::test]
    async fn test_update_config_restarts_running_cycle() {
        let monitor = monitor(MonitorConfig::new("watch-1"));

        monitor.start().await;
        monitor
            .update_config(&MonitorConfigUpdate {
                daily_quota: Some(2),
                ..Default::default()
            })
            .await;

        let status = monitor.status().await;
        assert!(status.is_running);
        assert_eq!(status.config.daily_quota, 2);

        monitor.stop().await;
    }
}
