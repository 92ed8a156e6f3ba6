//! Prediction pipeline orchestrator
//!
//! The entry point the UI layer calls when a crisis is selected or a refresh
//! is requested. Sequences aggregation, prompt construction, the model call,
//! and the store write, and exposes a narrow observable surface (fetching
//! flag, error slot, prediction map) instead of process-wide state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::model::{Config, CrisisPrediction};
use crate::service::aggregator::DataAggregator;
use crate::service::feed::{CrisisSource, FeedError};
use crate::service::prediction::{PredictionClient, PredictionError};
use crate::service::prompts::build_prediction_prompt;
use crate::service::store::PredictionStore;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Unknown crisis: {0}")]
    UnknownCrisis(String),

    #[error("Crisis feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

/// How a `start_prediction` call resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionOutcome {
    /// A new prediction was generated and stored
    Updated,
    /// The cached prediction was still fresh; nothing was fetched
    Fresh,
    /// An attempt for this crisis was already in flight; this call was dropped
    AlreadyInFlight,
}

/// Observable pipeline state for UI consumers
#[derive(Debug, Clone, Default)]
pub struct PredictionStatus {
    /// Number of prediction attempts currently in flight
    pub fetching: usize,
    /// Message of the most recent failed attempt; cleared by the next success
    pub last_error: Option<String>,
}

impl PredictionStatus {
    pub fn is_fetching(&self) -> bool {
        self.fetching > 0
    }
}

/// Orchestrates the aggregate -> prompt -> predict -> store pipeline
pub struct PredictionOrchestrator {
    crises: Arc<dyn CrisisSource>,
    aggregator: DataAggregator,
    client: PredictionClient,
    store: Arc<PredictionStore>,
    staleness_seconds: u64,
    status_tx: watch::Sender<PredictionStatus>,
}

impl PredictionOrchestrator {
    pub fn new(
        crises: Arc<dyn CrisisSource>,
        aggregator: DataAggregator,
        client: PredictionClient,
        store: Arc<PredictionStore>,
        config: &Config,
    ) -> Self {
        let (status_tx, _) = watch::channel(PredictionStatus::default());
        Self {
            crises,
            aggregator,
            client,
            store,
            staleness_seconds: config.staleness_seconds,
            status_tx,
        }
    }

    /// Subscribe to pipeline status updates
    pub fn subscribe(&self) -> watch::Receiver<PredictionStatus> {
        self.status_tx.subscribe()
    }

    /// Whether any prediction attempt is currently in flight
    pub fn is_fetching(&self) -> bool {
        self.status_tx.borrow().is_fetching()
    }

    /// Message of the most recent failed attempt, if not yet superseded
    pub fn last_error(&self) -> Option<String> {
        self.status_tx.borrow().last_error.clone()
    }

    /// Latest cached prediction for a crisis
    pub fn prediction(&self, crisis_id: &str) -> Option<CrisisPrediction> {
        self.store.get(crisis_id)
    }

    /// Snapshot of all cached predictions keyed by crisis id
    pub fn predictions(&self) -> HashMap<String, CrisisPrediction> {
        self.store.snapshot()
    }

    /// Trigger a prediction for a crisis unless the cache is still fresh.
    ///
    /// Idempotent per in-flight attempt: a second call for the same crisis
    /// id while one is outstanding is dropped rather than launched as a
    /// duplicate model call. Calls for different ids run concurrently.
    pub async fn start_prediction(
        &self,
        crisis_id: &str,
    ) -> Result<PredictionOutcome, OrchestratorError> {
        if !self.store.is_stale(crisis_id, self.staleness_seconds) {
            tracing::debug!(crisis = %crisis_id, "Cached prediction still fresh, skipping");
            return Ok(PredictionOutcome::Fresh);
        }
        self.run(crisis_id).await
    }

    /// Trigger a prediction regardless of cache freshness (explicit refresh)
    pub async fn refresh_prediction(
        &self,
        crisis_id: &str,
    ) -> Result<PredictionOutcome, OrchestratorError> {
        self.run(crisis_id).await
    }

    async fn run(&self, crisis_id: &str) -> Result<PredictionOutcome, OrchestratorError> {
        // Single-flight: the guard holds the slot until this attempt settles
        let Some(_flight) = self.store.begin_flight(crisis_id) else {
            tracing::debug!(crisis = %crisis_id, "Prediction already in flight, dropping trigger");
            return Ok(PredictionOutcome::AlreadyInFlight);
        };

        let _fetching = FetchingToken::enter(&self.status_tx);

        tracing::info!(crisis = %crisis_id, "Starting prediction pipeline");

        match self.execute(crisis_id).await {
            Ok(()) => {
                self.status_tx.send_modify(|s| s.last_error = None);
                tracing::info!(crisis = %crisis_id, "Prediction pipeline completed");
                Ok(PredictionOutcome::Updated)
            }
            Err(e) => {
                tracing::error!(crisis = %crisis_id, error = %e, "Prediction pipeline failed");
                self.status_tx
                    .send_modify(|s| s.last_error = Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// The sequential pipeline stages. Strict ordering: the prompt is not
    /// built until aggregation settles, and the store is not written until
    /// decoding succeeds.
    async fn execute(&self, crisis_id: &str) -> Result<(), OrchestratorError> {
        let crisis = self
            .crises
            .crisis(crisis_id)
            .await?
            .ok_or_else(|| OrchestratorError::UnknownCrisis(crisis_id.to_string()))?;

        let bag = self.aggregator.collect(&crisis).await;
        let prompt = build_prediction_prompt(&crisis, &bag, Utc::now());
        let prediction = self.client.predict(&crisis, prompt).await?;

        self.store.set(prediction);
        Ok(())
    }
}

/// Drop-safe increment of the observable fetching counter
struct FetchingToken<'a> {
    status_tx: &'a watch::Sender<PredictionStatus>,
}

impl<'a> FetchingToken<'a> {
    fn enter(status_tx: &'a watch::Sender<PredictionStatus>) -> Self {
        status_tx.send_modify(|s| s.fetching += 1);
        Self { status_tx }
    }
}

impl Drop for FetchingToken<'_> {
    fn drop(&mut self) {
        self.status_tx
            .send_modify(|s| s.fetching = s.fetching.saturating_sub(1));
    }
}
