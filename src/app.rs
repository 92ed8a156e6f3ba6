//! Core assembly and dependency wiring
//!
//! Centralizes construction of the prediction pipeline so an embedding UI
//! layer gets one object to hold: the orchestrator with its store, signal
//! sources, and backend already wired together.

use std::sync::Arc;
use std::time::Duration;

use crate::model::Config;
use crate::service::{
    CrisisFeedClient, CrisisSource, DataAggregator, FeedError, GenerativeBackend,
    GenerativeError, HttpGenerativeBackend, PredictionClient, PredictionOrchestrator,
    PredictionStore,
};
use crate::signal::{
    AdditionalContextSource, NewsSource, OfficialAlertSource, SatelliteSource, SignalSource,
    WeatherSource,
};

/// The assembled prediction core
///
/// The orchestrator is the operational surface; the store is exposed
/// separately so read-only consumers (map overlays, detail panels) can
/// observe predictions without holding the orchestrator.
pub struct PredictionCore {
    pub orchestrator: Arc<PredictionOrchestrator>,
    pub store: Arc<PredictionStore>,
}

impl PredictionCore {
    /// Wire the pipeline from explicit collaborators
    pub fn new(
        config: Config,
        crises: Arc<dyn CrisisSource>,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Self {
        let store = Arc::new(PredictionStore::new());
        let sources = default_sources(&config, Arc::clone(&backend));

        let orchestrator = Arc::new(PredictionOrchestrator::new(
            crises,
            DataAggregator::new(sources, &config),
            PredictionClient::new(backend),
            Arc::clone(&store),
            &config,
        ));

        tracing::info!(
            staleness_seconds = config.staleness_seconds,
            fetch_timeout_seconds = config.fetch_timeout_seconds,
            "Prediction core initialized"
        );

        Self {
            orchestrator,
            store,
        }
    }

    /// Wire the pipeline from the environment
    ///
    /// Requires `GENERATIVE_API_KEY` and `CRISIS_FEED_BASE_URL`; everything
    /// else falls back to defaults or the optional config file.
    pub fn from_env() -> Result<Self, CoreInitError> {
        let config = Config::from_env();
        let backend: Arc<dyn GenerativeBackend> = Arc::new(HttpGenerativeBackend::from_env()?);
        let crises: Arc<dyn CrisisSource> = Arc::new(CrisisFeedClient::from_env()?);
        Ok(Self::new(config, crises, backend))
    }
}

/// The five standard signal sources, honoring configured endpoint overrides
fn default_sources(
    config: &Config,
    backend: Arc<dyn GenerativeBackend>,
) -> Vec<Box<dyn SignalSource>> {
    let timeout = Duration::from_secs(config.fetch_timeout_seconds);
    let signals = &config.signals;

    vec![
        Box::new(WeatherSource::new(signals.weather_url.clone(), timeout)),
        Box::new(NewsSource::new(signals.news_url.clone(), timeout)),
        Box::new(OfficialAlertSource::new(signals.alerts_url.clone(), timeout)),
        Box::new(SatelliteSource::new(signals.satellite_url.clone(), timeout)),
        Box::new(AdditionalContextSource::new(backend)),
    ]
}

/// Errors from environment-driven core initialization
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreInitError {
    #[error("Generative backend initialization failed: {0}")]
    Backend(#[from] GenerativeError),

    #[error("Crisis feed initialization failed: {0}")]
    Feed(#[from] FeedError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutil::sample_crisis;
    use crate::service::generative::testutil::ScriptedBackend;
    use crate::service::StaticCrisisSource;

    #[tokio::test]
    async fn test_assembled_core_runs_pipeline() {
        // Disable every live HTTP source so the test stays off the network;
        // the context source and the final call both hit the scripted backend
        let config = Config {
            signals: crate::model::SignalConfig {
                disabled: ["weather", "news", "officialAlert", "satelliteData"]
                    .map(String::from)
                    .to_vec(),
                ..Default::default()
            },
            ..Default::default()
        };

        let answer = r#"{"id": "x", "timestamp": "2000-01-01T00:00:00Z",
                         "predictionNarrative": "assembled"}"#;
        let core = PredictionCore::new(
            config,
            Arc::new(StaticCrisisSource::new(vec![sample_crisis("EQ-1", None)])),
            Arc::new(ScriptedBackend::new(answer)),
        );

        core.orchestrator.start_prediction("EQ-1").await.unwrap();
        let prediction = core.store.get("EQ-1").unwrap();
        assert_eq!(prediction.id, "EQ-1");
        assert_eq!(prediction.prediction_narrative, "assembled");
    }
}
