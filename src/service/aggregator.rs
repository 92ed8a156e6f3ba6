//! Real-time signal aggregation
//!
//! Fans out to every applicable signal source concurrently, waits for all of
//! them to settle, and merges whatever succeeded into a single bag together
//! with the crisis's own static fields. Partial failure is the normal case:
//! a failed source simply contributes no entry.

use std::time::Duration;

use futures::future::join_all;

use crate::model::{Config, Crisis, SignalBag};
use crate::signal::SignalSource;

/// Bag labels for the echoed crisis static fields
const LABEL_NAME: &str = "crisisName";
const LABEL_LOCATION: &str = "crisisLocation";
const LABEL_DESCRIPTION: &str = "crisisDescription";
const LABEL_SEVERITY: &str = "crisisSeverity";

/// Aggregates signal snippets for one crisis
pub struct DataAggregator {
    sources: Vec<Box<dyn SignalSource>>,
    fetch_timeout: Duration,
}

impl DataAggregator {
    pub fn new(sources: Vec<Box<dyn SignalSource>>, config: &Config) -> Self {
        let sources: Vec<Box<dyn SignalSource>> = sources
            .into_iter()
            .filter(|s| !config.signals.is_disabled(s.kind().label()))
            .collect();

        Self {
            sources,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_seconds),
        }
    }

    /// Collect the signal bag for a crisis.
    ///
    /// Always succeeds: at minimum the bag carries the crisis's static
    /// fields. All applicable sources run concurrently; each fetch is bounded
    /// by the configured timeout on top of the source's own HTTP timeout, so
    /// the fan-in never blocks indefinitely.
    pub async fn collect(&self, crisis: &Crisis) -> SignalBag {
        let mut bag = SignalBag::new();
        bag.insert(LABEL_NAME, crisis.name.clone());
        bag.insert(LABEL_LOCATION, crisis.location.clone());
        bag.insert(LABEL_DESCRIPTION, crisis.description.clone());
        bag.insert(LABEL_SEVERITY, format!("{} (scale 1-5)", crisis.severity));

        let applicable: Vec<_> = self
            .sources
            .iter()
            .filter(|s| s.applicable(crisis))
            .collect();

        tracing::debug!(
            crisis = %crisis.id,
            sources = applicable.len(),
            "Fanning out signal fetches"
        );

        let fetches: Vec<_> = applicable
            .iter()
            .map(|source| self.fetch_one(source.as_ref(), crisis))
            .collect();

        let results = join_all(fetches).await;

        for (label, snippet) in results.into_iter().flatten() {
            bag.insert(label, snippet);
        }

        tracing::info!(
            crisis = %crisis.id,
            entries = bag.len(),
            "Signal aggregation settled"
        );

        bag
    }

    /// Run a single source, absorbing every failure mode into `None`.
    async fn fetch_one(
        &self,
        source: &dyn SignalSource,
        crisis: &Crisis,
    ) -> Option<(&'static str, String)> {
        let label = source.kind().label();

        match tokio::time::timeout(self.fetch_timeout, source.fetch(crisis)).await {
            Ok(Ok(snippet)) => {
                tracing::debug!(crisis = %crisis.id, signal = label, "Signal fetched");
                Some((label, snippet))
            }
            Ok(Err(e)) => {
                tracing::warn!(crisis = %crisis.id, signal = label, error = %e, "Signal fetch failed, skipping");
                None
            }
            Err(_) => {
                tracing::warn!(crisis = %crisis.id, signal = label, "Signal fetch timed out, skipping");
                None
            }
        }
    }
}
