//! In-memory prediction store
//!
//! Maps crisis identifier to its latest prediction, answers staleness
//! checks, and enforces the single-flight rule: at most one in-flight
//! prediction attempt per crisis identifier. Entries are only ever
//! overwritten, never deleted; the map is bounded by the number of
//! concurrently tracked crises, so eviction is left to process restart.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use chrono::Utc;

use crate::model::CrisisPrediction;

/// Shared store of the latest prediction per crisis
#[derive(Default)]
pub struct PredictionStore {
    entries: RwLock<HashMap<String, CrisisPrediction>>,
    in_flight: Mutex<HashSet<String>>,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest prediction for a crisis, if any
    pub fn get(&self, crisis_id: &str) -> Option<CrisisPrediction> {
        self.entries
            .read()
            .expect("prediction store lock poisoned")
            .get(crisis_id)
            .cloned()
    }

    /// Store a prediction under its own crisis id, replacing any previous one
    pub fn set(&self, prediction: CrisisPrediction) {
        let mut entries = self.entries.write().expect("prediction store lock poisoned");
        tracing::debug!(crisis = %prediction.id, "Storing prediction");
        entries.insert(prediction.id.clone(), prediction);
    }

    /// Whether the cached prediction for a crisis is older than
    /// `threshold_seconds`. A crisis with no cached prediction is stale.
    pub fn is_stale(&self, crisis_id: &str, threshold_seconds: u64) -> bool {
        match self.get(crisis_id) {
            Some(prediction) => prediction.age_seconds(Utc::now()) > threshold_seconds,
            None => true,
        }
    }

    /// Snapshot of all cached predictions, keyed by crisis id
    pub fn snapshot(&self) -> HashMap<String, CrisisPrediction> {
        self.entries
            .read()
            .expect("prediction store lock poisoned")
            .clone()
    }

    /// Claim the in-flight slot for a crisis.
    ///
    /// Returns `None` when an attempt for this id is already active; the
    /// returned guard releases the slot when dropped, on success and failure
    /// paths alike.
    pub fn begin_flight(&self, crisis_id: &str) -> Option<FlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        if !in_flight.insert(crisis_id.to_string()) {
            return None;
        }
        Some(FlightGuard {
            store: self,
            crisis_id: crisis_id.to_string(),
        })
    }

    /// Number of currently in-flight prediction attempts
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().expect("in-flight lock poisoned").len()
    }

    fn end_flight(&self, crisis_id: &str) {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        in_flight.remove(crisis_id);
    }
}

/// RAII guard for a claimed in-flight slot
pub struct FlightGuard<'a> {
    store: &'a PredictionStore,
    crisis_id: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.store.end_flight(&self.crisis_id);
    }
}
