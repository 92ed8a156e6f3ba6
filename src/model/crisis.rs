use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinates as reported by the crisis feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

// Describes a tracked disaster/emergency event
// - id: stable per event, assigned by the crisis feed
// - severity: 1 (minor) to 5 (catastrophic)
// - coordinates: optional; sources that need a location are skipped without it
//
// Immutable once fetched; replaced wholesale on each feed refresh. The
// prediction core reads crises but never owns or mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crisis {
    pub id: String,
    pub name: String,
    pub location: String,
    pub severity: u8,
    pub start_time: DateTime<Utc>,
    pub description: String,
    pub affected_population: u64,
    #[serde(default)]
    pub coordinator_contact: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Ephemeral merged set of real-time textual signals for one prediction
/// attempt. Keys are unique signal labels; any signal key may be absent if
/// its source failed. Built fresh for every attempt, never persisted.
///
/// Backed by an ordered map so that prompt rendering is deterministic.
#[derive(Debug, Clone, Default)]
pub struct SignalBag {
    entries: BTreeMap<String, String>,
}

impl SignalBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snippet under a signal label. Empty snippets are ignored so
    /// a source that returned a blank body contributes nothing.
    pub fn insert(&mut self, label: impl Into<String>, snippet: impl Into<String>) {
        let snippet = snippet.into();
        if !snippet.trim().is_empty() {
            self.entries.insert(label.into(), snippet);
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in stable (lexicographic) label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
