//! Crisis feed collaborator
//!
//! The prediction core does not own crisis records; it reads them from a
//! feed. The [`CrisisSource`] seam lets the orchestrator resolve a crisis id
//! either through the HTTP feed client or through an in-memory source when
//! the embedding UI layer already holds the active-crisis collection.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::Crisis;

const ENV_FEED_BASE_URL: &str = "CRISIS_FEED_BASE_URL";

const FEED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse feed response: {0}")]
    Parse(String),

    #[error("Feed not configured (missing {ENV_FEED_BASE_URL})")]
    NotConfigured,
}

/// Provider of crisis records for the prediction pipeline
#[async_trait]
pub trait CrisisSource: Send + Sync {
    /// Resolve a crisis by id; `None` when the id is unknown
    async fn crisis(&self, crisis_id: &str) -> Result<Option<Crisis>, FeedError>;

    /// All currently active crises
    async fn active_crises(&self) -> Result<Vec<Crisis>, FeedError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveCrisesResponse {
    #[serde(default)]
    active_crises: Vec<Crisis>,
}

/// HTTP client for the external crisis event feed
pub struct CrisisFeedClient {
    client: Client,
    base_url: String,
}

impl CrisisFeedClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(FEED_TIMEOUT)
                .build()
                .expect("default HTTP client construction"),
            base_url: base_url.into(),
        }
    }

    /// Create a client from `CRISIS_FEED_BASE_URL`
    pub fn from_env() -> Result<Self, FeedError> {
        let base_url = std::env::var(ENV_FEED_BASE_URL).map_err(|_| FeedError::NotConfigured)?;
        Ok(Self::new(base_url))
    }
}

#[async_trait]
impl CrisisSource for CrisisFeedClient {
    async fn crisis(&self, crisis_id: &str) -> Result<Option<Crisis>, FeedError> {
        let url = format!("{}/crises/{}", self.base_url, crisis_id);

        tracing::debug!(crisis = %crisis_id, url = %url, "Fetching crisis from feed");

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let crisis: Crisis = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(format!("Failed to deserialize crisis: {}", e)))?;

        Ok(Some(crisis))
    }

    async fn active_crises(&self) -> Result<Vec<Crisis>, FeedError> {
        let url = format!("{}/crises", self.base_url);

        tracing::debug!(url = %url, "Fetching active crises from feed");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let feed: ActiveCrisesResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(format!("Failed to deserialize feed: {}", e)))?;

        tracing::debug!(count = feed.active_crises.len(), "Fetched active crises");

        Ok(feed.active_crises)
    }
}

/// In-memory crisis source for embedding layers that already hold the feed
#[derive(Default)]
pub struct StaticCrisisSource {
    crises: HashMap<String, Crisis>,
}

impl StaticCrisisSource {
    pub fn new(crises: Vec<Crisis>) -> Self {
        Self {
            crises: crises.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// Replace the held collection, mirroring a feed refresh
    pub fn replace(&mut self, crises: Vec<Crisis>) {
        self.crises = crises.into_iter().map(|c| (c.id.clone(), c)).collect();
    }
}

#[async_trait]
impl CrisisSource for StaticCrisisSource {
    async fn crisis(&self, crisis_id: &str) -> Result<Option<Crisis>, FeedError> {
        Ok(self.crises.get(crisis_id).cloned())
    }

    async fn active_crises(&self) -> Result<Vec<Crisis>, FeedError> {
        Ok(self.crises.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutil::sample_crisis;

    #[test]
    fn test_parse_active_crises_payload() {
        let json = r#"{
            "activeCrises": [
                {
                    "id": "EQ-1",
                    "name": "Coastal Earthquake",
                    "location": "Port Azura",
                    "severity": 4,
                    "startTime": "2024-03-01T08:30:00Z",
                    "description": "Magnitude 6.8 earthquake near the coast",
                    "affectedPopulation": 120000,
                    "coordinates": {"latitude": 10.0, "longitude": 20.0}
                }
            ]
        }"#;

        let feed: ActiveCrisesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(feed.active_crises.len(), 1);

        let crisis = &feed.active_crises[0];
        assert_eq!(crisis.id, "EQ-1");
        assert_eq!(crisis.severity, 4);
        assert_eq!(crisis.coordinates.unwrap().latitude, 10.0);
        assert!(crisis.coordinator_contact.is_none());
    }

    #[tokio::test]
    async fn test_static_source_lookup() {
        let source = StaticCrisisSource::new(vec![
            sample_crisis("EQ-1", Some((10.0, 20.0))),
            sample_crisis("FL-2", None),
        ]);

        assert!(source.crisis("EQ-1").await.unwrap().is_some());
        assert!(source.crisis("NOPE").await.unwrap().is_none());
        assert_eq!(source.active_crises().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_static_source_replace_swaps_collection() {
        let mut source = StaticCrisisSource::new(vec![sample_crisis("EQ-1", None)]);

        source.replace(vec![sample_crisis("WF-3", None)]);

        assert!(source.crisis("EQ-1").await.unwrap().is_none());
        assert!(source.crisis("WF-3").await.unwrap().is_some());
        assert_eq!(source.active_crises().await.unwrap().len(), 1);
    }

    #[test]
    fn test_status_error_keeps_status_and_body() {
        let err = FeedError::Status {
            status: 500,
            body: "upstream exploded".to_string(),
        };
        assert!(matches!(err, FeedError::Status { status: 500, .. }));
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }
}
