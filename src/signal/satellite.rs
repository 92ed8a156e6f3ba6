//! Satellite-derived impact estimate signal
//!
//! Unlike the public weather/news/alert feeds, satellite-derived estimates
//! come from a deployment-provided analysis service, so this source only
//! runs when an endpoint is configured. The endpoint receives the crisis
//! coordinates and name and returns a short estimate string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{http_client, read_success_body, SignalError, SignalKind, SignalSource};
use crate::model::Crisis;

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    #[serde(default)]
    estimate: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl EstimateResponse {
    /// Providers disagree on the field name; accept either.
    fn text(self) -> Option<String> {
        self.estimate
            .or(self.summary)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Satellite-derived estimate source; inert until an endpoint is configured
pub struct SatelliteSource {
    client: Client,
    base_url: Option<String>,
}

impl SatelliteSource {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url,
        }
    }
}

#[async_trait]
impl SignalSource for SatelliteSource {
    fn kind(&self) -> SignalKind {
        SignalKind::SatelliteData
    }

    fn applicable(&self, crisis: &Crisis) -> bool {
        self.base_url.is_some() && crisis.coordinates.is_some()
    }

    async fn fetch(&self, crisis: &Crisis) -> Result<String, SignalError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| SignalError::Parse("no satellite endpoint configured".to_string()))?;
        let coords = crisis
            .coordinates
            .ok_or_else(|| SignalError::Parse("crisis has no coordinates".to_string()))?;

        let mut url = Url::parse(base_url)
            .map_err(|e| SignalError::Parse(format!("satellite endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SignalError::Parse("satellite endpoint cannot be a base".to_string()))?
            .push("estimate");
        url.query_pairs_mut()
            .append_pair("lat", &coords.latitude.to_string())
            .append_pair("lon", &coords.longitude.to_string())
            .append_pair("name", &crisis.name);

        tracing::debug!(crisis = %crisis.id, url = %url, "Fetching satellite-derived estimate");

        let response = self.client.get(url).send().await?;
        let body = read_success_body(response).await?;

        let estimate: EstimateResponse = serde_json::from_str(&body)
            .map_err(|e| SignalError::Parse(format!("satellite payload: {}", e)))?;

        estimate.text().ok_or(SignalError::EmptyBody)
    }
}
