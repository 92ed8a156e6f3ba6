//! Official government alert signal
//!
//! Queries an api.weather.gov-compatible active-alerts endpoint for the
//! point covering the crisis coordinates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{http_client, read_success_body, SignalError, SignalKind, SignalSource};
use crate::model::Crisis;

const DEFAULT_BASE_URL: &str = "https://api.weather.gov";

const MAX_ALERTS: usize = 4;

#[derive(Debug, Deserialize)]
struct AlertCollection {
    #[serde(default)]
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    #[serde(default)]
    event: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    headline: Option<String>,
}

/// Active official alerts for the point covering the crisis coordinates
pub struct OfficialAlertSource {
    client: Client,
    base_url: String,
}

impl OfficialAlertSource {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn summarize(alerts: &[AlertFeature]) -> Option<String> {
        let lines: Vec<String> = alerts
            .iter()
            .filter(|a| !a.properties.event.trim().is_empty())
            .take(MAX_ALERTS)
            .map(|a| {
                let p = &a.properties;
                match &p.headline {
                    Some(headline) if !headline.trim().is_empty() => {
                        format!("- [{}] {}: {}", p.severity, p.event, headline.trim())
                    }
                    _ => format!("- [{}] {}", p.severity, p.event),
                }
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(format!("Active official alerts:\n{}", lines.join("\n")))
        }
    }
}

#[async_trait]
impl SignalSource for OfficialAlertSource {
    fn kind(&self) -> SignalKind {
        SignalKind::OfficialAlert
    }

    fn applicable(&self, crisis: &Crisis) -> bool {
        crisis.coordinates.is_some()
    }

    async fn fetch(&self, crisis: &Crisis) -> Result<String, SignalError> {
        let coords = crisis
            .coordinates
            .ok_or_else(|| SignalError::Parse("crisis has no coordinates".to_string()))?;

        let url = format!(
            "{}/alerts/active?point={:.4},{:.4}",
            self.base_url, coords.latitude, coords.longitude
        );

        tracing::debug!(crisis = %crisis.id, url = %url, "Fetching official alerts");

        let response = self.client.get(&url).send().await?;
        let body = read_success_body(response).await?;

        let collection: AlertCollection = serde_json::from_str(&body)
            .map_err(|e| SignalError::Parse(format!("alert payload: {}", e)))?;

        Self::summarize(&collection.features).ok_or(SignalError::EmptyBody)
    }
}
