//! Current-conditions weather signal
//!
//! Uses an Open-Meteo-compatible forecast endpoint (no key required) keyed
//! by the crisis coordinates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{http_client, read_success_body, SignalError, SignalKind, SignalSource};
use crate::model::Crisis;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    #[serde(default)]
    temperature_2m: Option<f64>,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    precipitation: Option<f64>,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
    #[serde(default)]
    wind_gusts_10m: Option<f64>,
}

/// Weather conditions source keyed by crisis coordinates
pub struct WeatherSource {
    client: Client,
    base_url: String,
}

impl WeatherSource {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Render the parsed conditions into a single prompt-ready line.
    fn summarize(conditions: &CurrentConditions) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(t) = conditions.temperature_2m {
            parts.push(format!("temperature {t:.1}C"));
        }
        if let Some(h) = conditions.relative_humidity_2m {
            parts.push(format!("humidity {h:.0}%"));
        }
        if let Some(p) = conditions.precipitation {
            parts.push(format!("precipitation {p:.1}mm"));
        }
        if let Some(w) = conditions.wind_speed_10m {
            parts.push(format!("wind {w:.1}km/h"));
        }
        if let Some(g) = conditions.wind_gusts_10m {
            parts.push(format!("gusts {g:.1}km/h"));
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("Current conditions at the site: {}", parts.join(", ")))
        }
    }
}

#[async_trait]
impl SignalSource for WeatherSource {
    fn kind(&self) -> SignalKind {
        SignalKind::Weather
    }

    fn applicable(&self, crisis: &Crisis) -> bool {
        crisis.coordinates.is_some()
    }

    async fn fetch(&self, crisis: &Crisis) -> Result<String, SignalError> {
        let coords = crisis
            .coordinates
            .ok_or_else(|| SignalError::Parse("crisis has no coordinates".to_string()))?;

        let url = format!(
            "{}/forecast?latitude={}&longitude={}\
             &current=temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m,wind_gusts_10m",
            self.base_url, coords.latitude, coords.longitude
        );

        tracing::debug!(crisis = %crisis.id, url = %url, "Fetching weather conditions");

        let response = self.client.get(&url).send().await?;
        let body = read_success_body(response).await?;

        let forecast: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| SignalError::Parse(format!("weather payload: {}", e)))?;

        forecast
            .current
            .as_ref()
            .and_then(Self::summarize)
            .ok_or(SignalError::EmptyBody)
    }
}
