//! Signal sources for fetching real-time crisis context from external providers
//!
//! Each source queries one upstream (weather, news, official alerts,
//! satellite-derived estimates, or generated background context) and returns
//! a short text snippet for the prediction prompt. Sources are mutually
//! independent; a failure in one never affects the others.

mod alerts;
mod context;
mod news;
mod satellite;
mod weather;

use std::time::Duration;

use async_trait::async_trait;

use crate::model::Crisis;

pub use alerts::OfficialAlertSource;
pub use context::AdditionalContextSource;
pub use news::NewsSource;
pub use satellite::SatelliteSource;
pub use weather::WeatherSource;

const USER_AGENT: &str = "crisis-intel/0.1";

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Empty response body")]
    EmptyBody,

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Generative backend error: {0}")]
    Backend(String),
}

/// The fixed set of signals a prediction prompt can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Weather,
    News,
    OfficialAlert,
    SatelliteData,
    AdditionalContext,
}

impl SignalKind {
    /// Label under which this signal appears in the prompt and the bag.
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Weather => "weather",
            SignalKind::News => "news",
            SignalKind::OfficialAlert => "officialAlert",
            SignalKind::SatelliteData => "satelliteData",
            SignalKind::AdditionalContext => "additionalContext",
        }
    }
}

/// Trait for real-time signal sources
///
/// Implementations perform network I/O only and hold no shared mutable
/// state. Errors are typed here and absorbed at the aggregator boundary:
/// a failed source simply contributes no entry to the bag.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Which signal this source produces
    fn kind(&self) -> SignalKind;

    /// Whether this source can run for the given crisis
    /// (e.g. location-based sources need coordinates)
    fn applicable(&self, crisis: &Crisis) -> bool;

    /// Fetch the current snippet for the crisis
    async fn fetch(&self, crisis: &Crisis) -> Result<String, SignalError>;
}

/// Build an HTTP client with the per-call timeout every upstream fetch
/// must enforce.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .expect("default HTTP client construction")
}

/// Read a successful response body, mapping non-2xx statuses and empty
/// bodies to typed errors.
pub(crate) async fn read_success_body(response: reqwest::Response) -> Result<String, SignalError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SignalError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Err(SignalError::EmptyBody);
    }
    Ok(body)
}
