//! Generative text backend client
//!
//! The backend accepts role-tagged text parts plus generation parameters and
//! returns candidate completions; this module reads only the first
//! candidate's first text part. The trait seam exists so the prediction
//! pipeline can be exercised against scripted backends in tests.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ENV_API_KEY: &str = "GENERATIVE_API_KEY";
const ENV_BASE_URL: &str = "GENERATIVE_BASE_URL";
const ENV_MODEL: &str = "GENERATIVE_MODEL";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// HTTP timeout for model calls. Generation is slower than the signal
/// fetches, so this is looser than the per-signal bound.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum GenerativeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response contained no candidate text")]
    EmptyAnswer,

    #[error("Backend not configured (missing {ENV_API_KEY})")]
    NotConfigured,
}

/// One role-tagged text part of a request
#[derive(Debug, Clone)]
pub struct MessagePart {
    pub role: String,
    pub text: String,
}

/// A single generation request: prompt parts plus parameters
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub parts: Vec<MessagePart>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// When set, the backend is directed to answer with a JSON document
    pub expect_json: bool,
}

impl GenerateRequest {
    /// Single user-role text part with default parameters
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![MessagePart {
                role: "user".to_string(),
                text: text.into(),
            }],
            temperature: 0.7,
            max_output_tokens: 2048,
            expect_json: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn expecting_json(mut self) -> Self {
        self.expect_json = true;
        self
    }
}

/// Trait for generative text backends
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send one request and return the raw answer text of the first candidate
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerativeError>;
}

// Wire types for the generateContent call

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
}

impl WireResponse {
    /// First candidate's first non-empty text part, if any.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
    }
}

/// HTTP client for the generative backend
#[derive(Clone)]
pub struct HttpGenerativeBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpGenerativeBackend {
    /// Create a backend client with an explicit API key
    ///
    /// The base URL and model are resolved from `GENERATIVE_BASE_URL` and
    /// `GENERATIVE_MODEL`, with hosted defaults.
    pub fn new(api_key: &str) -> Self {
        let base_url = env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            client: Client::builder()
                .timeout(GENERATE_TIMEOUT)
                .build()
                .expect("default HTTP client construction"),
            base_url,
            model,
            api_key: api_key.to_string(),
        }
    }

    /// Create a backend client from `GENERATIVE_API_KEY`
    pub fn from_env() -> Result<Self, GenerativeError> {
        let api_key = env::var(ENV_API_KEY).map_err(|_| GenerativeError::NotConfigured)?;
        Ok(Self::new(&api_key))
    }

    fn to_wire(request: &GenerateRequest) -> WireRequest {
        WireRequest {
            contents: request
                .parts
                .iter()
                .map(|p| WireContent {
                    role: Some(p.role.clone()),
                    parts: vec![WirePart {
                        text: Some(p.text.clone()),
                    }],
                })
                .collect(),
            generation_config: WireGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                response_mime_type: request.expect_json.then_some(JSON_MIME_TYPE),
            },
        }
    }
}

#[async_trait]
impl GenerativeBackend for HttpGenerativeBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerativeError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let start_time = std::time::Instant::now();
        tracing::debug!(model = %self.model, parts = request.parts.len(), "Initiating generative backend call");

        let response = self
            .client
            .post(&url)
            .json(&Self::to_wire(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                model = %self.model,
                status = status.as_u16(),
                "Generative backend call failed"
            );
            return Err(GenerativeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResponse = response.json().await?;

        let answer = wire.first_text().ok_or(GenerativeError::EmptyAnswer)?;

        tracing::info!(
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis(),
            answer_length = answer.len(),
            "Generative backend call completed"
        );

        Ok(answer)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Scripted backends for exercising the pipeline without network access.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{GenerateRequest, GenerativeBackend, GenerativeError};

    /// Backend that always answers with a fixed string, counts calls, and
    /// records the last prompt it was sent.
    pub(crate) struct ScriptedBackend {
        answer: String,
        delay: Option<Duration>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                delay: None,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        /// Hold each call open for `delay` so tests can overlap requests.
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_prompt(&self) -> Option<String> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        async fn generate(&self, request: GenerateRequest) -> Result<String, GenerativeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() =
                request.parts.first().map(|p| p.text.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.answer.clone())
        }
    }

    /// Backend that fails every call.
    pub(crate) struct FailingBackend;

    #[async_trait]
    impl GenerativeBackend for FailingBackend {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, GenerativeError> {
            Err(GenerativeError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_reads_first_candidate() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "first answer"}]}},
                {"content": {"role": "model", "parts": [{"text": "second answer"}]}}
            ]
        }"#;
        let wire: WireResponse = serde_json::from_str(json).unwrap();
        assert_eq!(wire.first_text().unwrap(), "first answer");
    }

    #[test]
    fn test_first_text_none_for_empty_candidates() {
        let wire: WireResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(wire.first_text().is_none());

        let wire: WireResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert!(wire.first_text().is_none());

        let wire: WireResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": " "}]}}]}"#)
                .unwrap();
        assert!(wire.first_text().is_none());
    }

    #[test]
    fn test_wire_request_shape() {
        let request = GenerateRequest::user_text("hello")
            .with_temperature(0.2)
            .with_max_output_tokens(128)
            .expecting_json();

        let wire = HttpGenerativeBackend::to_wire(&request);
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 128);
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_wire_request_omits_mime_type_without_json_directive() {
        let request = GenerateRequest::user_text("hello");
        let wire = HttpGenerativeBackend::to_wire(&request);
        let value = serde_json::to_value(&wire).unwrap();
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[tokio::test]
    #[ignore] // Requires network access and GENERATIVE_API_KEY
    async fn test_generate_live() {
        let backend = HttpGenerativeBackend::from_env().unwrap();
        let answer = backend
            .generate(GenerateRequest::user_text("Reply with the word pong"))
            .await
            .unwrap();
        assert!(!answer.is_empty());
    }
}
