//! Prediction client: final model call and defensive decoding
//!
//! Sends the rendered prompt to the generative backend, extracts the answer
//! text, decodes it as a [`CrisisPrediction`], and normalizes the result.
//! The model is untrusted: its `id` and `timestamp` are always replaced with
//! known-correct values, and malformed polygon entries are dropped rather
//! than failing the decode.
//!
//! This client performs no retries. The model call is expensive and not
//! safe to blindly repeat; re-triggering is the caller's decision.

use std::sync::Arc;

use chrono::Utc;

use crate::model::{Crisis, CrisisPrediction};
use crate::service::generative::{GenerateRequest, GenerativeBackend, GenerativeError};

/// Generation parameters for the prediction call: structured, bounded output
const PREDICTION_TEMPERATURE: f32 = 0.3;
const PREDICTION_MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Generative backend failed: {0}")]
    Backend(#[from] GenerativeError),

    #[error("Model answer did not match the prediction schema: {0}")]
    Decode(String),
}

/// Client for requesting structured predictions from the generative backend
pub struct PredictionClient {
    backend: Arc<dyn GenerativeBackend>,
}

impl PredictionClient {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Request a prediction for `crisis` using the already-rendered prompt.
    ///
    /// On success the returned prediction's `id` equals `crisis.id` and its
    /// `timestamp` is the decode time, whatever the model answered.
    pub async fn predict(
        &self,
        crisis: &Crisis,
        prompt: String,
    ) -> Result<CrisisPrediction, PredictionError> {
        let request = GenerateRequest::user_text(prompt)
            .with_temperature(PREDICTION_TEMPERATURE)
            .with_max_output_tokens(PREDICTION_MAX_OUTPUT_TOKENS)
            .expecting_json();

        let answer = self.backend.generate(request).await?;

        let document = extract_json_document(&answer);
        let decoded: CrisisPrediction = serde_json::from_str(document).map_err(|e| {
            tracing::error!(
                crisis = %crisis.id,
                error = %e,
                answer_length = answer.len(),
                "Model answer failed schema decode"
            );
            PredictionError::Decode(e.to_string())
        })?;

        let prediction = decoded.normalize(&crisis.id, Utc::now());

        tracing::info!(
            crisis = %crisis.id,
            heatmap_points = prediction.risk_heatmap_points.as_ref().map_or(0, Vec::len),
            polygons = prediction.predicted_spread_polygons.as_ref().map_or(0, Vec::len),
            "Prediction decoded"
        );

        Ok(prediction)
    }
}

/// Locate the JSON document inside a model answer.
///
/// Models directed to return JSON occasionally still wrap the document in
/// markdown code fences or lead-in prose; tolerate both by slicing from the
/// first `{` to the last `}` when present.
fn extract_json_document(answer: &str) -> &str {
    let trimmed = answer.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutil::sample_crisis;
    use crate::service::generative::testutil::{FailingBackend, ScriptedBackend};

    const WELL_FORMED_ANSWER: &str = r#"{
        "id": "ignored",
        "timestamp": "2000-01-01T00:00:00Z",
        "predictionNarrative": "test",
        "riskHeatmapPoints": [{"latitude": 10.1, "longitude": 20.1, "intensity": 0.8}]
    }"#;

    #[test]
    fn test_extract_json_document_plain() {
        assert_eq!(extract_json_document(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_document_fenced() {
        let answer = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_document(answer), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_document_with_prose() {
        let answer = "Here is the prediction:\n{\"a\": 1}\nHope this helps.";
        assert_eq!(extract_json_document(answer), r#"{"a": 1}"#);
    }

    #[tokio::test]
    async fn test_predict_normalizes_identity_fields() {
        let backend = Arc::new(ScriptedBackend::new(WELL_FORMED_ANSWER));
        let client = PredictionClient::new(backend);
        let crisis = sample_crisis("EQ-1", Some((10.0, 20.0)));

        let before = Utc::now();
        let prediction = client.predict(&crisis, "prompt".to_string()).await.unwrap();
        let after = Utc::now();

        assert_eq!(prediction.id, "EQ-1");
        assert!(prediction.timestamp >= before && prediction.timestamp <= after);

        let points = prediction.risk_heatmap_points.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].intensity, 0.8);
    }

    #[tokio::test]
    async fn test_predict_decodes_fenced_answer() {
        let fenced = format!("```json\n{}\n```", WELL_FORMED_ANSWER);
        let client = PredictionClient::new(Arc::new(ScriptedBackend::new(&fenced)));
        let crisis = sample_crisis("EQ-1", None);

        let prediction = client.predict(&crisis, "prompt".to_string()).await.unwrap();
        assert_eq!(prediction.prediction_narrative, "test");
    }

    #[tokio::test]
    async fn test_predict_surfaces_decode_failure() {
        let client = PredictionClient::new(Arc::new(ScriptedBackend::new("not json at all")));
        let crisis = sample_crisis("EQ-1", None);

        let result = client.predict(&crisis, "prompt".to_string()).await;
        assert!(matches!(result, Err(PredictionError::Decode(_))));
    }

    #[tokio::test]
    async fn test_predict_surfaces_backend_failure() {
        let client = PredictionClient::new(Arc::new(FailingBackend));
        let crisis = sample_crisis("EQ-1", None);

        let result = client.predict(&crisis, "prompt".to_string()).await;
        assert!(matches!(result, Err(PredictionError::Backend(_))));
    }
}
