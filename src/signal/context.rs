//! Generated background-context signal
//!
//! The one source that itself calls the generative text backend: a small,
//! independent request for historical and geographic background facts about
//! the crisis. This call is separate from the final prediction call and its
//! failure never blocks the pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SignalError, SignalKind, SignalSource};
use crate::model::Crisis;
use crate::service::generative::{GenerateRequest, GenerativeBackend};
use crate::service::prompts::build_context_prompt;

/// Generation parameters for the background call: factual, short
const CONTEXT_TEMPERATURE: f32 = 0.4;
const CONTEXT_MAX_OUTPUT_TOKENS: u32 = 512;

/// Background-context source backed by a secondary generative call
pub struct AdditionalContextSource {
    backend: Arc<dyn GenerativeBackend>,
}

impl AdditionalContextSource {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SignalSource for AdditionalContextSource {
    fn kind(&self) -> SignalKind {
        SignalKind::AdditionalContext
    }

    fn applicable(&self, _crisis: &Crisis) -> bool {
        true
    }

    async fn fetch(&self, crisis: &Crisis) -> Result<String, SignalError> {
        let prompt = build_context_prompt(crisis);

        tracing::debug!(crisis = %crisis.id, "Requesting background context from generative backend");

        let request = GenerateRequest::user_text(prompt)
            .with_temperature(CONTEXT_TEMPERATURE)
            .with_max_output_tokens(CONTEXT_MAX_OUTPUT_TOKENS);

        let answer = self
            .backend
            .generate(request)
            .await
            .map_err(|e| SignalError::Backend(e.to_string()))?;

        if answer.trim().is_empty() {
            return Err(SignalError::EmptyBody);
        }
        Ok(answer)
    }
}
