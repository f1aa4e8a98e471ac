//! Ramp-up scoring.
//!
//! Turns README text into a `[0, 1]` score by asking a [`CompletionBackend`]
//! to grade it against a fixed rubric. The contract is fail-to-zero: an empty
//! document scores `0.0` without touching the backend, and any backend or
//! parse failure scores `0.0` with a [`ScoreOutcome::Failure`] reason.
//!
//! The backend is treated as an untrusted text source. Its reply must be a
//! JSON object whose `ramp_up_score` is a number; anything else fails.
//! Numbers outside `[0, 1]` are clamped.

use std::sync::Arc;
use std::time::Instant;

use crate::error::RampUpError;
use crate::llm::{ChatMessage, CompletionBackend, CompletionRequest};
use crate::models::{clamp_unit, ScoreResult};

const SYSTEM_PROMPT: &str = "You evaluate software documentation. \
You answer with a single JSON object and nothing else.";

// Repeated scoring of one document must agree.
const TEMPERATURE: f64 = 0.0;

pub struct RampUpScorer {
    backend: Arc<dyn CompletionBackend>,
}

impl RampUpScorer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Build the request for one document.
    pub fn build_request(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.backend.model_name().to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(text)),
            ],
            temperature: TEMPERATURE,
        }
    }

    /// Score a document. Never fails; see the module docs for the fallbacks.
    pub async fn score_text(&self, text: &str) -> ScoreResult {
        let start = Instant::now();

        if text.trim().is_empty() {
            return ScoreResult::empty(elapsed_millis(start));
        }

        let request = self.build_request(text);
        let result = match self.backend.complete(&request).await {
            Ok(reply) => parse_score(&reply),
            Err(e) => Err(e),
        };

        match result {
            Ok(score) => ScoreResult::success(score, elapsed_millis(start)),
            Err(e) => {
                tracing::warn!(model = %self.backend.model_name(), error = %e, "ramp-up scoring failed");
                ScoreResult::failure(e.to_string(), elapsed_millis(start))
            }
        }
    }
}

/// The rubric prompt, with the document embedded verbatim.
pub fn build_prompt(text: &str) -> String {
    format!(
        "The following text is the README of a software package.\n\
         Judge how easy it would be for a new developer to get started with \
         the package using only this documentation: installation steps, usage \
         examples, configuration, and where to get help.\n\
         Score on a continuous scale from 0.0 (no usable onboarding guidance) \
         to 1.0 (excellent, complete onboarding documentation).\n\
         Respond with only a JSON object of the form {{\"ramp_up_score\": <number between 0 and 1>}}.\n\
         \n\
         README:\n\
         {}",
        text
    )
}

/// Parse the backend's reply into a clamped score.
///
/// Accepts the bare JSON object, optionally wrapped in a markdown code fence.
pub fn parse_score(reply: &str) -> Result<f64, RampUpError> {
    let body = strip_code_fence(reply.trim());
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| RampUpError::BackendResponse(format!("reply is not JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| RampUpError::BackendResponse("reply is not a JSON object".into()))?;

    let score = object
        .get("ramp_up_score")
        .ok_or_else(|| RampUpError::BackendResponse("reply has no ramp_up_score".into()))?
        .as_f64()
        .ok_or_else(|| RampUpError::BackendResponse("ramp_up_score is not a number".into()))?;

    Ok(clamp_unit(score))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn elapsed_millis(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
