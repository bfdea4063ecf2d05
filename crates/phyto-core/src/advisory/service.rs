//! Advisory service contract.

use super::request::AdvisoryRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Reply used whenever the language-model service cannot produce advice.
pub const ADVISORY_FALLBACK: &str = "I'm currently unable to generate a response. Please ensure Ollama is running with 'ollama serve' and try again.";

/// Where a piece of advice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    /// Generated by the language model.
    Model,
    /// The fixed fallback text.
    Fallback,
}

/// A success-shaped advisory reply: either real advice or the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
}

impl Advice {
    pub fn from_model(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AdviceSource::Model,
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: ADVISORY_FALLBACK.to_string(),
            source: AdviceSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == AdviceSource::Fallback
    }
}

/// Why the language-model service could not answer.
///
/// These never leave an [`AdvisoryService`]; they exist so implementations
/// can log a precise cause before substituting the fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("language model service unreachable: {0}")]
    Unreachable(String),

    #[error("language model service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("language model call exceeded {}s", .budget.as_secs())]
    Timeout { budget: Duration },

    #[error("language model response could not be decoded: {0}")]
    Decode(String),

    #[error("language model returned an empty response")]
    EmptyResponse,
}

/// Answers treatment questions about a diagnosis.
///
/// The signature is infallible on purpose: callers always receive a reply,
/// and implementations absorb every failure into [`Advice::fallback`].
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn advise(&self, request: &AdvisoryRequest) -> Advice;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_mentions_inference_service() {
        let advice = Advice::fallback();
        assert!(advice.is_fallback());
        assert!(advice.text.contains("ollama serve"));
    }

    #[test]
    fn test_model_advice_is_not_fallback() {
        assert!(!Advice::from_model("Remove infected leaves").is_fallback());
    }
}
