//! JSON bodies exchanged between the dashboard client and the gateway.
//!
//! Field names follow the public HTTP contract, so they differ from the
//! domain types (`disease` rather than `diagnosis`, `prediction` rather than
//! `label`).

use crate::advisory::AdvisoryRequest;
use crate::classification::{ClassificationResult, Confidence, Prediction};
use serde::{Deserialize, Serialize};

/// `POST /classify` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub prediction: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Prediction>,
}

impl From<&ClassificationResult> for ClassifyResponse {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            prediction: result.label().to_string(),
            confidence: result.confidence().value(),
            alternatives: result.alternatives().to_vec(),
        }
    }
}

/// Failure body for any non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `POST /chat` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub disease: String,
    pub confidence: f64,
}

impl ChatRequest {
    /// Converts to an advisory request, clamping the confidence into range.
    pub fn into_advisory(self) -> AdvisoryRequest {
        AdvisoryRequest::new(
            self.message,
            self.disease,
            Confidence::saturating(self.confidence),
        )
    }
}

impl From<&AdvisoryRequest> for ChatRequest {
    fn from(request: &AdvisoryRequest) -> Self {
        Self {
            message: request.question.clone(),
            disease: request.diagnosis.clone(),
            confidence: request.confidence.value(),
        }
    }
}

/// `POST /chat` response body. The server always fills `response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
}
