use crate::classification::Confidence;
use serde::{Deserialize, Serialize};

/// One chat turn's worth of input for the advisory service.
///
/// Built fresh for every turn and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    /// The user's question, verbatim.
    pub question: String,
    /// Diagnosis label the conversation is about.
    pub diagnosis: String,
    pub confidence: Confidence,
}

impl AdvisoryRequest {
    pub fn new(
        question: impl Into<String>,
        diagnosis: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            question: question.into(),
            diagnosis: diagnosis.into(),
            confidence,
        }
    }
}
