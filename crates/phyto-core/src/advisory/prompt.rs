//! Treatment prompt construction.

use super::request::AdvisoryRequest;
use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every generation request.
///
/// Low temperature and a bounded output length: an advisory tool should
/// answer the same question the same way, and quickly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            num_predict: 300,
        }
    }
}

/// Builds the prompt for one advisory turn.
///
/// The output depends only on the request, so identical turns produce
/// identical prompts.
pub fn build_treatment_prompt(request: &AdvisoryRequest) -> String {
    format!(
        "You are an agricultural specialist and plant pathologist with expertise in plant disease treatment.\n\
         \n\
         DISEASE DIAGNOSIS: {diagnosis}\n\
         CONFIDENCE LEVEL: {confidence}%\n\
         USER QUESTION: {question}\n\
         \n\
         Provide specific, actionable treatment recommendations. Include:\n\
         - Immediate treatment steps\n\
         - Recommended products/methods\n\
         - Prevention strategies\n\
         - Expected timeline\n\
         \n\
         Be direct and practical. This is for agricultural/gardening purposes, not human health.",
        diagnosis = request.diagnosis.trim(),
        confidence = request.confidence,
        question = request.question.trim(),
    )
}
