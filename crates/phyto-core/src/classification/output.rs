//! Parsing of the classification engine's stdout.
//!
//! The engine prints exactly one JSON object. A successful record looks like
//! `{"prediction": "...", "confidence": 94.2, "all_predictions": {...}}`; an
//! engine that caught its own failure prints `{"error": "..."}` instead.

use super::error::ClassificationError;
use super::model::{ClassificationResult, Confidence, Prediction};
use serde::Deserialize;
use std::collections::HashMap;

/// Number of runner-up predictions kept from `all_predictions`.
const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Deserialize)]
struct EngineRecord {
    prediction: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    all_predictions: HashMap<String, f64>,
    error: Option<String>,
}

/// Parses the engine's primary output into a [`ClassificationResult`].
///
/// Anything other than a single JSON object (empty output, surrounding prose,
/// several records, missing fields, out-of-range confidence) fails with
/// [`ClassificationError::MalformedOutput`] carrying the raw text.
pub fn parse_engine_output(stdout: &str) -> Result<ClassificationResult, ClassificationError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(ClassificationError::malformed("empty output", stdout));
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| ClassificationError::malformed(e.to_string(), stdout))?;
    if !value.is_object() {
        return Err(ClassificationError::malformed(
            "expected a JSON object",
            stdout,
        ));
    }

    let record: EngineRecord = serde_json::from_value(value)
        .map_err(|e| ClassificationError::malformed(e.to_string(), stdout))?;

    if let Some(message) = record.error {
        return Err(ClassificationError::engine_failure(Some(0), message));
    }

    let label = record
        .prediction
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ClassificationError::malformed("missing prediction", stdout))?;

    let raw_confidence = record
        .confidence
        .ok_or_else(|| ClassificationError::malformed("missing confidence", stdout))?;
    let confidence = Confidence::new(raw_confidence).ok_or_else(|| {
        ClassificationError::malformed(
            format!("confidence {raw_confidence} is outside [0, 100]"),
            stdout,
        )
    })?;

    let alternatives = rank_alternatives(&label, record.all_predictions);

    Ok(ClassificationResult::new(label, confidence).with_alternatives(alternatives))
}

fn rank_alternatives(winner: &str, all: HashMap<String, f64>) -> Vec<Prediction> {
    let mut ranked: Vec<Prediction> = all
        .into_iter()
        .filter(|(label, _)| label != winner)
        .filter_map(|(label, score)| {
            Confidence::new(score).map(|confidence| Prediction { label, confidence })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.truncate(MAX_ALTERNATIVES);
    ranked
}
