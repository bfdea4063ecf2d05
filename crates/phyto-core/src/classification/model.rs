//! Classification data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest image payload accepted by the gateway (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Raw image bytes as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    /// MIME type declared by the client, if any.
    pub mime_type: Option<String>,
    /// Original file name, if any. Only used for logging and previews.
    pub file_name: Option<String>,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Declared MIME type, falling back to `image/jpeg`.
    pub fn mime_or_default(&self) -> &str {
        self.mime_type.as_deref().unwrap_or("image/jpeg")
    }
}

/// A confidence percentage, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Returns `None` for values that are not finite or fall outside `[0, 100]`.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (Self::MIN..=Self::MAX).contains(&value)).then_some(Self(value))
    }

    /// Clamps untrusted input into range. NaN maps to zero.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self(Self::MIN)
        } else {
            Self(value.clamp(Self::MIN, Self::MAX))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whole-percent value as shown to users.
    pub fn rounded(self) -> u8 {
        self.0.round() as u8
    }

    pub fn tier(self) -> ConfidenceTier {
        ConfidenceTier::from_percent(self.0)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("confidence {value} is outside [0, 100]"))
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display bucket for a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 90.0 {
            Self::High
        } else if percent >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Confidence",
            Self::Medium => "Medium Confidence",
            Self::Low => "Low Confidence",
        }
    }
}

/// One ranked label reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: Confidence,
}

/// The outcome of a successful classification.
///
/// Fields are private so a result cannot change after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    label: String,
    confidence: Confidence,
    generated_at: DateTime<Utc>,
    alternatives: Vec<Prediction>,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            label: label.into(),
            confidence,
            generated_at: Utc::now(),
            alternatives: Vec::new(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<Prediction>) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Runner-up predictions, highest first. Empty when the engine did not report them.
    pub fn alternatives(&self) -> &[Prediction] {
        &self.alternatives
    }
}
