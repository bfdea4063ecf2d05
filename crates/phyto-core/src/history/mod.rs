//! Client-side classification history.
//!
//! The history lives only as long as the client session. Entries are
//! prepended on success and removed by id; nothing else mutates them.

use crate::classification::{ClassificationResult, Confidence, ConfidenceTier, ImagePayload};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Preview used for entries that have no captured image.
pub const PLACEHOLDER_PREVIEW: &str = "/api/placeholder/150/150";

/// Reference to a locally captured preview image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePreview(String);

impl ImagePreview {
    /// Encodes the image as a `data:` URL.
    pub fn from_image(image: &ImagePayload) -> Self {
        Self(format!(
            "data:{};base64,{}",
            image.mime_or_default(),
            BASE64_STANDARD.encode(&image.bytes)
        ))
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_PREVIEW.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_PREVIEW
    }
}

/// One analyzed image as the client remembers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Locally assigned identifier.
    pub id: String,
    pub preview: ImagePreview,
    pub label: String,
    /// Whole-percent confidence, as displayed and as sent with chat turns.
    pub confidence: u8,
    /// Confidence exactly as reported by the gateway.
    pub precise_confidence: Confidence,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_result(result: &ClassificationResult, preview: ImagePreview) -> Self {
        Self::new(result.label(), result.confidence(), preview)
    }

    pub fn new(label: impl Into<String>, confidence: Confidence, preview: ImagePreview) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            preview,
            label: label.into(),
            confidence: confidence.rounded(),
            precise_confidence: confidence,
            recorded_at: Utc::now(),
        }
    }

    /// Overrides the recording time; used for seeded entries.
    pub fn recorded_on(mut self, date: NaiveDate) -> Self {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            self.recorded_at = midnight.and_utc();
        }
        self
    }

    /// Rounded confidence as a [`Confidence`] value.
    pub fn display_confidence(&self) -> Confidence {
        Confidence::saturating(f64::from(self.confidence))
    }

    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_percent(f64::from(self.confidence))
    }

    /// Calendar date of the entry (`YYYY-MM-DD`).
    pub fn date(&self) -> String {
        self.recorded_at.format("%Y-%m-%d").to_string()
    }
}

/// Most-recent-first list of classifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationHistory {
    entries: Vec<HistoryEntry>,
}

impl ClassificationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two illustrative entries, matching what a fresh dashboard shows.
    pub fn demo() -> Self {
        let mut history = Self::new();
        let seeds = [
            ("Apple Scab", 87.6, NaiveDate::from_ymd_opt(2024, 1, 14)),
            ("Tomato Late Blight", 94.2, NaiveDate::from_ymd_opt(2024, 1, 15)),
        ];
        for (label, confidence, date) in seeds {
            let mut entry =
                HistoryEntry::new(label, Confidence::saturating(confidence), ImagePreview::placeholder());
            if let Some(date) = date {
                entry = entry.recorded_on(date);
            }
            history.prepend(entry);
        }
        history
    }

    /// Inserts an entry at the front and returns a reference to it.
    pub fn prepend(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    /// Removes the entry with the given id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, confidence: f64) -> HistoryEntry {
        HistoryEntry::new(
            label,
            Confidence::new(confidence).unwrap(),
            ImagePreview::placeholder(),
        )
    }

    #[test]
    fn test_prepend_keeps_most_recent_first() {
        let mut history = ClassificationHistory::new();
        history.prepend(entry("Apple Scab", 87.6));
        history.prepend(entry("Tomato Late Blight", 94.2));

        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].label, "Tomato Late Blight");
        assert_eq!(history.entries()[0].confidence, 94);
        assert_eq!(history.entries()[1].confidence, 88);
    }

    #[test]
    fn test_duplicate_labels_allowed() {
        let mut history = ClassificationHistory::new();
        history.prepend(entry("Apple Scab", 80.0));
        history.prepend(entry("Apple Scab", 81.0));
        assert_eq!(history.len(), 2);
        assert_ne!(history.entries()[0].id, history.entries()[1].id);
    }

    #[test]
    fn test_remove_by_id() {
        let mut history = ClassificationHistory::new();
        let keep = history.prepend(entry("Keep", 50.0)).id.clone();
        let drop = history.prepend(entry("Drop", 50.0)).id.clone();

        let removed = history.remove(&drop).unwrap();
        assert_eq!(removed.label, "Drop");
        assert!(history.get(&drop).is_none());
        assert!(history.get(&keep).is_some());
        assert!(history.remove("missing").is_none());
    }

    #[test]
    fn test_precise_confidence_is_retained() {
        let e = entry("Tomato Late Blight", 94.2);
        assert_eq!(e.confidence, 94);
        assert_eq!(e.precise_confidence.value(), 94.2);
        assert_eq!(e.tier(), ConfidenceTier::High);
        assert_eq!(e.display_confidence().value(), 94.0);
    }

    #[test]
    fn test_preview_data_url() {
        let image = ImagePayload::new(vec![0xff, 0xd8, 0xff], Some("image/jpeg".into()));
        let preview = ImagePreview::from_image(&image);
        assert_eq!(preview.as_str(), "data:image/jpeg;base64,/9j/");
        assert!(!preview.is_placeholder());
    }

    #[test]
    fn test_demo_history() {
        let history = ClassificationHistory::demo();
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].label, "Tomato Late Blight");
        assert_eq!(history.entries()[0].date(), "2024-01-15");
        assert_eq!(history.entries()[1].label, "Apple Scab");
    }
}
