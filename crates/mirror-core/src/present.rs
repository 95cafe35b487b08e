//! Presentation events emitted by a capture run.
//!
//! The pipeline never renders anything itself; it emits [`UiEvent`]s to a
//! [`Presenter`]. Front ends either stream them (terminal) or collect them
//! in a [`Transcript`] and render the whole run at once (web page).

use crate::emotion::EmotionLabel;
use crate::lexicon::MoodEntry;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    Info { text: String },
    Status { text: String },
    Success { text: String },
    Image { path: PathBuf, caption: String },
    /// `label` is the uppercased display form of the detected emotion.
    Mood { emoji: String, label: String, message: String },
    Error { text: String },
}

impl UiEvent {
    pub fn info(text: impl Into<String>) -> Self {
        Self::Info { text: text.into() }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::Status { text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::Success { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error { text: text.into() }
    }

    pub fn mood(label: &EmotionLabel, entry: MoodEntry) -> Self {
        Self::Mood {
            emoji: entry.emoji.to_string(),
            label: label.as_str().to_uppercase(),
            message: entry.message.to_string(),
        }
    }
}

/// Sink for presentation events.
pub trait Presenter {
    fn emit(&mut self, event: UiEvent);
}

/// Presenter that records every event of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    pub events: Vec<UiEvent>,
}

impl Transcript {
    /// True if the run ended in the error boundary.
    pub fn failed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, UiEvent::Error { .. }))
    }

    /// The mood event of a successful run.
    pub fn mood(&self) -> Option<&UiEvent> {
        self.events
            .iter()
            .find(|e| matches!(e, UiEvent::Mood { .. }))
    }
}

impl Presenter for Transcript {
    fn emit(&mut self, event: UiEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon;

    #[test]
    fn test_mood_event_uppercases_label() {
        let label = EmotionLabel::parse("ecstatic");
        let event = UiEvent::mood(&label, lexicon::lookup(label.as_str()));
        assert_eq!(
            event,
            UiEvent::Mood {
                emoji: "✨".into(),
                label: "ECSTATIC".into(),
                message: "Be your best self today! 💫".into(),
            }
        );
    }

    #[test]
    fn test_transcript_failed() {
        let mut t = Transcript::default();
        t.emit(UiEvent::info("hello"));
        assert!(!t.failed());
        t.emit(UiEvent::error("❌ Error: boom"));
        assert!(t.failed());
        assert!(t.mood().is_none());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(UiEvent::status("⏳ Capturing in 3...")).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(json["text"], "⏳ Capturing in 3...");
    }
}
