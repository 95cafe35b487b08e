use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete emotion reported by the classifier.
///
/// Known labels use the lowercase names `happy`, `sad`, `angry`, `neutral`,
/// `surprise`, `fear` and `disgust`. Anything else is carried verbatim in
/// [`EmotionLabel::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Neutral,
    Surprise,
    Fear,
    Disgust,
    Other(String),
}

/// The fixed set of labels the mood lexicon knows about.
pub const KNOWN_LABELS: [EmotionLabel; 7] = [
    EmotionLabel::Happy,
    EmotionLabel::Sad,
    EmotionLabel::Angry,
    EmotionLabel::Neutral,
    EmotionLabel::Surprise,
    EmotionLabel::Fear,
    EmotionLabel::Disgust,
];

impl EmotionLabel {
    /// Parse a label by case-sensitive exact match. Never fails.
    pub fn parse(text: &str) -> Self {
        match text {
            "happy" => Self::Happy,
            "sad" => Self::Sad,
            "angry" => Self::Angry,
            "neutral" => Self::Neutral,
            "surprise" => Self::Surprise,
            "fear" => Self::Fear,
            "disgust" => Self::Disgust,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Neutral => "neutral",
            Self::Surprise => "surprise",
            Self::Fear => "fear",
            Self::Disgust => "disgust",
            Self::Other(text) => text,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EmotionLabel {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<EmotionLabel> for String {
    fn from(label: EmotionLabel) -> Self {
        match label {
            EmotionLabel::Other(text) => text,
            known => known.as_str().to_string(),
        }
    }
}

/// Per-label probabilities in model output order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionScores {
    entries: Vec<(EmotionLabel, f32)>,
}

impl EmotionScores {
    pub fn new(entries: Vec<(EmotionLabel, f32)>) -> Self {
        Self { entries }
    }

    /// The highest-probability label. Ties resolve to the earliest entry;
    /// NaN scores are never selected.
    pub fn dominant(&self) -> Option<&EmotionLabel> {
        let mut best: Option<(&EmotionLabel, f32)> = None;
        for (label, score) in &self.entries {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if *score <= best_score => {}
                _ => best = Some((label, *score)),
            }
        }
        best.map(|(label, _)| label)
    }
}
