//! Mood lexicon — static emotion label → (emoji, message) table.

use serde::Serialize;

/// Display glyph and motivational line shown for a detected emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoodEntry {
    pub emoji: &'static str,
    pub message: &'static str,
}

/// Entry returned for any label outside the table.
pub const DEFAULT_ENTRY: MoodEntry = MoodEntry {
    emoji: "✨",
    message: "Be your best self today! 💫",
};

static TABLE: [(&str, MoodEntry); 7] = [
    (
        "happy",
        MoodEntry {
            emoji: "😄",
            message: "Cheer up! You're glowing! 🌟",
        },
    ),
    (
        "sad",
        MoodEntry {
            emoji: "😢",
            message: "Hey, everything will be okay 💖",
        },
    ),
    (
        "angry",
        MoodEntry {
            emoji: "😠",
            message: "Breathe. You've got this! 💪",
        },
    ),
    (
        "neutral",
        MoodEntry {
            emoji: "😐",
            message: "Stay calm and centered. \u{1F9D8}\u{200D}\u{2640}\u{FE0F}",
        },
    ),
    (
        "surprise",
        MoodEntry {
            emoji: "😮",
            message: "Wow! What happened?! 🎉",
        },
    ),
    (
        "fear",
        MoodEntry {
            emoji: "😨",
            message: "Fear is temporary, power is permanent! ⚡",
        },
    ),
    (
        "disgust",
        MoodEntry {
            emoji: "🤢",
            message: "Shake it off! New vibe incoming 🚀",
        },
    ),
];

/// Look up the mood entry for a label (case-sensitive exact match).
///
/// Total over all inputs: unknown or empty labels get [`DEFAULT_ENTRY`].
pub fn lookup(label: &str) -> MoodEntry {
    TABLE
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, entry)| *entry)
        .unwrap_or(DEFAULT_ENTRY)
}

/// All known (label, entry) pairs in table order.
pub fn entries() -> &'static [(&'static str, MoodEntry)] {
    &TABLE
}
