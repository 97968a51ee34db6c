//! The closed set of emotion tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MoodlogError;

/// Dominant sentiment of a piece of text.
///
/// Stored and serialized by its lowercase tag (`"happy"`, `"tired"`, ...).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Peaceful,
    Excited,
    Tired,
}

impl Emotion {
    /// Number of tags.
    pub const COUNT: usize = 7;

    /// Every tag, in declaration order.
    pub const ALL: [Emotion; Self::COUNT] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Peaceful,
        Emotion::Excited,
        Emotion::Tired,
    ];

    /// Stable lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Peaceful => "peaceful",
            Self::Excited => "excited",
            Self::Tired => "tired",
        }
    }

    /// Position in [`Emotion::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = MoodlogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|emotion| emotion.as_str() == normalized)
            .ok_or_else(|| {
                MoodlogError::InvalidInput(format!(
                    "Unknown emotion \"{}\" (expected one of: {})",
                    value,
                    Self::ALL
                        .iter()
                        .map(|e| e.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}
