//! Keyword-based emotion classification.
//!
//! Text is scanned against [`KEYWORDS`] in declaration order. Each keyword
//! that occurs anywhere in the text (plain, case-sensitive substring match)
//! adds one point to its emotion. The winner is the first emotion to reach
//! the running maximum: the leader only changes on a strict increase, so a
//! tie goes to whichever emotion got there first in table order.
//!
//! Presence is counted, not occurrences: "좋아 좋아" scores one point.

use crate::emotion::Emotion;

/// Keyword table. Order is significant for tie-breaking.
pub static KEYWORDS: &[(&str, Emotion)] = &[
    ("좋아", Emotion::Happy),
    ("기뻐", Emotion::Happy),
    ("행복", Emotion::Happy),
    ("최고", Emotion::Happy),
    ("웃음", Emotion::Happy),
    ("슬퍼", Emotion::Sad),
    ("울어", Emotion::Sad),
    ("우울", Emotion::Sad),
    ("힘들어", Emotion::Sad),
    ("속상", Emotion::Sad),
    ("화나", Emotion::Angry),
    ("짜증", Emotion::Angry),
    ("열받", Emotion::Angry),
    ("분해", Emotion::Angry),
    ("편안", Emotion::Peaceful),
    ("조용", Emotion::Peaceful),
    ("포근", Emotion::Peaceful),
    ("안정", Emotion::Peaceful),
    ("기대", Emotion::Excited),
    ("설레", Emotion::Excited),
    ("즐거", Emotion::Excited),
    ("대박", Emotion::Excited),
    ("졸려", Emotion::Tired),
    ("피곤", Emotion::Tired),
    ("지쳐", Emotion::Tired),
    ("나른", Emotion::Tired),
];

/// Per-emotion keyword hit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores([u32; Emotion::COUNT]);

impl Scores {
    /// Score for a single emotion.
    pub fn get(&self, emotion: Emotion) -> u32 {
        self.0[emotion.index()]
    }

    /// Sum of all scores (number of keyword hits).
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Iterate `(emotion, score)` in [`Emotion::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, u32)> + '_ {
        Emotion::ALL
            .into_iter()
            .map(move |emotion| (emotion, self.get(emotion)))
    }

    fn bump(&mut self, emotion: Emotion) -> u32 {
        let slot = &mut self.0[emotion.index()];
        *slot += 1;
        *slot
    }
}

/// Outcome of scoring a text: the winning emotion plus the full breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub emotion: Emotion,
    pub scores: Scores,
}

/// Classify text into a single emotion.
///
/// Never fails. Empty or whitespace-only text, and text with no keyword,
/// yield [`Emotion::Neutral`].
///
/// # Examples
///
/// ```
/// use moodlog_core::{classify, Emotion};
///
/// assert_eq!(classify("오늘 정말 좋아"), Emotion::Happy);
/// assert_eq!(classify("   "), Emotion::Neutral);
/// ```
pub fn classify(text: &str) -> Emotion {
    score(text).emotion
}

/// Classify text and keep the per-emotion scores.
pub fn score(text: &str) -> Classification {
    score_with(KEYWORDS, text)
}

/// Score text against an arbitrary keyword table.
pub fn score_with(table: &[(&str, Emotion)], text: &str) -> Classification {
    let mut scores = Scores::default();
    if text.trim().is_empty() {
        return Classification {
            emotion: Emotion::Neutral,
            scores,
        };
    }

    let mut leader = Emotion::Neutral;
    let mut max = 0;
    for &(keyword, emotion) in table {
        if !text.contains(keyword) {
            continue;
        }
        let current = scores.bump(emotion);
        if current > max {
            max = current;
            leader = emotion;
        }
    }

    Classification {
        emotion: leader,
        scores,
    }
}
