//! Presentation style for each emotion.
//!
//! The lookup is an exhaustive `match`, so every [`Emotion`] has exactly one
//! style and a new variant will not compile until it gets one.

use serde::Serialize;

use crate::color::Hsla;
use crate::emotion::Emotion;
use crate::error::Result;

/// Music recommendation attached to a style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Music {
    pub title: &'static str,
    pub artist: &'static str,
}

/// How an emotion is presented: label, colors, and a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmotionStyle {
    /// Display label
    pub name: &'static str,
    /// Foreground color, CSS `hsla(...)`
    pub color: &'static str,
    /// Background color, CSS `hsla(...)`
    pub bg_color: &'static str,
    pub music: Music,
}

impl EmotionStyle {
    /// Parsed foreground color.
    pub fn foreground(&self) -> Result<Hsla> {
        self.color.parse()
    }

    /// Parsed background color.
    pub fn background(&self) -> Result<Hsla> {
        self.bg_color.parse()
    }
}

static NEUTRAL: EmotionStyle = EmotionStyle {
    name: "평온함",
    color: "hsla(0, 0%, 100%, 0.8)",
    bg_color: "hsla(0, 0%, 7%, 1)",
    music: Music {
        title: "Weightless",
        artist: "Marconi Union",
    },
};

static HAPPY: EmotionStyle = EmotionStyle {
    name: "행복",
    color: "hsla(45, 100%, 70%, 0.8)",
    bg_color: "hsla(45, 100%, 10%, 1)",
    music: Music {
        title: "Happy",
        artist: "Pharrell Williams",
    },
};

static SAD: EmotionStyle = EmotionStyle {
    name: "슬픔",
    color: "hsla(210, 100%, 70%, 0.8)",
    bg_color: "hsla(210, 100%, 10%, 1)",
    music: Music {
        title: "Someone Like You",
        artist: "Adele",
    },
};

static ANGRY: EmotionStyle = EmotionStyle {
    name: "분노",
    color: "hsla(0, 100%, 70%, 0.8)",
    bg_color: "hsla(0, 100%, 10%, 1)",
    music: Music {
        title: "In the End",
        artist: "Linkin Park",
    },
};

static PEACEFUL: EmotionStyle = EmotionStyle {
    name: "평화",
    color: "hsla(150, 100%, 70%, 0.8)",
    bg_color: "hsla(150, 100%, 10%, 1)",
    music: Music {
        title: "River Flows in You",
        artist: "Yiruma",
    },
};

static EXCITED: EmotionStyle = EmotionStyle {
    name: "신남",
    color: "hsla(280, 100%, 70%, 0.8)",
    bg_color: "hsla(280, 100%, 10%, 1)",
    music: Music {
        title: "Can't Stop the Feeling!",
        artist: "Justin Timberlake",
    },
};

static TIRED: EmotionStyle = EmotionStyle {
    name: "피곤",
    color: "hsla(20, 20%, 60%, 0.8)",
    bg_color: "hsla(20, 10%, 15%, 1)",
    music: Music {
        title: "Coffee",
        artist: "Beabadoobee",
    },
};

/// Style for an emotion. Total over [`Emotion`].
pub fn style_for(emotion: Emotion) -> &'static EmotionStyle {
    match emotion {
        Emotion::Neutral => &NEUTRAL,
        Emotion::Happy => &HAPPY,
        Emotion::Sad => &SAD,
        Emotion::Angry => &ANGRY,
        Emotion::Peaceful => &PEACEFUL,
        Emotion::Excited => &EXCITED,
        Emotion::Tired => &TIRED,
    }
}

/// Style shown before any text has been entered.
pub fn default_style() -> &'static EmotionStyle {
    style_for(Emotion::Neutral)
}
