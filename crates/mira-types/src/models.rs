use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Moments are journal entries stored as user messages carrying this marker.
pub const MOMENT_PREFIX: &str = "[Moment] ";

/// Color used when a mood label is not part of the palette.
pub const DEFAULT_MOOD_COLOR: &str = "#a855f7";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// The fixed set of moods a user can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Loved,
    Happy,
    Calm,
    Anxious,
    Tired,
    Sad,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Loved,
        Mood::Happy,
        Mood::Calm,
        Mood::Anxious,
        Mood::Tired,
        Mood::Sad,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Loved => "Loved",
            Self::Happy => "Happy",
            Self::Calm => "Calm",
            Self::Anxious => "Anxious",
            Self::Tired => "Tired",
            Self::Sad => "Sad",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Loved => "#fb7185",
            Self::Happy => "#f472b6",
            Self::Calm => "#c084fc",
            Self::Anxious => "#a855f7",
            Self::Tired => "#6366f1",
            Self::Sad => "#8b5cf6",
        }
    }

    /// Palette color for a stored label, falling back to the default color.
    pub fn color_for_label(label: &str) -> &'static str {
        label
            .parse::<Mood>()
            .map(Mood::color)
            .unwrap_or(DEFAULT_MOOD_COLOR)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mood {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Content with the moment marker removed, if present.
    pub fn moment_text(&self) -> &str {
        self.content
            .strip_prefix(MOMENT_PREFIX)
            .unwrap_or(&self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub mood: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dream {
    pub id: Uuid,
    pub dream_text: String,
    pub created_at: DateTime<Utc>,
}
