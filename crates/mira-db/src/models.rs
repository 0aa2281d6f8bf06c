//! Row types as read back from SQLite, before conversion to the shared models.
//! Distinct from mira-types models to keep the DB layer independent.
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use mira_types::{Dream, Message, MoodEntry, Role, User};

use crate::parse_ts;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

pub struct MoodRow {
    pub id: String,
    pub user_id: String,
    pub mood: String,
    pub color: String,
    pub created_at: String,
}

pub struct DreamRow {
    pub id: String,
    pub user_id: String,
    pub dream_text: String,
    pub created_at: String,
}

fn row_id(raw: &str, table: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", table, raw, e);
        Uuid::default()
    })
}

fn row_ts(raw: &str, id: &str) -> DateTime<Utc> {
    parse_ts(raw).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on row '{}'", raw, id);
        DateTime::default()
    })
}

impl UserRow {
    pub fn into_model(self) -> User {
        User {
            id: row_id(&self.id, "user"),
            created_at: row_ts(&self.created_at, &self.id),
            email: self.email,
        }
    }
}

impl MessageRow {
    pub fn into_model(self) -> Message {
        let role = self.role.parse().unwrap_or_else(|e| {
            warn!("Corrupt role on message '{}': {}", self.id, e);
            Role::User
        });
        Message {
            id: row_id(&self.id, "message"),
            role,
            created_at: row_ts(&self.created_at, &self.id),
            content: self.content,
        }
    }
}

impl MoodRow {
    pub fn into_model(self) -> MoodEntry {
        MoodEntry {
            id: row_id(&self.id, "mood"),
            created_at: row_ts(&self.created_at, &self.id),
            mood: self.mood,
            color: self.color,
        }
    }
}

impl DreamRow {
    pub fn into_model(self) -> Dream {
        Dream {
            id: row_id(&self.id, "dream"),
            created_at: row_ts(&self.created_at, &self.id),
            dream_text: self.dream_text,
        }
    }
}
