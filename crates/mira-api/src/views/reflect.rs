use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use mira_db::RowFilter;
use mira_patterns::calendar::relative_label;
use mira_types::api::Claims;

use super::section;
use crate::auth::AppState;

const RECENT_MOODS: u32 = 5;
const RECENT_MOMENTS: u32 = 3;
const RECENT_DREAMS: u32 = 3;

#[derive(Debug, Serialize)]
pub struct RecentMood {
    pub mood: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub age: String,
}

#[derive(Debug, Serialize)]
pub struct RecentText {
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub age: String,
}

/// Latest entries shown under the Reflect composer.
#[derive(Debug, Default, Serialize)]
pub struct RecentEntries {
    pub moods: Vec<RecentMood>,
    pub moments: Vec<RecentText>,
    pub dreams: Vec<RecentText>,
}

pub async fn get_recent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let uid = claims.sub.to_string();
    let (u1, u2, u3) = (uid.clone(), uid.clone(), uid);

    let (moods, moments, dreams) = tokio::join!(
        section(&state, "recent moods", move |db| {
            db.get_moods(&u1, &RowFilter::newest(RECENT_MOODS))
        }),
        section(&state, "recent moments", move |db| db.get_moments(&u2, RECENT_MOMENTS)),
        section(&state, "recent dreams", move |db| {
            db.get_dreams(&u3, &RowFilter::newest(RECENT_DREAMS))
        }),
    );

    let now = Utc::now();
    let age = |ts: DateTime<Utc>| relative_label(now, ts, &state.clock);

    Json(RecentEntries {
        moods: moods
            .into_iter()
            .map(|m| RecentMood {
                age: age(m.created_at),
                created_at: m.created_at,
                mood: m.mood,
                color: m.color,
            })
            .collect(),
        moments: moments
            .iter()
            .map(|m| RecentText {
                text: m.moment_text().to_string(),
                created_at: m.created_at,
                age: age(m.created_at),
            })
            .collect(),
        dreams: dreams
            .into_iter()
            .map(|d| RecentText {
                age: age(d.created_at),
                created_at: d.created_at,
                text: d.dream_text,
            })
            .collect(),
    })
}
