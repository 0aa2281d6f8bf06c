use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::NaiveDate;
use serde::Serialize;

use mira_db::RowFilter;
use mira_patterns::LocalClock;
use mira_patterns::summary::{day_heading, truncate_chars};
use mira_types::api::Claims;
use mira_types::{Message, Role};

use super::section;
use crate::auth::AppState;

const PREVIEW_CHARS: usize = 80;

/// One local day of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub label: String,
    /// Start of the latest message that day.
    pub preview: String,
    pub count: usize,
}

/// Group newest-first user messages by local day, keeping that order.
pub fn group_by_day(messages: &[Message], clock: &LocalClock) -> Vec<HistoryDay> {
    let mut days: Vec<HistoryDay> = Vec::new();
    for msg in messages {
        let date = clock.local_date(msg.created_at);
        if let Some(day) = days.last_mut().filter(|d| d.date == date) {
            day.count += 1;
            continue;
        }
        days.push(HistoryDay {
            date,
            label: day_heading(msg.created_at, clock),
            preview: truncate_chars(&msg.content, PREVIEW_CHARS),
            count: 1,
        });
    }
    days
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let uid = claims.sub.to_string();
    let messages = section(&state, "history", move |db| {
        db.get_messages(&uid, Some(Role::User), &RowFilter::all())
    })
    .await;

    Json(group_by_day(&messages, &state.clock))
}
