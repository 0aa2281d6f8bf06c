//! Composed read-only views. Each one loads its sections concurrently and
//! from scratch on every request. A section whose load fails is logged and
//! comes back empty; the rest of the view is still returned.

pub mod history;
pub mod look_back;
pub mod reflect;
pub mod reveal;
pub mod wrapped;

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use mira_db::{Database, RowFilter};
use mira_patterns::calendar::years_before;
use mira_types::Role;

use crate::auth::AppState;

/// Run one blocking load for a view section, falling back to `T::default()`.
pub(crate) async fn section<T, F>(state: &AppState, name: &'static str, load: F) -> T
where
    T: Default + Send + 'static,
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
{
    let st = state.clone();
    match tokio::task::spawn_blocking(move || load(&st.db)).await {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!("Failed to load {}: {:#}", name, e);
            T::default()
        }
        Err(e) => {
            warn!("Join error loading {}: {}", name, e);
            T::default()
        }
    }
}

/// Run CPU-bound composition off the async workers.
pub(crate) async fn compute<T, F>(name: &'static str, work: F) -> T
where
    T: Default + Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.unwrap_or_else(|e| {
        warn!("Join error composing {}: {}", name, e);
        T::default()
    })
}

/// Single-turn request to the companion. Missing keys and vendor failures
/// both read as "no insight".
pub(crate) async fn ask(state: &AppState, name: &'static str, prompt: String) -> Option<String> {
    match state.chat.ask(prompt).await {
        Ok(reply) => Some(reply),
        Err(e) => {
            warn!("Failed to load {}: {}", name, e);
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Message,
    Mood,
    Dream,
}

/// Something the user recorded on today's date in an earlier year.
#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    pub years_ago: i32,
    pub kind: MemoryKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// For each year in `years`, the first user message recorded on the same
/// local calendar date that many years ago. With `every_kind` the first mood
/// and dream from that day are included too.
pub(crate) async fn on_this_day(
    state: &AppState,
    user_id: &str,
    today: NaiveDate,
    years: RangeInclusive<i32>,
    every_kind: bool,
) -> Vec<Memory> {
    let lookups = years.filter_map(move |years_ago| {
        let Some(date) = years_before(today, years_ago) else {
            debug!("Skipping on-this-day {} year(s) before {}: no such date", years_ago, today);
            return None;
        };
        let (start, end) = state.clock.day_range(date);
        let uid = user_id.to_string();

        Some(section(state, "on this day", move |db| {
            let first = RowFilter::between(start, end).oldest_first().limit(1);
            let mut found = Vec::new();

            if let Some(msg) = db.get_messages(&uid, Some(Role::User), &first)?.into_iter().next() {
                found.push(Memory {
                    years_ago,
                    kind: MemoryKind::Message,
                    content: msg.content,
                    color: None,
                });
            }
            if !every_kind {
                return Ok(found);
            }
            if let Some(mood) = db.get_moods(&uid, &first)?.into_iter().next() {
                found.push(Memory {
                    years_ago,
                    kind: MemoryKind::Mood,
                    content: format!("You were feeling {}", mood.mood.to_lowercase()),
                    color: Some(mood.color),
                });
            }
            if let Some(dream) = db.get_dreams(&uid, &first)?.into_iter().next() {
                found.push(Memory {
                    years_ago,
                    kind: MemoryKind::Dream,
                    content: dream.dream_text,
                    color: None,
                });
            }
            Ok(found)
        }))
    });

    join_all(lookups).await.into_iter().flatten().collect()
}
