use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use mira_companion::prompts;
use mira_db::RowFilter;
use mira_patterns::buckets::{self, Bucket, Period};
use mira_patterns::calendar::month_short;
use mira_patterns::summary::{self, MoodCount, WrappedKind, WrappedSummary, truncate_chars};
use mira_types::api::Claims;
use mira_types::models::DEFAULT_MOOD_COLOR;
use mira_types::{Dream, Message, MoodEntry, Role};

use super::wrapped::load_wrapped;
use super::{Memory, ask, on_this_day, section};
use crate::auth::AppState;
use crate::error::ApiError;

const ON_THIS_DAY_YEARS: i32 = 5;
const QUOTE_CHARS: usize = 80;
const DREAM_LIMIT: u32 = 20;
const REMEMBERS_SAMPLE: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl TimeFilter {
    /// How many calendar months the monthly sections cover.
    pub fn months(self) -> usize {
        match self {
            Self::All => 24,
            Self::Year => 12,
            Self::SixMonths => 6,
            Self::ThreeMonths => 3,
        }
    }

    /// First local day of the dream list, or `None` for no lower bound.
    pub fn dreams_from(self, today: NaiveDate) -> Option<NaiveDate> {
        let back = match self {
            Self::All => return None,
            Self::Year => 12,
            Self::SixMonths => 6,
            Self::ThreeMonths => 3,
        };
        Period::Month
            .start_of(today)
            .checked_sub_months(Months::new(back))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LookBackQuery {
    #[serde(default)]
    pub filter: TimeFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyMemory {
    pub month: String,
    pub year: i32,
    /// Opening of the first message that month.
    pub quote: String,
    pub top_mood: Option<String>,
    pub mood_color: String,
    pub message_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodMonth {
    pub month: &'static str,
    pub year: i32,
    pub moods: Vec<MoodCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DreamCard {
    pub text: String,
    pub date: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LookBackReport {
    pub filter: TimeFilter,
    pub on_this_day: Vec<Memory>,
    pub monthly_memories: Vec<MonthlyMemory>,
    pub mood_journey: Vec<MoodMonth>,
    pub dreams: Vec<DreamCard>,
    pub monthly_wrapped: WrappedSummary,
    pub yearly_wrapped: WrappedSummary,
    pub mira_remembers: Vec<String>,
}

/// Half-open UTC span covering every bucket, oldest to newest.
fn window(buckets: &[Bucket]) -> Option<RowFilter> {
    let newest = buckets.first()?;
    let oldest = buckets.last()?;
    Some(RowFilter::between(oldest.start, newest.end).oldest_first())
}

/// Previous months (newest first) that have at least one user message.
/// Inputs are oldest first.
pub fn monthly_memories(
    months: &[Bucket],
    messages: &[Message],
    moods: &[MoodEntry],
) -> Vec<MonthlyMemory> {
    let messages = buckets::assign(months, messages, |m| m.created_at);
    let moods = buckets::assign(months, moods, |m| m.created_at);

    months
        .iter()
        .zip(messages.into_iter().zip(moods))
        .filter_map(|(month, (messages, moods))| {
            let first = messages.first()?;
            let moods: Vec<MoodEntry> = moods.into_iter().cloned().collect();
            let top = summary::dominant_mood(&moods);
            Some(MonthlyMemory {
                month: month.label(),
                year: month.first_day.year(),
                quote: truncate_chars(&first.content, QUOTE_CHARS),
                mood_color: top
                    .as_ref()
                    .map(|t| t.color.clone())
                    .unwrap_or_else(|| DEFAULT_MOOD_COLOR.to_string()),
                top_mood: top.map(|t| t.mood),
                message_count: messages.len(),
            })
        })
        .collect()
}

/// Per-month mood counts, oldest month first, skipping months with no moods.
pub fn mood_journey(months: &[Bucket], moods: &[MoodEntry]) -> Vec<MoodMonth> {
    let per_month = buckets::assign(months, moods, |m| m.created_at);

    months
        .iter()
        .zip(per_month)
        .rev()
        .filter(|(_, moods)| !moods.is_empty())
        .map(|(month, moods)| {
            let moods: Vec<MoodEntry> = moods.into_iter().cloned().collect();
            MoodMonth {
                month: month_short(month.first_day.month()),
                year: month.first_day.year(),
                moods: summary::stored_color_counts(&moods),
            }
        })
        .collect()
}

fn dream_card(dream: Dream, clock: &mira_patterns::LocalClock) -> DreamCard {
    let date = clock.local_date(dream.created_at);
    DreamCard {
        date: format!("{} {} {}", date.day(), month_short(date.month()), date.year()),
        created_at: dream.created_at,
        text: dream.dream_text,
    }
}

async fn load_monthly_memories(
    state: &AppState,
    user_id: &str,
    months: Vec<Bucket>,
) -> Vec<MonthlyMemory> {
    let Some(window) = window(&months) else {
        return Vec::new();
    };
    let uid = user_id.to_string();
    let (messages, moods) = section(state, "monthly memories", move |db| {
        Ok((
            db.get_messages(&uid, Some(Role::User), &window)?,
            db.get_moods(&uid, &window)?,
        ))
    })
    .await;
    monthly_memories(&months, &messages, &moods)
}

async fn load_mood_journey(
    state: &AppState,
    user_id: &str,
    months: Vec<Bucket>,
) -> Vec<MoodMonth> {
    let Some(window) = window(&months) else {
        return Vec::new();
    };
    let uid = user_id.to_string();
    let moods = section(state, "mood journey", move |db| db.get_moods(&uid, &window)).await;
    mood_journey(&months, &moods)
}

async fn load_dreams(state: &AppState, user_id: &str, from: Option<NaiveDate>) -> Vec<DreamCard> {
    let mut filter = RowFilter::newest(DREAM_LIMIT);
    if let Some(day) = from {
        filter = filter.since(state.clock.start_of_day(day));
    }
    let uid = user_id.to_string();
    let dreams = section(state, "dreams", move |db| db.get_dreams(&uid, &filter)).await;
    dreams
        .into_iter()
        .map(|d| dream_card(d, &state.clock))
        .collect()
}

async fn load_remembers(state: &AppState, user_id: &str) -> Vec<String> {
    let uid = user_id.to_string();
    let recent = section(state, "remembered messages", move |db| {
        db.get_messages(&uid, Some(Role::User), &RowFilter::newest(REMEMBERS_SAMPLE))
    })
    .await;

    let Some(prompt) = prompts::remembers_prompt(&recent) else {
        return Vec::new();
    };
    ask(state, "MIRA remembers", prompt)
        .await
        .map(|reply| prompts::parse_remembers(&reply))
        .unwrap_or_default()
}

pub async fn get_look_back(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<LookBackQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let uid = claims.sub.to_string();
    let filter = query.filter;
    let today = state.clock.today(Utc::now());
    let months = filter.months();

    let previous_months = buckets::buckets(today, Period::Month, months, true, &state.clock);
    let recent_months = buckets::buckets(today, Period::Month, months, false, &state.clock);

    let (
        on_this_day,
        monthly_memories,
        mood_journey,
        dreams,
        monthly_wrapped,
        yearly_wrapped,
        mira_remembers,
    ) = tokio::join!(
        on_this_day(&state, &uid, today, 1..=ON_THIS_DAY_YEARS, true),
        load_monthly_memories(&state, &uid, previous_months),
        load_mood_journey(&state, &uid, recent_months),
        load_dreams(&state, &uid, filter.dreams_from(today)),
        load_wrapped(&state, &uid, WrappedKind::Monthly),
        load_wrapped(&state, &uid, WrappedKind::Yearly),
        load_remembers(&state, &uid),
    );

    Ok(Json(LookBackReport {
        filter,
        on_this_day,
        monthly_memories,
        mood_journey,
        dreams,
        monthly_wrapped,
        yearly_wrapped,
        mira_remembers,
    }))
}
