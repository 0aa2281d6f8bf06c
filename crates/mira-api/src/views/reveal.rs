use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use mira_companion::prompts;
use mira_db::RowFilter;
use mira_patterns::buckets::{self, Period};
use mira_patterns::calendar::weekday_short;
use mira_patterns::summary::{self, MoodCount, PersonPattern};
use mira_patterns::{CategoryCount, LocalClock};
use mira_types::api::Claims;
use mira_types::{Dream, Message, MoodEntry, Role};

use super::{Memory, ask, compute, on_this_day, section};
use crate::auth::AppState;

const STRIP_DAYS: usize = 7;
const DOMINANT_MOOD_WINDOW: usize = 7;
const ON_THIS_DAY_YEARS: i32 = 3;
const INSIGHT_MIN_MESSAGES: usize = 5;

/// One day in the week strip; `mood` is the latest logged that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayMood {
    pub date: NaiveDate,
    pub day: &'static str,
    pub mood: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct RevealReport {
    pub has_data: bool,
    pub progress: u8,
    pub week: Vec<DayMood>,
    pub dominant_mood: Option<MoodCount>,
    pub people: Vec<PersonPattern>,
    pub topics: Vec<CategoryCount>,
    pub dream_themes: Vec<CategoryCount>,
    pub on_this_day: Vec<Memory>,
    pub summary: Option<String>,
    pub insight: Option<String>,
}

/// The last seven local days, oldest first, with empty days kept as gaps.
/// `moods` must be newest first.
pub fn week_strip(today: NaiveDate, moods: &[MoodEntry], clock: &LocalClock) -> Vec<DayMood> {
    let days = buckets::buckets(today, Period::Day, STRIP_DAYS, false, clock);
    let per_day = buckets::assign(&days, moods, |m| m.created_at);

    days.iter()
        .zip(per_day)
        .rev()
        .map(|(bucket, moods)| {
            let latest = moods.first();
            DayMood {
                date: bucket.first_day,
                day: weekday_short(bucket.first_day.weekday()),
                mood: latest.map(|m| m.mood.clone()),
                color: latest.map(|m| m.color.clone()),
            }
        })
        .collect()
}

/// Everything on the Reveal view that comes from local records alone.
fn compose(
    today: NaiveDate,
    messages: &[Message],
    moods: &[MoodEntry],
    dreams: &[Dream],
    clock: &LocalClock,
) -> RevealReport {
    let recent_moods = &moods[..moods.len().min(DOMINANT_MOOD_WINDOW)];

    RevealReport {
        has_data: !(messages.is_empty() && moods.is_empty() && dreams.is_empty()),
        progress: summary::progress_percent(messages.len(), moods.len(), dreams.len()),
        week: week_strip(today, moods, clock),
        dominant_mood: summary::dominant_mood(recent_moods),
        people: summary::people_patterns(messages, clock),
        topics: summary::reveal_topics(messages),
        dream_themes: summary::dream_themes(dreams),
        ..RevealReport::default()
    }
}

pub async fn get_reveal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let uid = claims.sub.to_string();
    let today = state.clock.today(Utc::now());
    let (u1, u2, u3) = (uid.clone(), uid.clone(), uid.clone());

    let (messages, moods, dreams, on_this_day) = tokio::join!(
        section(&state, "reveal messages", move |db| {
            db.get_messages(&u1, Some(Role::User), &RowFilter::all())
        }),
        section(&state, "reveal moods", move |db| db.get_moods(&u2, &RowFilter::all())),
        section(&state, "reveal dreams", move |db| db.get_dreams(&u3, &RowFilter::all())),
        on_this_day(&state, &uid, today, 1..=ON_THIS_DAY_YEARS, false),
    );

    let prompt = (messages.len() > INSIGHT_MIN_MESSAGES)
        .then(|| prompts::reveal_prompt(&messages, &dreams, &moods, &state.clock));
    let insight = async {
        match prompt {
            Some(prompt) => ask(&state, "reveal insight", prompt).await,
            None => None,
        }
    };

    let clock = state.clock;
    let (mut report, reply) = tokio::join!(
        compute("reveal", move || compose(today, &messages, &moods, &dreams, &clock)),
        insight,
    );

    let analysis = reply.map(|r| prompts::parse_reveal(&r)).unwrap_or_default();
    report.on_this_day = on_this_day;
    report.summary = analysis.summary;
    report.insight = analysis.insight;
    Json(report)
}
