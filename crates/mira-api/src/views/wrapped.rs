use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use mira_db::RowFilter;
use mira_patterns::Period;
use mira_patterns::summary::{WindowData, WrappedKind, WrappedSummary, compose_wrapped};
use mira_types::Role;
use mira_types::api::Claims;

use super::{compute, section};
use crate::auth::AppState;

/// Recap of the current calendar month or year so far.
///
/// Records are read oldest first so ties between moods, days and months go
/// to whichever came first in time.
pub(crate) async fn load_wrapped(
    state: &AppState,
    user_id: &str,
    kind: WrappedKind,
) -> WrappedSummary {
    let period = match kind {
        WrappedKind::Monthly => Period::Month,
        WrappedKind::Yearly => Period::Year,
    };
    let today = state.clock.today(Utc::now());
    let window = RowFilter::all()
        .since(state.clock.start_of_day(period.start_of(today)))
        .oldest_first();

    let (u1, u2, u3) = (user_id.to_string(), user_id.to_string(), user_id.to_string());
    let (w1, w2, w3) = (window.clone(), window.clone(), window);

    let (messages, moods, dream_count) = tokio::join!(
        section(state, "wrapped messages", move |db| {
            db.get_messages(&u1, Some(Role::User), &w1)
        }),
        section(state, "wrapped moods", move |db| db.get_moods(&u2, &w2)),
        section(state, "wrapped dreams", move |db| db.count_dreams(&u3, &w3)),
    );

    let clock = state.clock;
    compute("wrapped", move || {
        let data = WindowData {
            messages: &messages,
            moods: &moods,
            dream_count,
        };
        compose_wrapped(kind, &data, &clock)
    })
    .await
}

pub async fn get_wrapped(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(kind): Path<WrappedKind>,
) -> impl IntoResponse {
    Json(load_wrapped(&state, &claims.sub.to_string(), kind).await)
}
