use axum::{
    Extension, Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mira_db::RowFilter;
use mira_types::api::{
    Claims, CreatedResponse, NewDreamRequest, NewMessageRequest, NewMomentRequest,
    NewMoodRequest,
};
use mira_types::models::MOMENT_PREFIX;
use mira_types::{Mood, Role};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::validation;

const MAX_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Messages only.
    pub role: Option<Role>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub until: Option<DateTime<Utc>>,
    /// Oldest first instead of newest first.
    #[serde(default)]
    pub ascending: bool,
}

fn default_limit() -> u32 {
    50
}

impl ListQuery {
    fn filter(&self) -> RowFilter {
        let mut filter = RowFilter::newest(self.limit.clamp(1, MAX_LIMIT));
        filter.since = self.since;
        filter.until = self.until;
        filter.oldest_first = self.ascending;
        filter
    }
}

/// The current instant at the precision the store keeps, so a created
/// entry reads back with the timestamp it was reported with.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn created(id: Uuid, created_at: DateTime<Utc>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(CreatedResponse { id, created_at }))
}

// -- Messages --

pub async fn create_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Result<Json<NewMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let content = validation::entry_text(&req.content)?.to_string();
    let id = Uuid::new_v4();
    let now = stored_now();

    let st = state.clone();
    let uid = claims.sub.to_string();
    blocking(move || st.db.insert_message(&id.to_string(), &uid, req.role, &content, now))
        .await?;

    Ok(created(id, now))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let st = state.clone();
    let uid = claims.sub.to_string();
    let filter = query.filter();
    let messages = blocking(move || st.db.get_messages(&uid, query.role, &filter)).await?;
    Ok(Json(messages))
}

// -- Moods --

pub async fn create_mood(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Result<Json<NewMoodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    validation::require_filled(&[req.mood.as_str()])?;
    let mood: Mood = req
        .mood
        .parse()
        .map_err(|_| ApiError::BadRequest("Unknown mood"))?;
    let id = Uuid::new_v4();
    let now = stored_now();

    let st = state.clone();
    let uid = claims.sub.to_string();
    blocking(move || {
        st.db
            .insert_mood(&id.to_string(), &uid, mood.label(), mood.color(), now)
    })
    .await?;

    Ok(created(id, now))
}

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let st = state.clone();
    let uid = claims.sub.to_string();
    let filter = query.filter();
    let moods = blocking(move || st.db.get_moods(&uid, &filter)).await?;
    Ok(Json(moods))
}

// -- Moments --

#[derive(Debug, Serialize)]
pub struct MomentView {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_moment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Result<Json<NewMomentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let content = format!("{}{}", MOMENT_PREFIX, validation::entry_text(&req.text)?);
    let id = Uuid::new_v4();
    let now = stored_now();

    let st = state.clone();
    let uid = claims.sub.to_string();
    blocking(move || st.db.insert_message(&id.to_string(), &uid, Role::User, &content, now))
        .await?;

    Ok(created(id, now))
}

pub async fn list_moments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let st = state.clone();
    let uid = claims.sub.to_string();
    let limit = query.limit.clamp(1, MAX_LIMIT);
    let moments = blocking(move || st.db.get_moments(&uid, limit)).await?;

    let views: Vec<MomentView> = moments
        .into_iter()
        .map(|m| MomentView {
            id: m.id,
            text: m.moment_text().to_string(),
            created_at: m.created_at,
        })
        .collect();
    Ok(Json(views))
}

// -- Dreams --

pub async fn create_dream(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Result<Json<NewDreamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let text = validation::entry_text(&req.dream_text)?.to_string();
    let id = Uuid::new_v4();
    let now = stored_now();

    let st = state.clone();
    let uid = claims.sub.to_string();
    blocking(move || st.db.insert_dream(&id.to_string(), &uid, &text, now)).await?;

    Ok(created(id, now))
}

pub async fn list_dreams(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let st = state.clone();
    let uid = claims.sub.to_string();
    let filter = query.filter();
    let dreams = blocking(move || st.db.get_dreams(&uid, &filter)).await?;
    Ok(Json(dreams))
}
