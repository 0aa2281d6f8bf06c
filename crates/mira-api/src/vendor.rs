//! Thin pass-throughs to the chat and speech vendors. Nothing here touches
//! the database and none of it needs a session.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use tracing::{error, warn};

use mira_companion::CompanionError;
use mira_types::api::{ChatRequest, ChatResponse, DreamAnalysisRequest, SpeakRequest};

use crate::auth::AppState;
use crate::error::ApiError;

const CHAT_FAILED: &str = "Something went wrong";
const SPEECH_FAILED: &str = "Speech failed";

fn vendor_error(err: CompanionError, message: &'static str) -> ApiError {
    match err {
        CompanionError::MissingApiKey => {
            error!("No API key found");
            ApiError::NoApiKey
        }
        other => {
            error!("Vendor call failed: {}", other);
            ApiError::Upstream(message)
        }
    }
}

fn parse_body<T>(
    body: Result<Json<T>, JsonRejection>,
    message: &'static str,
) -> Result<T, ApiError> {
    body.map(|Json(v)| v).map_err(|e| {
        warn!("Rejected request body: {}", e);
        ApiError::Upstream(message)
    })
}

pub async fn chat(
    State(state): State<AppState>,
    req: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    if !state.chat.has_key() {
        return Err(vendor_error(CompanionError::MissingApiKey, CHAT_FAILED));
    }
    let req = parse_body(req, CHAT_FAILED)?;

    let message = state
        .chat
        .chat(&req.messages)
        .await
        .map_err(|e| vendor_error(e, CHAT_FAILED))?;

    Ok(Json(ChatResponse { message }))
}

pub async fn analyse_dream(
    State(state): State<AppState>,
    req: Result<Json<DreamAnalysisRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.chat.has_key() {
        return Err(vendor_error(CompanionError::MissingApiKey, CHAT_FAILED));
    }
    let req = parse_body(req, CHAT_FAILED)?;

    let analysis = state
        .chat
        .analyse_dream(&req.dream)
        .await
        .map_err(|e| vendor_error(e, CHAT_FAILED))?;

    Ok(Json(analysis))
}

pub async fn speak(
    State(state): State<AppState>,
    req: Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = parse_body(req, SPEECH_FAILED)?;

    let audio = state
        .speech
        .synthesize(&req.text)
        .await
        .map_err(|e| vendor_error(e, SPEECH_FAILED))?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
