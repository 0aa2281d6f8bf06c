use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::info;

use mira_types::api::{ChangePasswordRequest, Claims, EraseResponse, MeResponse, StatusResponse};

use crate::auth::{AppState, hash_password, send_reset_link};
use crate::blocking;
use crate::error::ApiError;
use crate::validation;

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let uid = claims.sub.to_string();
    let user = blocking(move || st.db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::Unauthorized)?
        .into_model();

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        created_at: user.created_at,
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::require_filled(&[req.new_password.as_str(), req.confirm_password.as_str()])?;
    validation::new_password(&req.new_password, &req.confirm_password)?;

    let password_hash = hash_password(&req.new_password)?;
    let st = state.clone();
    let uid = claims.sub.to_string();
    if !blocking(move || st.db.update_password(&uid, &password_hash)).await? {
        return Err(ApiError::Unauthorized);
    }

    info!("Password changed for {}", claims.sub);
    Ok(Json(StatusResponse {
        message: "Password updated!".to_string(),
    }))
}

/// Mail a reset link to the signed-in user's own address.
pub async fn send_password_reset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let uid = claims.sub.to_string();
    let user = blocking(move || st.db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    send_reset_link(&state, &user.id, &user.email).await?;

    Ok(Json(StatusResponse {
        message: "Password reset email sent!".to_string(),
    }))
}

/// Delete every message, mood and dream the user owns. The account stays.
pub async fn erase_data(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let uid = claims.sub.to_string();
    let (messages, moods, dreams) = blocking(move || st.db.erase_user_data(&uid)).await?;

    info!(
        "Erased data for {}: {} messages, {} moods, {} dreams",
        claims.sub, messages, moods, dreams
    );
    Ok(Json(EraseResponse {
        messages,
        moods,
        dreams,
    }))
}
