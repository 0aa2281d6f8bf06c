use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use mira_companion::{ChatClient, SpeechClient};
use mira_db::Database;
use mira_patterns::LocalClock;
use mira_types::api::{
    AuthResponse, Claims, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
    SignupRequest, StatusResponse,
};

use crate::blocking;
use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::validation;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub chat: ChatClient,
    pub speech: SpeechClient,
    pub clock: LocalClock,
    pub mailer: Mailer,
    /// Page the emailed reset link points at; the token is appended as `?token=`.
    pub reset_url: String,
}

const TOKEN_DAYS: i64 = 30;
const RESET_TOKEN_HOURS: i64 = 1;
pub const RESET_SENT: &str = "If that email is registered, a reset link is on its way.";

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::require_filled(&[
        req.email.as_str(),
        req.password.as_str(),
        req.confirm_password.as_str(),
    ])?;
    let email = validation::normalize_email(&req.email)?;
    validation::new_password(&req.password, &req.confirm_password)?;

    let st = state.clone();
    let lookup = email.clone();
    if blocking(move || st.db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    let st = state.clone();
    let stored_email = email.clone();
    blocking(move || {
        st.db
            .create_user(&user_id.to_string(), &stored_email, &password_hash, Utc::now())
    })
    .await?;

    info!("New account {}", user_id);
    let token = create_token(&state.jwt_secret, user_id, &email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            email,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::require_filled(&[req.email.as_str(), req.password.as_str()])?;
    let email = req.email.trim().to_lowercase();

    let st = state.clone();
    let user = blocking(move || st.db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&req.password, &user.password)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e: uuid::Error| ApiError::Internal(e.into()))?;
    let token = create_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(AuthResponse {
        user_id,
        email: user.email,
        token,
    }))
}

/// Always answers the same way so the endpoint does not reveal which
/// addresses have accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::require_filled(&[req.email.as_str()])?;
    let email = validation::normalize_email(&req.email)?;

    let st = state.clone();
    let lookup = email.clone();
    match blocking(move || st.db.get_user_by_email(&lookup)).await? {
        Some(user) => match send_reset_link(&state, &user.id, &email).await {
            Ok(()) => {}
            Err(ApiError::Internal(e)) => warn!("Failed to send reset link: {:#}", e),
            Err(e) => warn!("Failed to send reset link: {}", e),
        },
        None => info!("Password reset requested for unknown address"),
    }

    Ok(Json(StatusResponse {
        message: RESET_SENT.to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::require_filled(&[
        req.token.as_str(),
        req.password.as_str(),
        req.confirm_password.as_str(),
    ])?;
    validation::new_password(&req.password, &req.confirm_password)?;

    let token_hash = hash_reset_token(req.token.trim());
    let st = state.clone();
    let user_id = blocking(move || st.db.consume_password_reset(&token_hash, Utc::now()))
        .await?
        .ok_or(ApiError::InvalidResetLink)?;

    let password_hash = hash_password(&req.password)?;
    let st = state.clone();
    let uid = user_id.clone();
    if !blocking(move || st.db.update_password(&uid, &password_hash)).await? {
        warn!("Reset token pointed at missing user {}", user_id);
        return Err(ApiError::InvalidResetLink);
    }

    info!("Password reset for {}", user_id);
    Ok(Json(StatusResponse {
        message: "Password updated!".to_string(),
    }))
}

/// Store a fresh reset token for `user_id` and mail the link to `email`.
pub(crate) async fn send_reset_link(
    state: &AppState,
    user_id: &str,
    email: &str,
) -> Result<(), ApiError> {
    let token = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());
    let token_hash = hash_reset_token(&token);
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_HOURS);

    let st = state.clone();
    let uid = user_id.to_string();
    blocking(move || st.db.insert_password_reset(&token_hash, &uid, expires_at)).await?;

    let link = format!("{}?token={}", state.reset_url, token);
    state
        .mailer
        .send_reset_link(email, &link)
        .await
        .map_err(ApiError::Internal)
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> Result<(), ApiError> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + Duration::days(TOKEN_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;
    Ok(data.claims)
}
