use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::views::{history, look_back, reflect, reveal, wrapped};
use crate::{account, entries, vendor};

/// Every HTTP route, bound to `state`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        // Vendor passthroughs work for guests too
        .route("/api/chat", post(vendor::chat))
        .route("/api/dreams", post(vendor::analyse_dream))
        .route("/api/speak", post(vendor::speak));

    let protected_routes = Router::new()
        .route("/me", get(account::me))
        .route("/me/password", put(account::change_password))
        .route("/me/password-reset", post(account::send_password_reset))
        .route("/me/data", delete(account::erase_data))
        .route("/messages", get(entries::list_messages).post(entries::create_message))
        .route("/moods", get(entries::list_moods).post(entries::create_mood))
        .route("/moments", get(entries::list_moments).post(entries::create_moment))
        .route("/dreams", get(entries::list_dreams).post(entries::create_dream))
        .route("/history", get(history::get_history))
        .route("/reflect/recent", get(reflect::get_recent))
        .route("/reveal", get(reveal::get_reveal))
        .route("/look-back", get(look_back::get_look_back))
        .route("/wrapped/{kind}", get(wrapped::get_wrapped))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
