mod config;

use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use mira_api::mailer::Mailer;
use mira_api::{AppState, AppStateInner};
use mira_companion::{ChatClient, SpeechClient};
use mira_patterns::LocalClock;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mira=debug,mira_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let db = mira_db::Database::open(&config.db_path)?;

    if config.anthropic_key.is_none() {
        warn!("ANTHROPIC_API_KEY not set; chat, dreams and insights are disabled");
    }
    if config.eleven_key.is_none() || config.eleven_voice.is_none() {
        warn!("ElevenLabs key or voice not set; speech is disabled");
    }
    if config.mail_webhook.is_none() {
        info!("MIRA_MAIL_WEBHOOK not set; reset links will be logged");
    }

    let clock = LocalClock::from_offset_minutes(config.utc_offset_minutes)
        .context("MIRA_UTC_OFFSET_MINUTES is out of range")?;
    info!("Calendar offset: {} minutes from UTC", clock.offset_minutes());

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        chat: ChatClient::new(config.anthropic_key, &config.anthropic_url, &config.chat_model)?,
        speech: SpeechClient::new(config.eleven_key, config.eleven_voice, &config.eleven_url)?,
        clock,
        mailer: Mailer::new(config.mail_webhook)?,
        reset_url: config.reset_url,
    });

    let app = mira_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("MIRA server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
