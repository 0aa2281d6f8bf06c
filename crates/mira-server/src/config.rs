use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

use mira_companion::anthropic;
use mira_companion::speech;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub anthropic_key: Option<String>,
    pub anthropic_url: String,
    pub chat_model: String,
    pub eleven_key: Option<String>,
    pub eleven_voice: Option<String>,
    pub eleven_url: String,
    pub utc_offset_minutes: i32,
    pub reset_url: String,
    pub mail_webhook: Option<String>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = var("MIRA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MIRA_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let host = var_or("MIRA_HOST", "0.0.0.0");
        let port: u16 = var_or("MIRA_PORT", "3000")
            .parse()
            .context("MIRA_PORT is not a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("MIRA_HOST is not an IP address")?;

        let utc_offset_minutes: i32 = var_or("MIRA_UTC_OFFSET_MINUTES", "0")
            .parse()
            .context("MIRA_UTC_OFFSET_MINUTES is not a whole number")?;

        Ok(Self {
            addr,
            db_path: var_or("MIRA_DB_PATH", "mira.db").into(),
            jwt_secret,
            anthropic_key: var("ANTHROPIC_API_KEY"),
            anthropic_url: var_or("MIRA_ANTHROPIC_URL", anthropic::DEFAULT_BASE_URL),
            chat_model: var_or("MIRA_CHAT_MODEL", anthropic::DEFAULT_MODEL),
            eleven_key: var("ELEVEN_API_KEY"),
            eleven_voice: var("ELEVEN_VOICE_ID"),
            eleven_url: var_or("MIRA_ELEVEN_URL", speech::DEFAULT_BASE_URL),
            utc_offset_minutes,
            reset_url: var_or("MIRA_RESET_URL", "http://localhost:3000/reset-password"),
            mail_webhook: var("MIRA_MAIL_WEBHOOK"),
        })
    }
}
