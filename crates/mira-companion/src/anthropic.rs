use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mira_types::api::{ChatTurn, DreamAnalysis};
use mira_types::Role;

use crate::error::CompanionError;
use crate::prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 300;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Chat-completion client for the Anthropic Messages API.
///
/// A client without a key is valid; every call on it fails with
/// [`CompanionError::MissingApiKey`] before touching the network.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
    ) -> Result<Self, CompanionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `turns` under `system` and return the first text block of the reply.
    /// A reply with no text block yields an empty string.
    pub async fn complete(
        &self,
        system: &str,
        turns: &[ChatTurn],
    ) -> Result<String, CompanionError> {
        let api_key = self.api_key.as_deref().ok_or(CompanionError::MissingApiKey)?;
        let url = format!("{}/v1/messages", self.base_url);

        debug!("Chat completion: {} turn(s) to {}", turns.len(), self.model);

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model: &self.model,
                max_tokens: MAX_TOKENS,
                system,
                messages: turns,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Chat completion failed with {}: {}", status, body);
            return Err(CompanionError::Status { status, body });
        }

        let parsed: MessagesResponse = resp.json().await?;
        let text = parsed
            .content
            .into_iter()
            .next()
            .filter(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default();
        Ok(text)
    }

    /// One companion reply to a running conversation.
    pub async fn chat(&self, turns: &[ChatTurn]) -> Result<String, CompanionError> {
        self.complete(prompts::COMPANION_SYSTEM, turns).await
    }

    /// A single-turn request in the companion's voice.
    pub async fn ask(&self, prompt: String) -> Result<String, CompanionError> {
        let turn = ChatTurn {
            role: Role::User,
            content: prompt,
        };
        self.chat(std::slice::from_ref(&turn)).await
    }

    /// Themes and a one-line reading of a dream. Replies that are not the
    /// expected JSON object become the fixed fallback analysis.
    pub async fn analyse_dream(&self, dream: &str) -> Result<DreamAnalysis, CompanionError> {
        let turn = ChatTurn {
            role: Role::User,
            content: dream.to_string(),
        };
        let reply = self
            .complete(prompts::DREAM_SYSTEM, std::slice::from_ref(&turn))
            .await?;
        Ok(prompts::parse_dream_analysis(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // Port 9 is discard; nothing should be sent there anyway.
        let client = ChatClient::new(None, "http://127.0.0.1:9", DEFAULT_MODEL).unwrap();
        assert!(!client.has_key());
        let err = client.ask("hello".into()).await.unwrap_err();
        assert!(matches!(err, CompanionError::MissingApiKey));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let client = ChatClient::new(Some("  ".into()), DEFAULT_BASE_URL, DEFAULT_MODEL).unwrap();
        assert!(!client.has_key());
    }

    #[test]
    fn request_body_matches_messages_api() {
        let turns = [ChatTurn {
            role: Role::Assistant,
            content: "hi".into(),
        }];
        let body = serde_json::to_value(MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: MAX_TOKENS,
            system: "sys",
            messages: &turns,
        })
        .unwrap();
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "assistant");
        assert_eq!(body["system"], "sys");
    }
}
