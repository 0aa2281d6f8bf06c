use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CompanionError;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const MODEL_ID: &str = "eleven_monolingual_v2";

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs text-to-speech client.
#[derive(Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    api_key: Option<String>,
    voice_id: Option<String>,
    base_url: String,
}

impl SpeechClient {
    pub fn new(
        api_key: Option<String>,
        voice_id: Option<String>,
        base_url: &str,
    ) -> Result<Self, CompanionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            voice_id: voice_id.filter(|v| !v.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// MPEG audio for `text`.
    pub async fn synthesize(&self, text: &str) -> Result<Bytes, CompanionError> {
        let (Some(api_key), Some(voice_id)) = (self.api_key.as_deref(), self.voice_id.as_deref())
        else {
            return Err(CompanionError::MissingApiKey);
        };

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        debug!("Synthesizing {} chars with voice {}", text.chars().count(), voice_id);

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&SpeechRequest {
                text,
                model_id: MODEL_ID,
                voice_settings: VoiceSettings {
                    stability: 0.5,
                    similarity_boost: 0.75,
                },
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Speech synthesis failed with {}: {}", status, body);
            return Err(CompanionError::Status { status, body });
        }

        let audio = resp.bytes().await?;
        debug!("Received {} bytes of audio", audio.len());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn voice_is_required() {
        let client = SpeechClient::new(Some("key".into()), None, DEFAULT_BASE_URL).unwrap();
        let err = client.synthesize("hi").await.unwrap_err();
        assert!(matches!(err, CompanionError::MissingApiKey));
    }
}
