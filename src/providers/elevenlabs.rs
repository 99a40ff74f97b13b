//! ElevenLabs text-to-speech adapter

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ProviderError, ProviderResult};
use crate::{Error, Result};

use super::{truncate_chars, SpeechSynthesizer};

const PROVIDER: &str = "elevenlabs";
const BASE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// ElevenLabs caps billed input per request
const MAX_INPUT_CHARS: usize = 5000;

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// Synthesizes speech via the ElevenLabs API
#[derive(Debug)]
pub struct ElevenLabsTts {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
    model: String,
}

impl ElevenLabsTts {
    /// Create a new ElevenLabs TTS adapter
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be constructed.
    pub fn new(
        api_key: String,
        voice_id: String,
        model: String,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            voice_id,
            model,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTts {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn synthesize(&self, text: &str, _language: Option<&str>) -> ProviderResult<Vec<u8>> {
        let input = truncate_chars(text, MAX_INPUT_CHARS);
        if input.len() < text.len() {
            tracing::warn!(
                original_chars = text.chars().count(),
                limit = MAX_INPUT_CHARS,
                "truncating over-long TTS input"
            );
        }

        let request = SynthesisRequest {
            text: input,
            model_id: &self.model,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/{}", self.voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "ElevenLabs request failed");
                ProviderError::transport(PROVIDER, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ElevenLabs API error");
            return Err(ProviderError::bad_status(PROVIDER, status.as_u16(), body));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, &e))?;
        if audio.is_empty() {
            return Err(ProviderError::empty(PROVIDER, "audio payload"));
        }

        tracing::info!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_config_error() {
        let err = ElevenLabsTts::new(
            String::new(),
            "voice".to_string(),
            "model".to_string(),
            std::time::Duration::from_secs(30),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn provider_name_is_stable() {
        let tts = ElevenLabsTts::new(
            "key".to_string(),
            "voice".to_string(),
            "model".to_string(),
            std::time::Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(tts.name(), "elevenlabs");
    }

    #[test]
    fn over_long_input_is_truncated_not_rejected() {
        let long = "a".repeat(MAX_INPUT_CHARS + 100);
        assert_eq!(truncate_chars(&long, MAX_INPUT_CHARS).len(), MAX_INPUT_CHARS);
    }
}
