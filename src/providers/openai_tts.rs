//! OpenAI text-to-speech adapter (fallback synthesizer)

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ProviderError, ProviderResult};
use crate::{Error, Result};

use super::{truncate_chars, SpeechSynthesizer};

const PROVIDER: &str = "openai-tts";
const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// OpenAI's documented per-request input limit
const MAX_INPUT_CHARS: usize = 4096;

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Synthesizes speech via the OpenAI audio API
#[derive(Debug)]
pub struct OpenAiTts {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    model: String,
}

impl OpenAiTts {
    /// Create a new OpenAI TTS adapter
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be constructed.
    pub fn new(
        api_key: String,
        voice: String,
        model: String,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            voice,
            model,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTts {
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

        let request = SpeechRequest {
            model: &self.model,
            input,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "OpenAI TTS request failed");
                ProviderError::transport(PROVIDER, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI TTS API error");
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
        let err = OpenAiTts::new(
            String::new(),
            "alloy".to_string(),
            "tts-1".to_string(),
            std::time::Duration::from_secs(30),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn provider_name_is_stable() {
        let tts = OpenAiTts::new(
            "key".to_string(),
            "alloy".to_string(),
            "tts-1".to_string(),
            std::time::Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(tts.name(), "openai-tts");
    }
}
