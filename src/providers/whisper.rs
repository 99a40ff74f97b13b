//! OpenAI Whisper speech-to-text adapter

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::{Error, Result};

use super::SpeechToText;

const PROVIDER: &str = "whisper";
const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech to text via OpenAI Whisper
#[derive(Debug)]
pub struct WhisperStt {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl WhisperStt {
    /// Create a new Whisper STT adapter
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be constructed.
    pub fn new(api_key: String, model: String, timeout: std::time::Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Map the content-type hint to an upload file name the API accepts
    fn file_name(content_type: &str) -> &'static str {
        match content_type {
            "audio/webm" => "audio.webm",
            "audio/mpeg" | "audio/mp3" => "audio.mp3",
            "audio/ogg" => "audio.ogg",
            _ => "audio.wav",
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperStt {
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
        language: Option<&str>,
    ) -> ProviderResult<String> {
        tracing::debug!(
            audio_bytes = audio.len(),
            content_type,
            "starting Whisper transcription"
        );

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(Self::file_name(content_type))
            .mime_str(content_type)
            .map_err(|e| ProviderError::bad_response(PROVIDER, e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                ProviderError::transport(PROVIDER, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(ProviderError::bad_status(PROVIDER, status.as_u16(), body));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Whisper response");
            ProviderError::bad_response(PROVIDER, e.to_string())
        })?;

        let transcript = result.text.trim().to_string();
        if transcript.is_empty() {
            return Err(ProviderError::empty(PROVIDER, "transcript"));
        }

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_config_error() {
        let err = WhisperStt::new(
            String::new(),
            "whisper-1".to_string(),
            std::time::Duration::from_secs(30),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn file_name_follows_content_type() {
        assert_eq!(WhisperStt::file_name("audio/webm"), "audio.webm");
        assert_eq!(WhisperStt::file_name("audio/mpeg"), "audio.mp3");
        assert_eq!(WhisperStt::file_name("audio/wav"), "audio.wav");
        assert_eq!(WhisperStt::file_name("application/octet-stream"), "audio.wav");
    }
}
