//! Capability provider interfaces and vendor adapters
//!
//! Each remote capability (speech-to-text, language reply, text-to-speech)
//! is one trait with one primary operation. Vendor selection happens at
//! configuration time by constructing the matching adapter; nothing inspects
//! provider types at runtime.

pub mod elevenlabs;
pub mod fallback;
pub mod gemini;
pub mod openai_tts;
pub mod whisper;

pub use elevenlabs::ElevenLabsTts;
pub use fallback::SpeakerChain;
pub use gemini::GeminiReply;
pub use openai_tts::OpenAiTts;
pub use whisper::WhisperStt;

use async_trait::async_trait;

use crate::error::ProviderResult;

/// One prior exchange in a session's conversation context
#[derive(Debug, Clone)]
pub struct ContextMessage {
    /// `"user"` or `"model"`
    pub role: &'static str,
    /// Message text
    pub text: String,
}

impl ContextMessage {
    /// A user-authored context entry
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            text: text.into(),
        }
    }

    /// A model-authored context entry
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model",
            text: text.into(),
        }
    }
}

/// Speech-to-text capability
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe audio to text.
    ///
    /// An empty transcript from the backend is an error, never a valid
    /// empty result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProviderError`] on transport failure, non-2xx
    /// response, unparseable response, or empty transcript.
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
        language: Option<&str>,
    ) -> ProviderResult<String>;
}

/// Language-reply capability
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply to `text`, honoring the requested reply language
    /// and the session's prior conversation context.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProviderError`] if the backend is unreachable,
    /// mis-configured, or returns a response without extractable text.
    async fn generate(
        &self,
        text: &str,
        language: Option<&str>,
        context: &[ContextMessage],
    ) -> ProviderResult<String>;
}

/// Text-to-speech capability
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider name, used in fallback logging and error payloads
    fn name(&self) -> &'static str;

    /// Synthesize `text` into MP3 (`audio/mpeg`) bytes.
    ///
    /// Implementations truncate over-long input to their per-provider limit
    /// rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProviderError`] on transport failure, non-2xx
    /// response, or empty audio payload.
    async fn synthesize(&self, text: &str, language: Option<&str>) -> ProviderResult<Vec<u8>>;
}

/// Truncate `text` to at most `limit` characters, on a char boundary
///
/// Cloud TTS providers bill per character and cap request size; longer input
/// is cut rather than rejected.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_noop_under_limit() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn truncate_cuts_at_char_boundary() {
        assert_eq!(truncate_chars("привіт", 3), "при");
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
    }

    #[test]
    fn context_message_roles() {
        assert_eq!(ContextMessage::user("hi").role, "user");
        assert_eq!(ContextMessage::model("hello").role, "model");
    }
}
