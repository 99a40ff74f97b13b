//! Configuration management for the vocal gateway
//!
//! Configuration is read from the environment exactly once at startup and
//! passed into components as an immutable value. Nothing re-reads the
//! environment at call time.

use std::time::Duration;

use crate::{Error, Result};

/// Default upstream request timeout for provider calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default live-session time-to-live
///
/// A session whose disconnect event never arrives is torn down when this
/// deadline passes.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// Vocal gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API keys for external capability providers
    pub api_keys: ApiKeys,

    /// TTS provider preference order
    pub tts_preference: Vec<TtsBackend>,

    /// Speech-to-text settings
    pub stt: SttConfig,

    /// Language-model settings
    pub llm: LlmConfig,

    /// Text-to-speech settings
    pub tts: TtsConfig,

    /// Signaling service (Daily) settings for the live-session regime
    pub signaling: SignalingConfig,

    /// Upstream request timeout for provider calls
    pub request_timeout: Duration,

    /// Live-session time-to-live
    pub session_ttl: Duration,
}

/// API keys for external services
///
/// Every key is optional at load time; a provider whose key is absent is
/// marked unavailable rather than failing startup.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper STT and fallback TTS)
    pub openai: Option<String>,

    /// Google Gemini API key (language replies)
    pub gemini: Option<String>,

    /// `ElevenLabs` API key (preferred TTS)
    pub elevenlabs: Option<String>,

    /// Daily API key (live-session signaling)
    pub daily: Option<String>,
}

/// A text-to-speech backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsBackend {
    ElevenLabs,
    OpenAi,
}

impl TtsBackend {
    /// Parse a backend name from the preference list
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "elevenlabs" => Some(Self::ElevenLabs),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

/// Speech-to-text settings
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Whisper model identifier
    pub model: String,
}

/// Language-model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gemini model identifier
    pub model: String,
}

/// Text-to-speech settings
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// `ElevenLabs` voice identifier
    pub elevenlabs_voice: String,

    /// `ElevenLabs` model identifier
    pub elevenlabs_model: String,

    /// `OpenAI` TTS voice
    pub openai_voice: String,

    /// `OpenAI` TTS model
    pub openai_model: String,
}

/// Signaling service settings for the live-session regime
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// REST base URL (e.g. `https://api.daily.co/v1`)
    pub base_url: String,

    /// Room expiry applied at creation time
    pub room_expiry: Duration,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `GEMINI_API_KEY`,
    /// `ELEVENLABS_API_KEY`, `DAILY_API_KEY`, `DAILY_API_URL`,
    /// `VOCAL_TTS_PREFERENCE`, `VOCAL_REQUEST_TIMEOUT_SECS`,
    /// `VOCAL_SESSION_TTL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns error if `VOCAL_TTS_PREFERENCE` names an unknown backend.
    pub fn from_env() -> Result<Self> {
        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            daily: std::env::var("DAILY_API_KEY").ok().filter(|k| !k.is_empty()),
        };

        let tts_preference = match std::env::var("VOCAL_TTS_PREFERENCE") {
            Ok(list) => Self::parse_tts_preference(&list)?,
            Err(_) => vec![TtsBackend::ElevenLabs, TtsBackend::OpenAi],
        };

        let request_timeout = std::env::var("VOCAL_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

        let session_ttl = std::env::var("VOCAL_SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map_or(DEFAULT_SESSION_TTL, Duration::from_secs);

        Ok(Self {
            api_keys,
            tts_preference,
            stt: SttConfig {
                model: std::env::var("VOCAL_STT_MODEL")
                    .unwrap_or_else(|_| "whisper-1".to_string()),
            },
            llm: LlmConfig {
                model: std::env::var("VOCAL_LLM_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            },
            tts: TtsConfig {
                elevenlabs_voice: std::env::var("VOCAL_ELEVENLABS_VOICE")
                    .unwrap_or_else(|_| "21m00Tcm4TlvDq8ikWAM".to_string()),
                elevenlabs_model: std::env::var("VOCAL_ELEVENLABS_MODEL")
                    .unwrap_or_else(|_| "eleven_multilingual_v2".to_string()),
                openai_voice: std::env::var("VOCAL_OPENAI_TTS_VOICE")
                    .unwrap_or_else(|_| "alloy".to_string()),
                openai_model: std::env::var("VOCAL_OPENAI_TTS_MODEL")
                    .unwrap_or_else(|_| "tts-1".to_string()),
            },
            signaling: SignalingConfig {
                base_url: std::env::var("DAILY_API_URL")
                    .unwrap_or_else(|_| "https://api.daily.co/v1".to_string()),
                room_expiry: Duration::from_secs(300),
            },
            request_timeout,
            session_ttl,
        })
    }

    /// Parse a comma-separated TTS preference list
    ///
    /// # Errors
    ///
    /// Returns error if an entry names an unknown backend.
    pub fn parse_tts_preference(list: &str) -> Result<Vec<TtsBackend>> {
        let mut backends = Vec::new();
        for entry in list.split(',').filter(|e| !e.trim().is_empty()) {
            let backend = TtsBackend::parse(entry).ok_or_else(|| {
                Error::Config(format!("unknown TTS backend in preference list: {entry}"))
            })?;
            if !backends.contains(&backend) {
                backends.push(backend);
            }
        }
        if backends.is_empty() {
            return Err(Error::Config(
                "TTS preference list must name at least one backend".to_string(),
            ));
        }
        Ok(backends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tts_preference_parses_in_order() {
        let backends = Config::parse_tts_preference("openai,elevenlabs").unwrap();
        assert_eq!(backends, vec![TtsBackend::OpenAi, TtsBackend::ElevenLabs]);
    }

    #[test]
    fn tts_preference_deduplicates() {
        let backends = Config::parse_tts_preference("elevenlabs, elevenlabs ,openai").unwrap();
        assert_eq!(backends, vec![TtsBackend::ElevenLabs, TtsBackend::OpenAi]);
    }

    #[test]
    fn tts_preference_rejects_unknown_backend() {
        let err = Config::parse_tts_preference("espeak").unwrap_err();
        assert!(err.to_string().contains("espeak"));
    }

    #[test]
    fn tts_preference_rejects_empty_list() {
        assert!(Config::parse_tts_preference(" , ").is_err());
    }

    #[test]
    fn backend_names_are_case_insensitive() {
        assert_eq!(TtsBackend::parse("ElevenLabs"), Some(TtsBackend::ElevenLabs));
        assert_eq!(TtsBackend::parse("OPENAI"), Some(TtsBackend::OpenAi));
        assert_eq!(TtsBackend::parse("festival"), None);
    }
}
