//! Vocal Gateway - voice assistant turn orchestration
//!
//! This library chains three externally-hosted capabilities - speech-to-text,
//! a language model, and text-to-speech - into guaranteed-ordered
//! conversational turns, with provider fallback for synthesis and a
//! live-session regime for persistent audio/video conversations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Clients                         │
//! │   HTTP turn endpoints   │   live sessions (/connect) │
//! └───────────────┬──────────────────┬───────────────────┘
//!                 │                  │
//! ┌───────────────▼──────┐  ┌────────▼───────────────────┐
//! │   Turn Orchestrator  │  │      Session Manager       │
//! │  STT → LLM → TTS     │  │  signaling │ pipeline task │
//! └───────────────┬──────┘  └────────┬───────────────────┘
//!                 │                  │
//! ┌───────────────▼──────────────────▼───────────────────┐
//! │              Capability Providers                    │
//! │   Whisper  │  Gemini  │  ElevenLabs → OpenAI TTS     │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod providers;
pub mod sanitize;
pub mod session;
pub mod turn;

pub use api::ApiServer;
pub use config::{Config, TtsBackend};
pub use error::{Error, ProviderError, ProviderErrorKind, Result};
pub use providers::{
    ContextMessage, ElevenLabsTts, GeminiReply, OpenAiTts, ReplyGenerator, SpeakerChain,
    SpeechSynthesizer, SpeechToText, WhisperStt,
};
pub use sanitize::sanitize;
pub use session::{
    AnimationState, Animator, OutputFrame, SessionEvent, SessionManager, SignalingClient,
};
pub use turn::{Orchestrator, Turn, TurnInput, TurnOutcome, TurnStage};

use std::sync::Arc;

/// Build the orchestrator from configuration
///
/// Providers whose credentials are absent are left unconfigured and logged;
/// the matching operations report a configuration error at call time.
///
/// # Errors
///
/// Returns error only if an available provider fails to construct.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let stt: Option<Arc<dyn SpeechToText>> = match &config.api_keys.openai {
        Some(key) => Some(Arc::new(WhisperStt::new(
            key.clone(),
            config.stt.model.clone(),
            config.request_timeout,
        )?)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set, speech-to-text unavailable");
            None
        }
    };

    let llm: Option<Arc<dyn ReplyGenerator>> = match &config.api_keys.gemini {
        Some(key) => Some(Arc::new(GeminiReply::new(
            key.clone(),
            config.llm.model.clone(),
            config.request_timeout,
        )?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set, language replies unavailable");
            None
        }
    };

    let mut synthesizers: Vec<Arc<dyn SpeechSynthesizer>> = Vec::new();
    for backend in &config.tts_preference {
        match backend {
            TtsBackend::ElevenLabs => {
                if let Some(key) = &config.api_keys.elevenlabs {
                    synthesizers.push(Arc::new(ElevenLabsTts::new(
                        key.clone(),
                        config.tts.elevenlabs_voice.clone(),
                        config.tts.elevenlabs_model.clone(),
                        config.request_timeout,
                    )?));
                } else {
                    tracing::warn!("ELEVENLABS_API_KEY not set, skipping elevenlabs TTS");
                }
            }
            TtsBackend::OpenAi => {
                if let Some(key) = &config.api_keys.openai {
                    synthesizers.push(Arc::new(OpenAiTts::new(
                        key.clone(),
                        config.tts.openai_voice.clone(),
                        config.tts.openai_model.clone(),
                        config.request_timeout,
                    )?));
                } else {
                    tracing::warn!("OPENAI_API_KEY not set, skipping openai TTS");
                }
            }
        }
    }

    let speaker = match SpeakerChain::new(synthesizers) {
        Ok(chain) => {
            tracing::info!(providers = ?chain.provider_names(), "TTS fallback chain ready");
            Some(Arc::new(chain))
        }
        Err(_) => {
            tracing::warn!("no TTS credential set, speech synthesis unavailable");
            None
        }
    };

    Ok(Orchestrator::new(stt, llm, speaker))
}

/// Build the session manager from configuration
///
/// # Errors
///
/// Returns error if the signaling client cannot be constructed from a
/// present credential. An absent credential leaves signaling unconfigured.
pub fn build_session_manager(
    config: &Config,
    orchestrator: Orchestrator,
) -> Result<SessionManager> {
    let signaling = match &config.api_keys.daily {
        Some(key) => Some(Arc::new(SignalingClient::new(
            key.clone(),
            &config.signaling,
            config.request_timeout,
        )?)),
        None => {
            tracing::warn!("DAILY_API_KEY not set, live sessions unavailable");
            None
        }
    };

    Ok(SessionManager::new(
        signaling,
        orchestrator,
        config.session_ttl,
    ))
}
