//! Turn orchestration: one user input through STT, LLM, and TTS
//!
//! A turn's stages are strictly sequential and data-dependent; each stage's
//! output feeds the next. The orchestrator holds only shared provider
//! handles; all per-turn state lives in the in-flight [`Turn`].

use std::sync::Arc;

use crate::error::ProviderError;
use crate::providers::{ContextMessage, ReplyGenerator, SpeakerChain, SpeechToText};
use crate::sanitize::sanitize;
use crate::{Error, Result};

/// One user utterance or typed request
#[derive(Debug, Clone)]
pub enum TurnInput {
    /// Recorded audio with its content type (e.g. `audio/webm`)
    Audio {
        bytes: Vec<u8>,
        content_type: String,
    },
    /// Already-typed text
    Text(String),
}

/// Lifecycle stage of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Received,
    Transcribing,
    Generating,
    Synthesizing,
    Complete,
    Errored,
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Transcribing => "transcribing",
            Self::Generating => "generating",
            Self::Synthesizing => "synthesizing",
            Self::Complete => "complete",
            Self::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// An in-flight turn
///
/// Created when a request arrives, dropped after the response is sent.
/// Nothing here persists across turns except what the caller copies into a
/// session's conversation context.
#[derive(Debug)]
pub struct Turn {
    pub input: TurnInput,
    pub language: Option<String>,
    pub stage: TurnStage,
    pub transcript: Option<String>,
    pub reply_text: Option<String>,
    pub reply_audio: Option<Vec<u8>>,
}

impl Turn {
    /// Create a turn in the `Received` stage
    #[must_use]
    pub fn new(input: TurnInput, language: Option<String>) -> Self {
        Self {
            input,
            language,
            stage: TurnStage::Received,
            transcript: None,
            reply_text: None,
            reply_audio: None,
        }
    }

    fn advance(&mut self, to: TurnStage) {
        tracing::debug!(from = %self.stage, to = %to, "turn stage transition");
        self.stage = to;
    }

    fn fail(&mut self, err: ProviderError) -> Error {
        tracing::error!(stage = %self.stage, error = %err, "turn failed");
        self.stage = TurnStage::Errored;
        // An errored turn never carries audio.
        self.reply_audio = None;
        Error::Provider(err)
    }
}

/// Completed turn payload
#[derive(Debug)]
pub struct TurnOutcome {
    /// Transcript, when the input was audio
    pub transcript: Option<String>,
    /// Sanitized reply text sent to synthesis
    pub reply_text: String,
    /// Synthesized `audio/mpeg` reply, when synthesis ran
    pub reply_audio: Option<Vec<u8>>,
}

/// Drives turns through the capability providers
///
/// Provider slots are optional: a missing credential leaves its capability
/// unavailable and the matching operations report a configuration error
/// instead of failing at startup.
#[derive(Clone)]
pub struct Orchestrator {
    stt: Option<Arc<dyn SpeechToText>>,
    llm: Option<Arc<dyn ReplyGenerator>>,
    speaker: Option<Arc<SpeakerChain>>,
}

impl Orchestrator {
    /// Create an orchestrator over the available providers
    #[must_use]
    pub fn new(
        stt: Option<Arc<dyn SpeechToText>>,
        llm: Option<Arc<dyn ReplyGenerator>>,
        speaker: Option<Arc<SpeakerChain>>,
    ) -> Self {
        Self { stt, llm, speaker }
    }

    fn stt(&self) -> Result<&Arc<dyn SpeechToText>> {
        self.stt
            .as_ref()
            .ok_or_else(|| Error::Config("speech-to-text not configured".to_string()))
    }

    fn llm(&self) -> Result<&Arc<dyn ReplyGenerator>> {
        self.llm
            .as_ref()
            .ok_or_else(|| Error::Config("language model not configured".to_string()))
    }

    fn speaker(&self) -> Result<&Arc<SpeakerChain>> {
        self.speaker
            .as_ref()
            .ok_or_else(|| Error::Config("text-to-speech not configured".to_string()))
    }

    /// Transcribe audio without running the rest of the turn
    ///
    /// # Errors
    ///
    /// Returns error if STT is unconfigured or the provider fails.
    pub async fn run_transcription(&self, audio: &[u8], content_type: &str) -> Result<String> {
        let stt = self.stt()?;
        Ok(stt.transcribe(audio, content_type, None).await?)
    }

    /// Generate a reply without synthesis
    ///
    /// # Errors
    ///
    /// Returns error if the LLM is unconfigured or the provider fails.
    pub async fn run_chat(
        &self,
        text: &str,
        language: Option<&str>,
        context: &[ContextMessage],
    ) -> Result<String> {
        let llm = self.llm()?;
        Ok(llm.generate(text, language, context).await?)
    }

    /// Sanitize and synthesize text through the fallback chain
    ///
    /// # Errors
    ///
    /// Returns error if TTS is unconfigured or all providers fail.
    pub async fn run_speech(&self, text: &str, language: Option<&str>) -> Result<Vec<u8>> {
        let speaker = self.speaker()?;
        let clean = sanitize(text);
        Ok(speaker.speak(&clean, language).await?)
    }

    /// Run one full turn: transcribe (audio input only), generate, sanitize,
    /// synthesize.
    ///
    /// Stages run strictly in order; the first provider failure aborts the
    /// remaining stages of this turn only.
    ///
    /// # Errors
    ///
    /// Returns error if a required provider is unconfigured or a stage
    /// fails.
    pub async fn run_turn(
        &self,
        input: TurnInput,
        language: Option<&str>,
        context: &[ContextMessage],
    ) -> Result<TurnOutcome> {
        let mut turn = Turn::new(input, language.map(ToString::to_string));

        // The input is cloned out of the turn; the stage updates below need
        // the turn itself mutable while the provider call runs.
        let user_text = match turn.input.clone() {
            TurnInput::Audio {
                bytes,
                content_type,
            } => {
                let stt = self.stt()?;
                turn.advance(TurnStage::Transcribing);
                let transcript = match stt
                    .transcribe(&bytes, &content_type, turn.language.as_deref())
                    .await
                {
                    Ok(t) => t,
                    Err(e) => return Err(turn.fail(e)),
                };
                turn.transcript = Some(transcript.clone());
                transcript
            }
            // Text input skips transcription entirely.
            TurnInput::Text(text) => text,
        };

        let llm = self.llm()?;
        turn.advance(TurnStage::Generating);
        let reply = match llm
            .generate(&user_text, turn.language.as_deref(), context)
            .await
        {
            Ok(r) => r,
            Err(e) => return Err(turn.fail(e)),
        };
        let clean = sanitize(&reply);
        turn.reply_text = Some(clean.clone());

        let speaker = self.speaker()?;
        turn.advance(TurnStage::Synthesizing);
        let audio = match speaker.speak(&clean, turn.language.as_deref()).await {
            Ok(a) => a,
            Err(e) => return Err(turn.fail(e)),
        };
        turn.reply_audio = Some(audio);

        turn.advance(TurnStage::Complete);
        Ok(TurnOutcome {
            transcript: turn.transcript,
            reply_text: clean,
            reply_audio: turn.reply_audio,
        })
    }
}
