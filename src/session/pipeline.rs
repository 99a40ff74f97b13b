//! Per-session frame pipeline
//!
//! Each live session owns one pipeline task fed by an ordered event queue
//! and producing an ordered frame stream. Captured utterances run full turns
//! through the shared orchestrator; speech-activity events drive the
//! animator; a disconnect event or the session deadline ends the loop.
//! Dropping the in-flight turn future at the `select!` is what makes
//! cancellation cooperative: once disconnect arrives, no later provider
//! stage runs.

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::providers::ContextMessage;
use crate::turn::{Orchestrator, TurnInput};

use super::animator::{AnimationState, Animator};

/// Event delivered to a session's pipeline
#[derive(Debug)]
pub enum SessionEvent {
    /// A participant joined; begin capturing their transcription stream
    ParticipantConnected { participant_id: String },
    /// One complete captured utterance, ready for a turn
    UtteranceCaptured {
        audio: Vec<u8>,
        content_type: String,
    },
    /// Bot speech activity began
    SpeechStarted,
    /// Bot speech activity ended
    SpeechStopped,
    /// The participant left; tear the session down
    ParticipantDisconnected,
}

/// Frame emitted by a session's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFrame {
    /// Synthesized `audio/mpeg` reply
    Audio(Vec<u8>),
    /// Animation cue for the client
    Cue(AnimationState),
}

/// One session's pipeline loop state
pub struct Pipeline {
    orchestrator: Orchestrator,
    events: mpsc::Receiver<SessionEvent>,
    frames: mpsc::Sender<OutputFrame>,
    language: Option<String>,
    deadline: Instant,
    /// Append-only for the session's lifetime; dropped wholesale on teardown
    context: Vec<ContextMessage>,
    capturing: Option<String>,
    animator: Animator,
}

impl Pipeline {
    /// Create a pipeline and its event/frame channel endpoints
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        language: Option<String>,
        ttl: std::time::Duration,
    ) -> (Self, mpsc::Sender<SessionEvent>, mpsc::Receiver<OutputFrame>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (frame_tx, frame_rx) = mpsc::channel(64);
        let pipeline = Self {
            orchestrator,
            events: event_rx,
            frames: frame_tx,
            language,
            deadline: Instant::now() + ttl,
            context: Vec::new(),
            capturing: None,
            animator: Animator::new(),
        };
        (pipeline, event_tx, frame_rx)
    }

    /// Run the pipeline until disconnect, deadline, or channel closure
    pub async fn run(mut self) {
        // Clients start on the quiet cue.
        if self.emit(OutputFrame::Cue(AnimationState::Quiet)).await.is_break() {
            return;
        }

        loop {
            tokio::select! {
                () = tokio::time::sleep_until(self.deadline) => {
                    tracing::warn!("session deadline reached without disconnect, tearing down");
                    break;
                }
                event = self.events.recv() => {
                    match event {
                        None | Some(SessionEvent::ParticipantDisconnected) => {
                            tracing::info!("participant disconnected, session pipeline ending");
                            break;
                        }
                        Some(event) => {
                            if self.handle(event).await.is_break() {
                                break;
                            }
                        }
                    }
                }
            }
        }
        // Conversation context is dropped with the pipeline: nothing
        // survives the session.
    }

    async fn handle(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::ParticipantConnected { participant_id } => {
                tracing::info!(participant = %participant_id, "capturing participant transcription");
                self.capturing = Some(participant_id);
                ControlFlow::Continue(())
            }
            SessionEvent::UtteranceCaptured {
                audio,
                content_type,
            } => {
                if self.capturing.is_none() {
                    // Capture starts at the connect event; anything earlier
                    // is not attributable to a participant.
                    tracing::warn!("utterance before any participant connected, dropping");
                    ControlFlow::Continue(())
                } else {
                    self.run_exchange(audio, content_type).await
                }
            }
            SessionEvent::SpeechStarted => {
                let cue = self.animator.speech_started();
                self.emit_cue(cue).await
            }
            SessionEvent::SpeechStopped => {
                let cue = self.animator.speech_stopped();
                self.emit_cue(cue).await
            }
            SessionEvent::ParticipantDisconnected => ControlFlow::Break(()),
        }
    }

    /// Run one full turn for a captured utterance, staying responsive to
    /// speech-activity events and cancelling if disconnect arrives mid-turn
    async fn run_exchange(&mut self, audio: Vec<u8>, content_type: String) -> ControlFlow<()> {
        let orchestrator = self.orchestrator.clone();
        let language = self.language.clone();
        let context = self.context.clone();
        let turn = async move {
            orchestrator
                .run_turn(
                    TurnInput::Audio {
                        bytes: audio,
                        content_type,
                    },
                    language.as_deref(),
                    &context,
                )
                .await
        };
        tokio::pin!(turn);

        loop {
            tokio::select! {
                () = tokio::time::sleep_until(self.deadline) => {
                    tracing::warn!("session deadline reached mid-turn, tearing down");
                    return ControlFlow::Break(());
                }
                outcome = &mut turn => {
                    match outcome {
                        Ok(outcome) => {
                            if let Some(transcript) = &outcome.transcript {
                                self.context.push(ContextMessage::user(transcript.clone()));
                            }
                            self.context.push(ContextMessage::model(outcome.reply_text.clone()));
                            if let Some(audio) = outcome.reply_audio {
                                return self.emit(OutputFrame::Audio(audio)).await;
                            }
                            return ControlFlow::Continue(());
                        }
                        Err(e) => {
                            // One failed exchange does not end the session.
                            tracing::error!(error = %e, "session turn failed");
                            return ControlFlow::Continue(());
                        }
                    }
                }
                event = self.events.recv() => {
                    match event {
                        None | Some(SessionEvent::ParticipantDisconnected) => {
                            // The turn future is dropped here; no further
                            // provider stage runs.
                            tracing::info!("disconnect mid-turn, cancelling exchange");
                            return ControlFlow::Break(());
                        }
                        Some(SessionEvent::SpeechStarted) => {
                            let cue = self.animator.speech_started();
                            if self.emit_cue(cue).await.is_break() {
                                return ControlFlow::Break(());
                            }
                        }
                        Some(SessionEvent::SpeechStopped) => {
                            let cue = self.animator.speech_stopped();
                            if self.emit_cue(cue).await.is_break() {
                                return ControlFlow::Break(());
                            }
                        }
                        Some(SessionEvent::ParticipantConnected { participant_id }) => {
                            self.capturing = Some(participant_id);
                        }
                        Some(SessionEvent::UtteranceCaptured { .. }) => {
                            // One in-flight exchange per session; utterances
                            // arriving mid-turn are dropped.
                            tracing::warn!("utterance captured mid-turn, dropping");
                        }
                    }
                }
            }
        }
    }

    async fn emit_cue(&mut self, cue: Option<AnimationState>) -> ControlFlow<()> {
        match cue {
            // Debounced transition: no frame.
            None => ControlFlow::Continue(()),
            Some(state) => self.emit(OutputFrame::Cue(state)).await,
        }
    }

    async fn emit(&mut self, frame: OutputFrame) -> ControlFlow<()> {
        if self.frames.send(frame).await.is_err() {
            tracing::debug!("frame receiver gone, session pipeline ending");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}
