//! Live session management
//!
//! A session binds one signaling room, one credential pair, and one running
//! pipeline task. The manager owns every pipeline's `JoinHandle`; teardown
//! is the disconnect event or the session TTL, never a leaked task.

pub mod animator;
pub mod pipeline;
pub mod signaling;

pub use animator::{AnimationState, Animator};
pub use pipeline::{OutputFrame, Pipeline, SessionEvent};
pub use signaling::SignalingClient;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};

use crate::turn::Orchestrator;
use crate::{Error, Result};

/// Credentials for one live session
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    /// Room join URL
    pub room_url: String,
    /// Owner token for the human participant
    pub user_token: String,
    /// Restricted token for the bot participant
    pub bot_token: String,
}

/// Result of a `/connect`: credentials plus the started bot session
#[derive(Debug, Clone)]
pub struct ConnectedSession {
    pub session_id: String,
    pub room_url: String,
    /// The user's token; the bot keeps its own
    pub token: String,
}

/// A running session's handles
struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    task: tokio::task::JoinHandle<()>,
}

/// Owns live sessions and their pipeline tasks
pub struct SessionManager {
    signaling: Option<Arc<SignalingClient>>,
    orchestrator: Orchestrator,
    session_ttl: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    /// Create a session manager
    ///
    /// `signaling` is `None` when no signaling credential is configured;
    /// session creation then fails with a configuration error while the
    /// rest of the gateway runs normally.
    #[must_use]
    pub fn new(
        signaling: Option<Arc<SignalingClient>>,
        orchestrator: Orchestrator,
        session_ttl: Duration,
    ) -> Self {
        Self {
            signaling,
            orchestrator,
            session_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn signaling(&self) -> Result<&Arc<SignalingClient>> {
        self.signaling
            .as_ref()
            .ok_or_else(|| Error::Config("signaling service not configured".to_string()))
    }

    /// Create a room and mint the user/bot credential pair
    ///
    /// # Errors
    ///
    /// Returns error if signaling is unconfigured or the service rejects
    /// a request.
    pub async fn create_session(&self) -> Result<SessionCredentials> {
        let signaling = self.signaling()?;
        let room = signaling.create_room().await?;
        let user_token = signaling.create_token(&room.name, true).await?;
        let bot_token = signaling.create_token(&room.name, false).await?;
        Ok(SessionCredentials {
            room_url: room.url,
            user_token,
            bot_token,
        })
    }

    /// Launch the per-session pipeline task and return immediately
    ///
    /// The returned frame receiver carries the pipeline's ordered output;
    /// the task handle stays owned by the manager for teardown.
    pub async fn start_bot(
        &self,
        room_url: &str,
        _bot_token: &str,
    ) -> (String, mpsc::Receiver<OutputFrame>) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (pipeline, events, frames) =
            Pipeline::new(self.orchestrator.clone(), None, self.session_ttl);

        tracing::info!(session = %session_id, room = %room_url, "starting bot pipeline");
        let task = tokio::spawn(pipeline.run());

        let mut sessions = self.sessions.write().await;
        // Sweep sessions whose pipeline already ended (TTL or disconnect).
        sessions.retain(|id, handle| {
            let alive = !handle.task.is_finished();
            if !alive {
                tracing::debug!(session = %id, "removing finished session");
            }
            alive
        });
        sessions.insert(session_id.clone(), SessionHandle { events, task });

        (session_id, frames)
    }

    /// Create a session and start its bot: the `/connect` operation
    ///
    /// # Errors
    ///
    /// Returns error if session creation fails; the bot is only started
    /// after credentials exist.
    pub async fn connect(&self) -> Result<ConnectedSession> {
        let credentials = self.create_session().await?;
        let (session_id, mut frames) = self
            .start_bot(&credentials.room_url, &credentials.bot_token)
            .await;

        // The media transport is out of scope; drain the frame stream so
        // the pipeline never blocks on a full channel. The drain ends when
        // the pipeline drops its sender.
        let drain_session = session_id.clone();
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                match frame {
                    OutputFrame::Audio(bytes) => {
                        tracing::debug!(session = %drain_session, audio_bytes = bytes.len(), "bot audio frame");
                    }
                    OutputFrame::Cue(state) => {
                        tracing::debug!(session = %drain_session, state = ?state, "bot animation cue");
                    }
                }
            }
        });

        Ok(ConnectedSession {
            session_id,
            room_url: credentials.room_url,
            token: credentials.user_token,
        })
    }

    /// Deliver an event to a session's pipeline
    ///
    /// # Errors
    ///
    /// Returns error if the session is unknown or its pipeline has ended.
    pub async fn send_event(&self, session_id: &str, event: SessionEvent) -> Result<()> {
        let sessions = self.sessions.read().await;
        let handle = sessions
            .get(session_id)
            .ok_or_else(|| Error::Session(format!("unknown session: {session_id}")))?;
        handle
            .events
            .send(event)
            .await
            .map_err(|_| Error::Session(format!("session pipeline ended: {session_id}")))
    }

    /// A participant joined: begin capturing their transcription stream
    ///
    /// # Errors
    ///
    /// Returns error if the session is unknown or its pipeline has ended.
    pub async fn participant_connected(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<()> {
        self.send_event(
            session_id,
            SessionEvent::ParticipantConnected {
                participant_id: participant_id.to_string(),
            },
        )
        .await
    }

    /// The participant left: cancel the pipeline and drop the session
    ///
    /// The disconnect event is delivered best-effort for an orderly stop;
    /// the abort guarantees any in-flight provider call is cancelled
    /// immediately so it stops consuming upstream resources.
    ///
    /// # Errors
    ///
    /// Returns error if the session is unknown.
    pub async fn participant_disconnected(&self, session_id: &str) -> Result<()> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            sessions
                .remove(session_id)
                .ok_or_else(|| Error::Session(format!("unknown session: {session_id}")))?
        };
        let _ = handle.events.try_send(SessionEvent::ParticipantDisconnected);
        handle.task.abort();
        tracing::info!(session = %session_id, "session torn down");
        Ok(())
    }

    /// Number of sessions with a live pipeline task
    pub async fn active_sessions(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|h| !h.task.is_finished()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_without_signaling() -> SessionManager {
        SessionManager::new(
            None,
            Orchestrator::new(None, None, None),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn create_session_without_signaling_is_config_error() {
        let manager = manager_without_signaling();
        let err = manager.create_session().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let manager = manager_without_signaling();
        let err = manager
            .participant_disconnected("no-such-session")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Session(_)));
    }

    #[tokio::test]
    async fn start_bot_registers_and_disconnect_removes() {
        let manager = manager_without_signaling();
        let (session_id, _frames) = manager.start_bot("https://rooms.example/abc", "tok").await;
        assert_eq!(manager.active_sessions().await, 1);

        manager.participant_disconnected(&session_id).await.unwrap();
        assert_eq!(manager.active_sessions().await, 0);
    }
}
