//! Turn and session endpoints
//!
//! The synchronous regime exposes one endpoint per pipeline stage
//! (`/transcribe`, `/chat`, `/speak`); the live regime exposes `/connect`.
//! Every failure returns a structured JSON payload, never a stack trace;
//! upstream detail rides in `status`/`details` for operators.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ProviderError, ProviderErrorKind};

use super::ApiState;

/// Build the gateway router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/status", get(status))
        .route("/transcribe", post(transcribe))
        .route("/chat", post(chat))
        .route("/speak", post(speak))
        .route("/connect", post(connect))
        .with_state(state)
}

/// Status response
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness: is the gateway running?
async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Voice Assistant API running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Transcription response
#[derive(Debug, Serialize)]
struct TranscribeResponse {
    text: String,
}

/// Transcribe an uploaded audio clip
///
/// Accepts a multipart form with an `audio` field.
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart body"))?
    {
        if field.name() == Some("audio") {
            let content_type = field
                .content_type()
                .unwrap_or("audio/webm")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::BadRequest("Unreadable audio field"))?;
            audio = Some((bytes.to_vec(), content_type));
        }
    }

    let Some((bytes, content_type)) = audio else {
        return Err(ApiError::BadRequest("No audio file provided"));
    };
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("No audio file provided"));
    }

    let text = state
        .orchestrator
        .run_transcription(&bytes, &content_type)
        .await?;

    Ok(Json(TranscribeResponse { text }))
}

/// Chat request
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    text: String,
    language: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

/// Generate a reply for typed text
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("No text provided"));
    }

    let response = state
        .orchestrator
        .run_chat(&request.text, request.language.as_deref(), &[])
        .await?;

    Ok(Json(ChatResponse { response }))
}

/// Speech request
#[derive(Debug, Deserialize)]
struct SpeakRequest {
    #[serde(default)]
    text: String,
    language: Option<String>,
}

/// Synthesize speech for text
///
/// Returns raw `audio/mpeg` bytes. The text is sanitized before synthesis.
async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("No text provided"));
    }

    let audio = state
        .orchestrator
        .run_speech(&request.text, request.language.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    )
        .into_response())
}

/// Connect response
#[derive(Debug, Serialize)]
struct ConnectResponse {
    room_url: String,
    token: String,
}

/// Create a live session: room, credentials, and a running bot pipeline
async fn connect(State(state): State<Arc<ApiState>>) -> Result<Json<ConnectResponse>, ApiError> {
    let session = state.sessions.connect().await?;
    Ok(Json(ConnectResponse {
        room_url: session.room_url,
        token: session.token,
    }))
}

/// API errors, mapped to structured JSON payloads
#[derive(Debug)]
enum ApiError {
    /// Missing or empty required field
    BadRequest(&'static str),
    /// Required credential absent
    NotConfigured(String),
    /// A capability provider failed
    Provider(ProviderError),
    /// The signaling service failed
    Signaling(String),
    /// Anything else
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Config(msg) => Self::NotConfigured(msg),
            Error::Provider(p) => Self::Provider(p),
            Error::Session(msg) => Self::Signaling(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Failure payload: flat `error` plus optional upstream detail
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg.to_string(),
                    status: None,
                    details: None,
                },
            ),
            Self::NotConfigured(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: msg,
                    status: None,
                    details: None,
                },
            ),
            Self::Provider(p) => {
                let upstream_failed = p.status.is_some()
                    || p.kind == ProviderErrorKind::Transport;
                let http_status = if upstream_failed {
                    StatusCode::BAD_GATEWAY
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (
                    http_status,
                    ErrorResponse {
                        error: p.to_string(),
                        status: p.status,
                        details: p.body,
                    },
                )
            }
            Self::Signaling(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: msg,
                    status: None,
                    details: None,
                },
            ),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: msg,
                    status: None,
                    details: None,
                },
            ),
        };

        (status, Json(payload)).into_response()
    }
}
