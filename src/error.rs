//! Error types for the vocal gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a single capability-provider call
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur in the vocal gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing or invalid credential/setting)
    #[error("configuration error: {0}")]
    Config(String),

    /// A remote capability provider failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Live session error (signaling or lifecycle)
    #[error("session error: {0}")]
    Session(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The provider could not be reached (connect, DNS, timeout)
    Transport,
    /// The provider rejected our credential
    Auth,
    /// The provider answered with a non-2xx status or an unparseable body
    BadResponse,
    /// The provider answered 2xx but the payload was empty
    EmptyResult,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::BadResponse => "bad response",
            Self::EmptyResult => "empty result",
        };
        f.write_str(s)
    }
}

/// Typed failure from one STT/LLM/TTS call
///
/// Success and failure are exclusive: a provider call either yields its full
/// payload or one of these.
#[derive(Debug, Clone, Error)]
#[error("{provider} {kind} error: {message}")]
pub struct ProviderError {
    /// Failure classification
    pub kind: ProviderErrorKind,
    /// Provider name (e.g. "whisper", "elevenlabs")
    pub provider: &'static str,
    /// Upstream HTTP status, when one was received
    pub status: Option<u16>,
    /// Short human-readable description
    pub message: String,
    /// Raw upstream response body, retained for operator diagnostics
    pub body: Option<String>,
}

impl ProviderError {
    /// Create a transport-level failure (no usable response received)
    pub fn transport(provider: &'static str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() {
            ProviderErrorKind::Transport
        } else {
            ProviderErrorKind::BadResponse
        };
        Self {
            kind,
            provider,
            status: None,
            message: err.to_string(),
            body: None,
        }
    }

    /// Create a failure from a non-2xx upstream response
    #[must_use]
    pub fn bad_status(provider: &'static str, status: u16, body: String) -> Self {
        let kind = if status == 401 || status == 403 {
            ProviderErrorKind::Auth
        } else {
            ProviderErrorKind::BadResponse
        };
        Self {
            kind,
            provider,
            status: Some(status),
            message: format!("upstream returned HTTP {status}"),
            body: Some(body),
        }
    }

    /// Create a failure for a 2xx response whose payload could not be used
    #[must_use]
    pub fn bad_response(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::BadResponse,
            provider,
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Create a failure for an empty transcript/reply/audio payload
    #[must_use]
    pub fn empty(provider: &'static str, what: &str) -> Self {
        Self {
            kind: ProviderErrorKind::EmptyResult,
            provider,
            status: None,
            message: format!("provider returned empty {what}"),
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_status_401_classifies_as_auth() {
        let err = ProviderError::bad_status("whisper", 401, "unauthorized".to_string());
        assert_eq!(err.kind, ProviderErrorKind::Auth);
        assert_eq!(err.status, Some(401));
    }

    #[test]
    fn bad_status_500_classifies_as_bad_response() {
        let err = ProviderError::bad_status("gemini", 500, String::new());
        assert_eq!(err.kind, ProviderErrorKind::BadResponse);
    }

    #[test]
    fn empty_result_names_the_payload() {
        let err = ProviderError::empty("whisper", "transcript");
        assert_eq!(err.kind, ProviderErrorKind::EmptyResult);
        assert!(err.message.contains("transcript"));
    }

    #[test]
    fn display_includes_provider_and_kind() {
        let err = ProviderError::bad_status("elevenlabs", 502, String::new());
        let s = err.to_string();
        assert!(s.contains("elevenlabs"));
        assert!(s.contains("bad response"));
    }
}
