//! Shared test utilities: scripted capability providers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vocal_gateway::error::{ProviderError, ProviderResult};
use vocal_gateway::providers::{ContextMessage, ReplyGenerator, SpeechSynthesizer, SpeechToText};

/// STT stub returning a fixed transcript
pub struct MockStt {
    transcript: String,
    fail: bool,
    calls: AtomicUsize,
}

impl MockStt {
    #[must_use]
    pub fn new(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    /// An STT stub that always fails with an empty-transcript error
    #[must_use]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            transcript: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for MockStt {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _content_type: &str,
        _language: Option<&str>,
    ) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::empty("mock-stt", "transcript"));
        }
        Ok(self.transcript.clone())
    }
}

/// Reply stub returning a fixed reply, with an optional artificial delay
/// for cancellation tests
pub struct MockLlm {
    reply: String,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockLlm {
    #[must_use]
    pub fn new(reply: &str) -> Arc<Self> {
        Self::with_delay(reply, Duration::ZERO)
    }

    #[must_use]
    pub fn with_delay(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inputs this stub was asked to reply to, in call order
    #[must_use]
    pub fn seen_inputs(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for MockLlm {
    async fn generate(
        &self,
        text: &str,
        _language: Option<&str>,
        _context: &[ContextMessage],
    ) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// TTS stub with a scripted outcome, recording what it was asked to speak
pub struct MockTts {
    name: &'static str,
    outcome: Result<Vec<u8>, ProviderError>,
    calls: AtomicUsize,
    spoken: Mutex<Vec<String>>,
}

impl MockTts {
    #[must_use]
    pub fn healthy(name: &'static str, audio: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Ok(audio),
            calls: AtomicUsize::new(0),
            spoken: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn failing(name: &'static str, error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Err(error),
            calls: AtomicUsize::new(0),
            spoken: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts this stub was asked to synthesize, in call order
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockTts {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn synthesize(&self, text: &str, _language: Option<&str>) -> ProviderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.spoken.lock().unwrap().push(text.to_string());
        self.outcome.clone()
    }
}
