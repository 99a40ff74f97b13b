//! Text-to-speech provider fallback chain
//!
//! TTS is the one capability with interchangeable backends, so it is the one
//! place the gateway retries: providers are tried strictly in configured
//! order, the first success wins, and only full exhaustion surfaces an error.

use std::sync::Arc;

use crate::error::{ProviderError, ProviderResult};
use crate::{Error, Result};

use super::SpeechSynthesizer;

/// Ordered chain of TTS providers
pub struct SpeakerChain {
    providers: Vec<Arc<dyn SpeechSynthesizer>>,
}

impl std::fmt::Debug for SpeakerChain {
    // Trait objects aren't Debug; the provider names are the useful part.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakerChain")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl SpeakerChain {
    /// Create a chain from an ordered provider list
    ///
    /// # Errors
    ///
    /// Returns error if the list is empty.
    pub fn new(providers: Vec<Arc<dyn SpeechSynthesizer>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::Config(
                "no TTS provider available: configure at least one TTS credential".to_string(),
            ));
        }
        Ok(Self { providers })
    }

    /// Number of providers in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain is empty (never true for a constructed chain)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in chain order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Synthesize `text`, falling over to the next provider on failure.
    ///
    /// Returns the first successful provider's audio without consulting the
    /// rest. If every provider fails, returns the last provider's error with
    /// the attempt count appended to its message.
    ///
    /// # Errors
    ///
    /// Returns the final [`ProviderError`] once all providers are exhausted.
    pub async fn speak(&self, text: &str, language: Option<&str>) -> ProviderResult<Vec<u8>> {
        let mut last_error: Option<ProviderError> = None;

        for (attempt, provider) in self.providers.iter().enumerate() {
            match provider.synthesize(text, language).await {
                Ok(audio) => {
                    if attempt > 0 {
                        tracing::info!(
                            provider = provider.name(),
                            attempt = attempt + 1,
                            "TTS fallback succeeded"
                        );
                    }
                    return Ok(audio);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        attempt = attempt + 1,
                        of = self.providers.len(),
                        error = %e,
                        "TTS provider failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        // Constructor guarantees at least one provider, so last_error is set.
        let mut err = last_error.unwrap_or_else(|| {
            ProviderError::bad_response("tts-chain", "no providers configured")
        });
        err.message = format!(
            "{} ({} providers attempted)",
            err.message,
            self.providers.len()
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_rejected() {
        let err = SpeakerChain::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
