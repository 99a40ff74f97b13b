//! Google Gemini language-reply adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};
use crate::{Error, Result};

use super::{ContextMessage, ReplyGenerator};

const PROVIDER: &str = "gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reply languages with a dedicated system instruction
const RECOGNIZED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "Reply in English."),
    ("ru", "Отвечай на русском языке."),
    ("uk", "Відповідай українською мовою."),
    ("es", "Responde en español."),
    ("de", "Antworte auf Deutsch."),
    ("fr", "Réponds en français."),
];

const DEFAULT_INSTRUCTION: &str = "Reply in the same language as the user.";

const STYLE_INSTRUCTION: &str =
    "Be concise and natural, as in spoken conversation. Use minimal markdown.";

/// Build the system instruction for a requested reply language
///
/// Unrecognized codes fall back to the default instruction rather than
/// failing the turn.
#[must_use]
pub fn system_instruction(language: Option<&str>) -> String {
    let language_part = language
        .and_then(|code| {
            RECOGNIZED_LANGUAGES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(code))
                .map(|(_, instruction)| *instruction)
        })
        .unwrap_or(DEFAULT_INSTRUCTION);
    format!("{language_part} {STYLE_INSTRUCTION}")
}

#[derive(Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Generates conversational replies via the Gemini REST API
#[derive(Debug)]
pub struct GeminiReply {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiReply {
    /// Create a new Gemini reply adapter
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be constructed.
    pub fn new(api_key: String, model: String, timeout: std::time::Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    fn text_content(role: &str, text: &str) -> Content {
        Content {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[async_trait]
impl ReplyGenerator for GeminiReply {
    async fn generate(
        &self,
        text: &str,
        language: Option<&str>,
        context: &[ContextMessage],
    ) -> ProviderResult<String> {
        tracing::debug!(
            language = language.unwrap_or("auto"),
            context_len = context.len(),
            "starting Gemini generation"
        );

        let mut contents: Vec<Content> = context
            .iter()
            .map(|m| Self::text_content(m.role, &m.text))
            .collect();
        contents.push(Self::text_content("user", text));

        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_instruction(language)),
                }],
            },
            contents,
        };

        let url = format!("{BASE_URL}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request failed");
                ProviderError::transport(PROVIDER, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(ProviderError::bad_status(PROVIDER, status.as_u16(), body));
        }

        let result: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Gemini response");
            ProviderError::bad_response(PROVIDER, e.to_string())
        })?;

        let reply = extract_reply(result)?;

        tracing::info!(reply_chars = reply.len(), "generation complete");
        Ok(reply)
    }
}

/// Pull the reply text out of a parsed response
///
/// A candidate without any text part (e.g. safety-blocked) is a malformed
/// response; text that is present but blank is an empty result. The raw
/// response object is never handed to the user either way.
fn extract_reply(response: GenerateResponse) -> ProviderResult<String> {
    let text = response
        .candidates
        .into_iter()
        .find_map(|c| {
            c.content
                .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
        })
        .ok_or_else(|| {
            ProviderError::bad_response(PROVIDER, "response has no extractable text")
        })?;

    let reply = text.trim().to_string();
    if reply.is_empty() {
        return Err(ProviderError::empty(PROVIDER, "reply"));
    }
    Ok(reply)
}
