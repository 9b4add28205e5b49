//! Segment translation through an OpenAI-style chat-completions API.
//!
//! Each transcript segment is translated individually so one malformed LLM
//! reply cannot corrupt the whole transcript, and timing information is
//! carried through untouched. Replies are scrubbed of the framing chatter
//! LLMs like to add before the translation itself.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::transcript::{TranscriptSegment, TranslatedSegment};
use crate::services::languages;

const MAX_TOKENS: u32 = 4000;

/// Translates timed transcript segments into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Silence segments are dropped, so the output may be shorter than the
    /// input; surviving segments keep their order and timestamps.
    async fn translate(
        &self,
        segments: &[TranscriptSegment],
        target_language: &str,
    ) -> Result<Vec<TranslatedSegment>, TranslationError>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiTranslator {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiTranslator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn translate_text(
        &self,
        text: &str,
        language_name: &str,
    ) -> Result<String, TranslationError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": format!(
                        "Translate the following text to {language_name}. \
                         Return only the translation, no explanations."
                    )
                },
                { "role": "user", "content": text }
            ],
            "temperature": 0,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TranslationError::from_response(response).await);
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Parse(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let scrubbed = scrub_reply(&content);
        if scrubbed.is_empty() {
            return Err(TranslationError::EmptyReply);
        }
        Ok(scrubbed)
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(
        &self,
        segments: &[TranscriptSegment],
        target_language: &str,
    ) -> Result<Vec<TranslatedSegment>, TranslationError> {
        let language_name = languages::display_name_or_code(target_language);

        let kept: Vec<&TranscriptSegment> = segments
            .iter()
            .filter(|s| !is_silence(&s.text))
            .collect();
        tracing::info!(
            total = segments.len(),
            kept = kept.len(),
            target_language,
            "Translating transcript segments"
        );

        let mut translated = Vec::with_capacity(kept.len());
        for segment in kept {
            let text = self
                .translate_text(segment.text.trim(), &language_name)
                .await?;
            translated.push(TranslatedSegment {
                start: segment.start,
                end: segment.end,
                text,
                original_text: segment.text.clone(),
            });
        }

        Ok(translated)
    }
}

/// Silence markers and sub-syllable fragments the speech index emits carry
/// nothing worth translating.
pub fn is_silence(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t == "-" || t.chars().count() <= 1
}

/// Framing phrases LLMs prepend to translations despite being told not to.
const REPLY_PREFIXES: &[&str] = &[
    "Here is the translation:",
    "Here's the translation:",
    "The translation is:",
    "Translation:",
    "Translated:",
    "The text appears to be",
    "Here is the",
    "This translates to:",
    "In English:",
    "In Spanish:",
    "In French:",
    "The word means:",
    "This means:",
];

/// Strip framing chatter and wrapping quotes from an LLM translation reply.
pub fn scrub_reply(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    for prefix in REPLY_PREFIXES {
        if let Some(idx) = find_ignore_ascii_case(&text, prefix) {
            text = text[idx + prefix.len()..].trim().to_string();
            break;
        }
    }

    for quote in ['"', '\''] {
        let t = text.trim();
        if t.len() >= 2 && t.starts_with(quote) && t.ends_with(quote) {
            text = t[1..t.len() - 1].trim().to_string();
        }
    }

    text
}

/// Byte offset of `needle` in `haystack`, ignoring ASCII case. The needle is
/// ASCII, so the returned offset always sits on a char boundary.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("translation provider request timed out")]
    Timeout,

    #[error("translation provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("failed to parse translation response: {0}")]
    Parse(String),

    #[error("translation provider returned an empty reply")]
    EmptyReply,
}

impl TranslationError {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        TranslationError::Provider { status, detail }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslationError::Timeout
        } else if let Some(status) = e.status() {
            TranslationError::Provider {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else {
            TranslationError::Request(e.to_string())
        }
    }
}
