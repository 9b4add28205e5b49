//! Voice synthesis, cloning and voice catalogue via an ElevenLabs-style API.
//!
//! The client degrades explicitly instead of failing when no API key is
//! configured: `available()` reports the capability, and the catalogue falls
//! back to built-in demo voices so the rest of the service keeps working.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::models::dubbing::VoiceInfo;
use crate::models::transcript::{joined_text, AudioArtifact, TranslatedSegment};

const MODEL_ID: &str = "eleven_multilingual_v2";

/// Narrates translated segments with a synthetic voice.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// False when the provider is not configured; the pipeline then skips
    /// synthesis and composition and completes in demo mode.
    fn available(&self) -> bool;

    /// Synthesize one audio track for the whole translated transcript.
    /// Segment texts are concatenated; per-segment timing alignment is not
    /// promised downstream.
    async fn synthesize(
        &self,
        segments: &[TranslatedSegment],
        voice_id: &str,
    ) -> Result<AudioArtifact, SynthesisError>;

    /// Voice to narrate with when the request picked none.
    async fn default_voice(&self, language: &str) -> String;

    /// Clone a voice from a sample audio URL, returning the new voice id.
    async fn clone_voice(&self, audio_url: &str, name: &str) -> Result<String, SynthesisError>;

    /// Narration voices on offer. The provider listing carries no per-voice
    /// language metadata, so the filter is advisory only.
    async fn voices(&self, language: Option<&str>) -> Result<Vec<VoiceInfo>, SynthesisError>;
}

/// Client for an ElevenLabs-style text-to-speech API.
pub struct ElevenLabsClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<WireVoice>,
}

#[derive(Deserialize)]
struct WireVoice {
    voice_id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    labels: WireLabels,
}

#[derive(Deserialize, Default)]
struct WireLabels {
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    age: Option<String>,
}

#[derive(Deserialize)]
struct CloneResponse {
    voice_id: String,
}

/// Fallback narration voices per language, used when the provider's voice
/// listing is unreachable.
const DEFAULT_VOICES: &[(&str, &str)] = &[
    ("en", "IKne3meq5aSn9XLyUdCD"), // Charlie
    ("es", "JBFqnCBsd6RMkjVDRZzb"), // George
    ("fr", "N2lVS1w4EtoT3dr4eOWO"), // Callum
    ("de", "TX3LPaxmHKxFdv7VOQHJ"), // Liam
    ("it", "bIHbv24MWmeRgasZH58o"), // Will
    ("pt", "cjVigY5qzO86Huf0OWal"), // Eric
    ("ru", "iP95p4xoKVk53GoZ742B"), // Chris
    ("ja", "nPczCjzI2devNBz1zQrb"), // Brian
    ("ko", "onwK4e9ZLuTAKqWW03F9"), // Daniel
    ("zh", "pqHfZKP75CvOlQylNhV4"), // Bill
    ("hi", "IKne3meq5aSn9XLyUdCD"), // Charlie
    ("ar", "onwK4e9ZLuTAKqWW03F9"), // Daniel
];

/// Catch-all voice for languages outside the table.
const FALLBACK_VOICE: &str = "EXAVITQu4vr4xnSDxMaL";

/// Placeholder voice id reported while the provider is unconfigured.
pub const DEMO_VOICE: &str = "demo_multilingual_1";

/// Fallback voice id for a language from the static table.
pub fn fallback_voice(language: &str) -> &'static str {
    DEFAULT_VOICES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, voice)| *voice)
        .unwrap_or(FALLBACK_VOICE)
}

/// Built-in catalogue served while the provider is unconfigured.
pub fn demo_voices() -> Vec<VoiceInfo> {
    vec![
        VoiceInfo {
            voice_id: DEMO_VOICE.to_string(),
            name: "Demo Multilingual Voice".to_string(),
            gender: None,
            age: None,
            description: Some("Demo voice for AI dubbing showcase".to_string()),
        },
        VoiceInfo {
            voice_id: "demo_english_1".to_string(),
            name: "Demo English Voice".to_string(),
            gender: None,
            age: None,
            description: Some("Demo voice for English content".to_string()),
        },
    ]
}

impl ElevenLabsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    fn key(&self) -> Result<&str, SynthesisError> {
        self.api_key.as_deref().ok_or(SynthesisError::Unavailable)
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SynthesisError> {
        let key = self.key()?;
        let response = self
            .http
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SynthesisError::from_response(response).await);
        }

        let listing: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Parse(e.to_string()))?;

        Ok(listing
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                voice_id: v.voice_id,
                name: v.name,
                gender: v.labels.gender,
                age: v.labels.age,
                description: v.description,
            })
            .collect())
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsClient {
    fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn synthesize(
        &self,
        segments: &[TranslatedSegment],
        voice_id: &str,
    ) -> Result<AudioArtifact, SynthesisError> {
        let key = self.key()?;
        let text = joined_text(segments);
        tracing::info!(
            voice_id,
            segments = segments.len(),
            characters = text.len(),
            "Generating dubbed audio"
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": MODEL_ID,
            "voice_settings": {
                "stability": 0.75,
                "similarity_boost": 0.75,
                "style": 0.0,
                "use_speaker_boost": true
            }
        });

        let response = self
            .http
            .post(format!("{}/text-to-speech/{voice_id}", self.base_url))
            .header("xi-api-key", key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;
        match response.status().as_u16() {
            401 => return Err(SynthesisError::Auth),
            422 => return Err(SynthesisError::InvalidVoice(voice_id.to_string())),
            status if status >= 400 => {
                return Err(SynthesisError::from_response(response).await);
            }
            _ => {}
        }

        let audio = response.bytes().await?;
        let path: PathBuf =
            std::env::temp_dir().join(format!("dubber-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, &audio)
            .await
            .map_err(|e| SynthesisError::Io(e.to_string()))?;

        tracing::info!(path = %path.display(), bytes = audio.len(), "Dubbed audio written");
        Ok(AudioArtifact { path })
    }

    async fn default_voice(&self, language: &str) -> String {
        if !self.available() {
            return DEMO_VOICE.to_string();
        }

        // Prefer a real voice from the account, male first as a stable
        // arbitrary tiebreaker, then the static per-language table.
        match self.list_voices().await {
            Ok(voices) if !voices.is_empty() => {
                let pick = voices
                    .iter()
                    .find(|v| v.gender.as_deref() == Some("male"))
                    .or_else(|| voices.first());
                match pick {
                    Some(voice) => {
                        tracing::info!(voice_id = %voice.voice_id, name = %voice.name, "Selected account voice");
                        voice.voice_id.clone()
                    }
                    None => fallback_voice(language).to_string(),
                }
            }
            Ok(_) => fallback_voice(language).to_string(),
            Err(e) => {
                tracing::warn!(error = %e, language, "Voice listing failed, using fallback voice");
                fallback_voice(language).to_string()
            }
        }
    }

    async fn clone_voice(&self, audio_url: &str, name: &str) -> Result<String, SynthesisError> {
        let key = self.key()?;

        tracing::debug!(audio_url, "Downloading voice sample for cloning");
        let sample = self
            .http
            .get(audio_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        if sample.len() < 1024 {
            return Err(SynthesisError::SampleTooSmall(sample.len()));
        }

        let part = reqwest::multipart::Part::bytes(sample.to_vec())
            .file_name("sample.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| SynthesisError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .text("description", format!("Cloned voice: {name}"))
            .part("files", part);

        let response = self
            .http
            .post(format!("{}/voices/add", self.base_url))
            .header("xi-api-key", key)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SynthesisError::from_response(response).await);
        }

        let cloned: CloneResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Parse(e.to_string()))?;
        tracing::info!(voice_id = %cloned.voice_id, "Voice cloned");
        Ok(cloned.voice_id)
    }

    async fn voices(&self, _language: Option<&str>) -> Result<Vec<VoiceInfo>, SynthesisError> {
        if !self.available() {
            return Ok(demo_voices());
        }

        match self.list_voices().await {
            Ok(voices) => Ok(voices),
            Err(e) => {
                tracing::warn!(error = %e, "Voice listing failed, serving demo catalogue");
                Ok(demo_voices())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("voice provider request timed out")]
    Timeout,

    #[error("voice provider authentication failed; check the API key")]
    Auth,

    #[error("voice id {0} is not valid")]
    InvalidVoice(String),

    #[error("voice provider is not configured")]
    Unavailable,

    #[error("audio sample too small for voice cloning ({0} bytes)")]
    SampleTooSmall(usize),

    #[error("voice provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("failed to parse voice provider response: {0}")]
    Parse(String),

    #[error("failed to write synthesized audio: {0}")]
    Io(String),
}

impl SynthesisError {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        SynthesisError::Provider { status, detail }
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else if let Some(status) = e.status() {
            SynthesisError::Provider {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else {
            SynthesisError::Request(e.to_string())
        }
    }
}
