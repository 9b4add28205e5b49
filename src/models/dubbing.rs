use garde::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::transcript::{TranscriptSegment, TranslatedSegment};

/// Request to dub a video into another language.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DubRequest {
    /// URL of the source video (YouTube or any provider-ingestible link).
    #[garde(length(min = 1, max = 2000))]
    pub source_url: String,

    /// ISO 639-1 code of the language to dub into.
    #[garde(length(min = 1, max = 16))]
    pub target_language: String,

    /// Explicit voice to narrate with. Overridden by `clone_original_voice`.
    #[garde(length(min = 1, max = 100))]
    pub voice_id: Option<String>,

    /// Ask the voice provider to clone the original speaker.
    #[garde(skip)]
    #[serde(default)]
    pub clone_original_voice: bool,
}

/// Response after submitting a dubbing job.
#[derive(Debug, Serialize)]
pub struct DubResponse {
    pub job_id: uuid::Uuid,
    pub status: String,
}

/// Request to preview a translation without starting a job.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PreviewRequest {
    #[garde(length(min = 1, max = 2000))]
    pub source_url: String,

    #[garde(length(min = 1, max = 16))]
    pub target_language: String,
}

/// Side-by-side result of a preview: the source transcript and its
/// translation, without any audio work.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub original_transcript: TranscriptPreview,
    pub translated_transcript: Vec<TranslatedSegment>,
    pub source_language: String,
    pub target_language: String,
    pub video_id: String,
}

/// Source transcript as returned in a preview.
#[derive(Debug, Serialize)]
pub struct TranscriptPreview {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// One language the service can dub into.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

/// Dubbing targets keyed by ISO 639-1 code.
#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: BTreeMap<String, String>,
}

/// Voices offered by the synthesis provider, or the demo catalogue when
/// synthesis is not configured.
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

/// A narration voice offered by the voice provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
