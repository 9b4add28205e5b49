use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One spoken-word segment of a video transcript, timed in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A transcript segment after translation, retaining the source text so
/// previews can show both sides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslatedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub original_text: String,
}

/// Everything ingestion hands to the rest of the pipeline: the provider's
/// video handle, a streamable URL of the original, the detected spoken
/// language, and the timed transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub video_id: String,
    pub stream_url: String,
    pub source_language: String,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Full transcript text, segments joined by single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Join translated segments into the narration text handed to synthesis.
pub fn joined_text(segments: &[TranslatedSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Synthesized narration audio waiting to be composed over the video.
/// The file lives in the OS temp directory until composition uploads it.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub path: PathBuf,
}
