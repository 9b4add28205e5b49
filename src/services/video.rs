//! Video ingestion and composition against a VideoDB-style provider.
//!
//! One provider owns both ends of the pipeline: it ingests the source video
//! (upload by URL, spoken-word indexing, transcript with detected language)
//! and later renders the dubbed timeline. The two concerns are separate
//! traits so they can be stubbed independently in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::transcript::{AudioArtifact, Transcript, TranscriptSegment};

/// Turns a source video URL into a timed transcript.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, source_url: &str) -> Result<Transcript, IngestionError>;
}

/// Renders the final video with the dubbed audio track over the original.
#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(
        &self,
        video_id: &str,
        audio: &AudioArtifact,
    ) -> Result<String, CompositionError>;
}

/// Client for a VideoDB-style video infrastructure API.
pub struct VideoDbClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    url: &'a str,
    media_type: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
    #[serde(default)]
    stream_url: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptResponse {
    language: String,
    segments: Vec<WireSegment>,
}

#[derive(Deserialize)]
struct WireSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Serialize)]
struct TimelineRequest<'a> {
    video_id: &'a str,
    audio_id: &'a str,
    /// Offset of the audio overlay in seconds.
    audio_start: f64,
    /// Mute the original audio tracks under the overlay.
    disable_other_tracks: bool,
}

#[derive(Deserialize)]
struct TimelineResponse {
    stream_url: String,
}

impl VideoDbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Upload media by URL. The provider fetches the file itself, so this
    /// works for YouTube links as well as direct file URLs.
    async fn upload(&self, url: &str, media_type: &str) -> Result<UploadResponse, reqwest::Error> {
        self.http
            .post(format!("{}/uploads", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&UploadRequest { url, media_type })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl Transcriber for VideoDbClient {
    async fn transcribe(&self, source_url: &str) -> Result<Transcript, IngestionError> {
        tracing::debug!(source_url, "Uploading video to provider");
        let video = self.upload(source_url, "video").await?;
        let stream_url = video.stream_url.ok_or_else(|| {
            IngestionError::Parse("upload response missing stream_url".to_string())
        })?;
        tracing::info!(video_id = %video.id, "Video uploaded");

        // Spoken-word indexing is synchronous on the provider side; the
        // request returns once the transcript is ready.
        let response = self
            .http
            .post(format!("{}/videos/{}/index_spoken_words", self.base_url, video.id))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IngestionError::from_response(response).await);
        }

        let response = self
            .http
            .get(format!("{}/videos/{}/transcript", self.base_url, video.id))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IngestionError::from_response(response).await);
        }
        let transcript: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| IngestionError::Parse(e.to_string()))?;

        let segments: Vec<TranscriptSegment> = transcript
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                start: s.start,
                end: s.end,
                text: s.text,
            })
            .collect();

        if segments.is_empty() {
            return Err(IngestionError::EmptyTranscript);
        }

        tracing::info!(
            video_id = %video.id,
            segments = segments.len(),
            language = %transcript.language,
            "Transcript extracted"
        );

        Ok(Transcript {
            video_id: video.id,
            stream_url,
            source_language: transcript.language.trim().to_lowercase(),
            segments,
        })
    }
}

#[async_trait]
impl Composer for VideoDbClient {
    async fn compose(
        &self,
        video_id: &str,
        audio: &AudioArtifact,
    ) -> Result<String, CompositionError> {
        tracing::debug!(video_id, path = %audio.path.display(), "Uploading dubbed audio");
        let bytes = tokio::fs::read(&audio.path)
            .await
            .map_err(|e| CompositionError::AudioRead(e.to_string()))?;
        let file_name = audio
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dubbed.mp3")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| CompositionError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("media_type", "audio")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/uploads", self.base_url))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CompositionError::from_response(response).await);
        }
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| CompositionError::Parse(e.to_string()))?;
        tracing::info!(audio_id = %uploaded.id, "Dubbed audio uploaded");

        let response = self
            .http
            .post(format!("{}/timelines", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&TimelineRequest {
                video_id,
                audio_id: &uploaded.id,
                audio_start: 0.0,
                disable_other_tracks: true,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CompositionError::from_response(response).await);
        }
        let timeline: TimelineResponse = response
            .json()
            .await
            .map_err(|e| CompositionError::Parse(e.to_string()))?;

        tracing::info!(video_id, stream_url = %timeline.stream_url, "Dubbed video rendered");
        Ok(timeline.stream_url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("video provider request timed out")]
    Timeout,

    #[error("video provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("failed to parse video provider response: {0}")]
    Parse(String),

    #[error("video has no spoken-word transcript")]
    EmptyTranscript,
}

impl IngestionError {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        IngestionError::Provider { status, detail }
    }
}

impl From<reqwest::Error> for IngestionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IngestionError::Timeout
        } else if let Some(status) = e.status() {
            IngestionError::Provider {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else {
            IngestionError::Request(e.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("video provider request timed out")]
    Timeout,

    #[error("video provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("failed to parse video provider response: {0}")]
    Parse(String),

    #[error("failed to read synthesized audio: {0}")]
    AudioRead(String),
}

impl CompositionError {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        CompositionError::Provider { status, detail }
    }
}

impl From<reqwest::Error> for CompositionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompositionError::Timeout
        } else if let Some(status) = e.status() {
            CompositionError::Provider {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else {
            CompositionError::Request(e.to_string())
        }
    }
}
