//! Test helper utilities: stub providers, service builders and polling.
//!
//! The stubs stand in for the video, translation and voice providers so the
//! whole pipeline runs in process with no network. Each stub can be told to
//! delay (to observe intermediate job states) or to fail with a given
//! detail string.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use dubber::app_state::AppState;
use dubber::models::dubbing::VoiceInfo;
use dubber::models::job::DubbingJob;
use dubber::models::transcript::{AudioArtifact, Transcript, TranscriptSegment, TranslatedSegment};
use dubber::services::dubbing::DubbingService;
use dubber::services::store::JobStore;
use dubber::services::translate::{is_silence, TranslationError, Translator};
use dubber::services::video::{Composer, CompositionError, IngestionError, Transcriber};
use dubber::services::voice::{demo_voices, SynthesisError, Synthesizer};

pub const STUB_VIDEO_ID: &str = "vid-1";
pub const STUB_STREAM_URL: &str = "https://stream.example/source/vid-1";
pub const STUB_DUBBED_URL: &str = "https://stream.example/dubbed/vid-1";

/// Segments every stub transcription returns. The "-" entry is a silence
/// marker and should never survive translation.
pub fn sample_segments() -> Vec<TranscriptSegment> {
    vec![
        TranscriptSegment {
            start: 0.0,
            end: 2.5,
            text: "Hello and welcome".to_string(),
        },
        TranscriptSegment {
            start: 2.5,
            end: 3.0,
            text: "-".to_string(),
        },
        TranscriptSegment {
            start: 3.0,
            end: 6.0,
            text: "to the channel".to_string(),
        },
    ]
}

pub struct StubTranscriber {
    pub source_language: String,
    pub delay: Option<Duration>,
    pub fail_with: Option<String>,
}

impl Default for StubTranscriber {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            delay: None,
            fail_with: None,
        }
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _source_url: &str) -> Result<Transcript, IngestionError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if let Some(detail) = &self.fail_with {
            return Err(IngestionError::Provider {
                status: 502,
                detail: detail.clone(),
            });
        }
        Ok(Transcript {
            video_id: STUB_VIDEO_ID.to_string(),
            stream_url: STUB_STREAM_URL.to_string(),
            source_language: self.source_language.clone(),
            segments: sample_segments(),
        })
    }
}

#[derive(Default)]
pub struct StubTranslator {
    pub delay: Option<Duration>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(
        &self,
        segments: &[TranscriptSegment],
        target_language: &str,
    ) -> Result<Vec<TranslatedSegment>, TranslationError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if let Some(detail) = &self.fail_with {
            return Err(TranslationError::Provider {
                status: 500,
                detail: detail.clone(),
            });
        }
        Ok(segments
            .iter()
            .filter(|s| !is_silence(&s.text))
            .map(|s| TranslatedSegment {
                start: s.start,
                end: s.end,
                text: format!("[{}] {}", target_language, s.text),
                original_text: s.text.clone(),
            })
            .collect())
    }
}

pub struct StubSynthesizer {
    pub available: bool,
    pub delay: Option<Duration>,
    pub fail_with: Option<String>,
    pub clone_fails: bool,
}

impl Default for StubSynthesizer {
    fn default() -> Self {
        Self {
            available: true,
            delay: None,
            fail_with: None,
            clone_fails: false,
        }
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    fn available(&self) -> bool {
        self.available
    }

    async fn synthesize(
        &self,
        _segments: &[TranslatedSegment],
        _voice_id: &str,
    ) -> Result<AudioArtifact, SynthesisError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if let Some(detail) = &self.fail_with {
            return Err(SynthesisError::Provider {
                status: 429,
                detail: detail.clone(),
            });
        }
        let path = std::env::temp_dir().join(format!("dubber-test-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, b"stub audio")
            .await
            .map_err(|e| SynthesisError::Io(e.to_string()))?;
        Ok(AudioArtifact { path })
    }

    async fn default_voice(&self, language: &str) -> String {
        format!("stub_voice_{}", language)
    }

    async fn clone_voice(&self, _audio_url: &str, _name: &str) -> Result<String, SynthesisError> {
        if self.clone_fails {
            return Err(SynthesisError::Provider {
                status: 500,
                detail: "clone rejected".to_string(),
            });
        }
        Ok("cloned_voice_1".to_string())
    }

    async fn voices(&self, _language: Option<&str>) -> Result<Vec<VoiceInfo>, SynthesisError> {
        Ok(demo_voices())
    }
}

#[derive(Default)]
pub struct StubComposer {
    pub delay: Option<Duration>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl Composer for StubComposer {
    async fn compose(
        &self,
        video_id: &str,
        _audio: &AudioArtifact,
    ) -> Result<String, CompositionError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if let Some(detail) = &self.fail_with {
            return Err(CompositionError::Provider {
                status: 500,
                detail: detail.clone(),
            });
        }
        Ok(format!("https://stream.example/dubbed/{}", video_id))
    }
}

/// Languages enabled in test builds.
pub fn test_languages() -> Vec<String> {
    ["en", "es", "fr"].iter().map(|s| s.to_string()).collect()
}

/// Wire a service together from stubs, returning the store for direct
/// inspection alongside it.
pub fn build_service(
    transcriber: StubTranscriber,
    translator: StubTranslator,
    synthesizer: StubSynthesizer,
    composer: StubComposer,
) -> (Arc<JobStore>, DubbingService) {
    let store = Arc::new(JobStore::new(None));
    let service = DubbingService::new(
        store.clone(),
        Arc::new(transcriber),
        Arc::new(translator),
        Arc::new(synthesizer),
        Arc::new(composer),
        test_languages(),
    );
    (store, service)
}

/// Application state over stubbed providers, as handed to the router.
pub fn build_state(
    transcriber: StubTranscriber,
    translator: StubTranslator,
    synthesizer: StubSynthesizer,
    composer: StubComposer,
) -> AppState {
    let (store, dubbing) = build_service(transcriber, translator, synthesizer, composer);
    AppState::new(store, dubbing, true, true)
}

/// Serve the app on an ephemeral port and return its base URL.
///
/// The Prometheus recorder is built without installing it globally, so
/// every test can spawn its own server.
pub async fn spawn_server(state: AppState) -> String {
    let prometheus_handle = Arc::new(PrometheusBuilder::new().build_recorder().handle());
    let app = dubber::routes::router(state, prometheus_handle);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    format!("http://{}", addr)
}

/// Response from POST /api/dub-video
#[derive(Debug, Deserialize)]
pub struct SubmitSnapshot {
    pub job_id: Uuid,
    pub status: String,
}

/// Response from GET /api/job-status/{job_id}
#[derive(Debug, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: String,
    pub progress: u8,
    pub message: String,
    #[serde(default)]
    pub result: Option<DubResultSnapshot>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DubResultSnapshot {
    pub video_url: String,
    pub target_language: String,
    #[serde(default)]
    pub voice_id: Option<String>,
    pub demo_mode: bool,
    #[serde(default)]
    pub note: Option<String>,
    pub processing_time_secs: f64,
}

/// Submit a dubbing job over HTTP
pub async fn submit_dub_job(
    client: &reqwest::Client,
    base_url: &str,
    source_url: &str,
    target_language: &str,
) -> Result<SubmitSnapshot, Box<dyn std::error::Error + Send + Sync>> {
    let response = client
        .post(format!("{}/api/dub-video", base_url))
        .json(&serde_json::json!({
            "source_url": source_url,
            "target_language": target_language,
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Submit failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<SubmitSnapshot>().await?)
}

/// Poll job status over HTTP until completed or failed (with timeout),
/// recording every observed progress value along the way.
pub async fn poll_until_terminal(
    client: &reqwest::Client,
    base_url: &str,
    job_id: &Uuid,
    timeout_secs: u64,
) -> Result<(JobSnapshot, Vec<u8>), Box<dyn std::error::Error + Send + Sync>> {
    let max_attempts = timeout_secs * 200; // Poll every 5ms; stubs finish fast
    let mut observed_progress = Vec::new();

    for _ in 0..max_attempts {
        let response = client
            .get(format!("{}/api/job-status/{}", base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let snapshot = response.json::<JobSnapshot>().await?;
        observed_progress.push(snapshot.progress);

        match snapshot.status.as_str() {
            "completed" | "failed" => return Ok((snapshot, observed_progress)),
            "queued" | "processing" => sleep(Duration::from_millis(5)).await,
            other => return Err(format!("Unknown job status: {}", other).into()),
        }
    }

    Err(format!("Job did not reach a terminal state within {} seconds", timeout_secs).into())
}

/// Poll the store directly until the job is terminal (with timeout).
pub async fn wait_for_terminal(store: &JobStore, id: Uuid, timeout: Duration) -> DubbingJob {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let job = store.get(id).expect("job should exist while polling");
        if job.status.is_terminal() {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} did not reach a terminal state within {:?}",
            id,
            timeout
        );
        sleep(Duration::from_millis(5)).await;
    }
}
