//! Dubbing pipeline orchestration.
//!
//! `submit` validates the request, creates the job record and spawns the
//! pipeline onto the runtime; the caller gets the job id back immediately
//! and polls the store for progress. The spawned task is the only writer
//! for its job. Every stage failure is converted into a failed job record;
//! nothing propagates out of the task.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::models::dubbing::{
    DubRequest, LanguageInfo, PreviewRequest, PreviewResponse, TranscriptPreview, VoiceInfo,
};
use crate::models::job::DubResult;
use crate::models::transcript::{AudioArtifact, Transcript, TranslatedSegment};
use crate::services::languages;
use crate::services::store::JobStore;
use crate::services::translate::{self, TranslationError, Translator};
use crate::services::video::{Composer, IngestionError, Transcriber};
use crate::services::voice::{SynthesisError, Synthesizer};

/// Pipeline progress checkpoints, one per stage entry.
const PROGRESS_INGEST: u8 = 10;
const PROGRESS_TRANSLATE: u8 = 30;
const PROGRESS_SYNTHESIZE: u8 = 60;
const PROGRESS_COMPOSE: u8 = 85;

/// Orchestrates the dubbing pipeline against the configured providers.
///
/// Cheap to clone; every field is shared behind an `Arc` so spawned
/// pipeline tasks own a handle.
#[derive(Clone)]
pub struct DubbingService {
    store: Arc<JobStore>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn Synthesizer>,
    composer: Arc<dyn Composer>,
    supported_languages: Arc<Vec<String>>,
}

impl DubbingService {
    pub fn new(
        store: Arc<JobStore>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
        composer: Arc<dyn Composer>,
        supported_languages: Vec<String>,
    ) -> Self {
        Self {
            store,
            transcriber,
            translator,
            synthesizer,
            composer,
            supported_languages: Arc::new(supported_languages),
        }
    }

    /// Validate the request, create the job and spawn the pipeline.
    ///
    /// Returns as soon as the job record exists; submission latency is
    /// independent of how long the providers take.
    pub fn submit(&self, request: &DubRequest) -> Result<Uuid, SubmitError> {
        let (source_url, target_language) = validate_request(
            &request.source_url,
            &request.target_language,
            &self.supported_languages,
        )?;

        let id = self.store.create();
        metrics::counter!("dubbing_jobs_total").increment(1);
        tracing::info!(
            job_id = %id,
            source_url = %source_url,
            target_language = %target_language,
            voice_id = ?request.voice_id,
            clone_original_voice = request.clone_original_voice,
            "New dubbing job created"
        );

        let service = self.clone();
        let request = DubRequest {
            source_url,
            target_language,
            voice_id: request.voice_id.clone(),
            clone_original_voice: request.clone_original_voice,
        };
        tokio::spawn(async move {
            service.run_pipeline(id, request).await;
        });

        Ok(id)
    }

    /// Drive one job through the pipeline and record the outcome.
    pub async fn run_pipeline(self, id: Uuid, request: DubRequest) {
        let started = Instant::now();
        tracing::info!(job_id = %id, "Starting dubbing pipeline");

        match self.execute(id, &request, started).await {
            Ok(()) => {
                metrics::counter!("dubbing_jobs_completed").increment(1);
            }
            Err(reason) => {
                metrics::counter!("dubbing_jobs_failed").increment(1);
                tracing::error!(job_id = %id, error = %reason, "Dubbing pipeline failed");
                if let Err(e) = self.store.mark_failed(id, reason) {
                    tracing::error!(job_id = %id, error = %e, "Failed to record job failure");
                }
            }
        }
        metrics::histogram!("dubbing_processing_seconds").record(started.elapsed().as_secs_f64());
    }

    async fn execute(
        &self,
        id: Uuid,
        request: &DubRequest,
        started: Instant,
    ) -> Result<(), String> {
        let store = &self.store;
        let target = &request.target_language;

        // Stage 1: ingest the source video and extract the transcript.
        store
            .mark_processing(id, PROGRESS_INGEST, "Uploading video and extracting transcript...")
            .map_err(|e| e.to_string())?;
        let transcript = self
            .transcriber
            .transcribe(&request.source_url)
            .await
            .map_err(|e| format!("ingestion/transcription failed: {e}"))?;
        tracing::info!(
            job_id = %id,
            video_id = %transcript.video_id,
            segments = transcript.segments.len(),
            source_language = %transcript.source_language,
            "Transcript ready"
        );

        // Stage 2: translate, unless the video already speaks the target
        // language.
        let language_name = languages::display_name_or_code(target);
        store
            .mark_processing(
                id,
                PROGRESS_TRANSLATE,
                format!("Translating transcript to {language_name}..."),
            )
            .map_err(|e| e.to_string())?;
        let translated = if transcript.source_language == *target {
            tracing::info!(
                job_id = %id,
                language = %target,
                "Source language matches target, skipping translation"
            );
            carry_over_segments(&transcript)
        } else {
            self.translator
                .translate(&transcript.segments, target)
                .await
                .map_err(|e| format!("translation failed: {e}"))?
        };
        if translated.is_empty() {
            return Err("translation failed: transcript contains no translatable speech".to_string());
        }

        // Without a configured voice provider the pipeline stops here and
        // hands back the original stream with the translation done.
        if !self.synthesizer.available() {
            let result = DubResult {
                video_url: transcript.stream_url.clone(),
                target_language: target.clone(),
                voice_id: None,
                demo_mode: true,
                note: Some(
                    "Voice synthesis is not configured; returning the original video with \
                     the translation completed."
                        .to_string(),
                ),
                processing_time_secs: elapsed_secs(started),
            };
            store
                .mark_completed(id, result, "Dubbing completed in demo mode (translation only)")
                .map_err(|e| e.to_string())?;
            tracing::info!(job_id = %id, "Job completed in demo mode");
            return Ok(());
        }

        // Stage 3: synthesize the dubbed narration.
        store
            .mark_processing(id, PROGRESS_SYNTHESIZE, "Generating dubbed audio...")
            .map_err(|e| e.to_string())?;
        let voice_id = self.resolve_voice(request, &transcript, target).await;
        let audio = self
            .synthesizer
            .synthesize(&translated, &voice_id)
            .await
            .map_err(|e| format!("voice synthesis failed: {e}"))?;

        // Stage 4: overlay the narration on the source video. The temp
        // audio is deleted whether or not composition worked.
        store
            .mark_processing(id, PROGRESS_COMPOSE, "Composing final dubbed video...")
            .map_err(|e| e.to_string())?;
        let composed = self.composer.compose(&transcript.video_id, &audio).await;
        self.cleanup(&audio).await;
        let video_url = composed.map_err(|e| format!("composition failed: {e}"))?;

        let result = DubResult {
            video_url: video_url.clone(),
            target_language: target.clone(),
            voice_id: Some(voice_id),
            demo_mode: false,
            note: None,
            processing_time_secs: elapsed_secs(started),
        };
        store
            .mark_completed(id, result, "Dubbing completed successfully")
            .map_err(|e| e.to_string())?;
        tracing::info!(
            job_id = %id,
            video_url = %video_url,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Job completed successfully"
        );

        Ok(())
    }

    /// Pick the narration voice: cloned from the original speaker when
    /// requested (falling back to the language default if cloning fails,
    /// never failing the job), else the explicit request voice, else the
    /// provider's default for the target language.
    async fn resolve_voice(
        &self,
        request: &DubRequest,
        transcript: &Transcript,
        target: &str,
    ) -> String {
        if request.clone_original_voice {
            let name = format!("Cloned_Voice_{}_{}", transcript.video_id, target);
            match self
                .synthesizer
                .clone_voice(&transcript.stream_url, &name)
                .await
            {
                Ok(voice_id) => {
                    tracing::info!(voice_id = %voice_id, "Using cloned voice");
                    return voice_id;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Voice cloning failed, falling back to default voice");
                }
            }
        } else if let Some(voice_id) = request.voice_id.as_deref() {
            let voice_id = voice_id.trim();
            if !voice_id.is_empty() {
                return voice_id.to_string();
            }
        }

        self.synthesizer.default_voice(target).await
    }

    async fn cleanup(&self, audio: &AudioArtifact) {
        match tokio::fs::remove_file(&audio.path).await {
            Ok(()) => tracing::debug!(path = %audio.path.display(), "Cleaned up temp audio"),
            Err(e) => {
                tracing::warn!(path = %audio.path.display(), error = %e, "Failed to clean up temp audio")
            }
        }
    }

    /// Run stages 1-2 synchronously and return both transcripts without
    /// creating a job.
    pub async fn preview(&self, request: &PreviewRequest) -> Result<PreviewResponse, PreviewError> {
        let (source_url, target_language) = validate_request(
            &request.source_url,
            &request.target_language,
            &self.supported_languages,
        )?;

        tracing::info!(source_url = %source_url, target_language = %target_language, "Generating translation preview");
        let transcript = self.transcriber.transcribe(&source_url).await?;

        let translated = if transcript.source_language == target_language {
            carry_over_segments(&transcript)
        } else {
            self.translator
                .translate(&transcript.segments, &target_language)
                .await?
        };

        Ok(PreviewResponse {
            original_transcript: TranscriptPreview {
                text: transcript.text(),
                segments: transcript.segments,
            },
            translated_transcript: translated,
            source_language: transcript.source_language,
            target_language,
            video_id: transcript.video_id,
        })
    }

    /// Narration voices on offer, optionally filtered by language.
    pub async fn voices(&self, language: Option<&str>) -> Result<Vec<VoiceInfo>, SynthesisError> {
        self.synthesizer.voices(language).await
    }

    /// The configured dubbing languages with display names.
    pub fn languages(&self) -> Vec<LanguageInfo> {
        languages::catalog(&self.supported_languages)
    }

    /// True when the voice provider is configured for real synthesis.
    pub fn synthesis_available(&self) -> bool {
        self.synthesizer.available()
    }
}

/// Carry original segments through as their own translation, dropping
/// silence markers like the translation path does.
fn carry_over_segments(transcript: &Transcript) -> Vec<TranslatedSegment> {
    transcript
        .segments
        .iter()
        .filter(|s| !translate::is_silence(&s.text))
        .map(|s| TranslatedSegment {
            start: s.start,
            end: s.end,
            text: s.text.clone(),
            original_text: s.text.clone(),
        })
        .collect()
}

fn validate_request(
    source_url: &str,
    target_language: &str,
    supported: &[String],
) -> Result<(String, String), SubmitError> {
    let source = source_url.trim();
    if source.is_empty() {
        return Err(SubmitError::EmptySource);
    }

    let language = target_language.trim().to_lowercase();
    if language.is_empty() {
        return Err(SubmitError::EmptyLanguage);
    }
    if !supported.iter().any(|l| l.eq_ignore_ascii_case(&language)) {
        return Err(SubmitError::UnsupportedLanguage {
            language,
            supported: supported.join(", "),
        });
    }

    Ok((source.to_string(), language))
}

fn elapsed_secs(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("source video URL must not be empty")]
    EmptySource,

    #[error("target language must not be empty")]
    EmptyLanguage,

    #[error("Unsupported target language: {language}. Supported languages: {supported}")]
    UnsupportedLanguage { language: String, supported: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error(transparent)]
    Invalid(#[from] SubmitError),

    #[error("ingestion/transcription failed: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),
}
