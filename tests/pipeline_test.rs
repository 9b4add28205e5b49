//! Integration tests for the dubbing pipeline
//!
//! These drive `DubbingService` directly against stub providers and inspect
//! the job store, with no HTTP involved. Everything runs in process; no
//! network or credentials are required.

mod helpers;

use helpers::*;
use std::time::Duration;
use uuid::Uuid;

use dubber::models::dubbing::{DubRequest, PreviewRequest};
use dubber::models::job::JobStatus;
use dubber::services::dubbing::SubmitError;
use dubber::services::store::StoreError;

fn dub_request(target_language: &str) -> DubRequest {
    DubRequest {
        source_url: "https://youtu.be/abc123".to_string(),
        target_language: target_language.to_string(),
        voice_id: None,
        clone_original_voice: false,
    }
}

#[tokio::test]
async fn test_submit_returns_before_pipeline_finishes() {
    let (store, service) = build_service(
        StubTranscriber {
            delay: Some(Duration::from_millis(300)),
            ..Default::default()
        },
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let started = std::time::Instant::now();
    let id = service.submit(&dub_request("es")).expect("submit failed");
    assert!(
        started.elapsed() < Duration::from_millis(150),
        "submit should not wait for the pipeline (took {:?})",
        started.elapsed()
    );

    // The transcriber is still sleeping, so the job cannot be terminal yet
    let job = store.get(id).expect("job should exist right after submit");
    assert!(
        job.status == JobStatus::Queued || job.status == JobStatus::Processing,
        "unexpected early status: {}",
        job.status
    );
    assert!(job.progress < 100);
    assert!(job.result.is_none());
    assert!(job.error.is_none());

    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_happy_path_produces_dubbed_result() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.message, "Dubbing completed successfully");
    assert!(job.error.is_none());
    assert!(job.completed_at.is_some());

    let result = job.result.expect("completed job should carry a result");
    assert_eq!(result.video_url, STUB_DUBBED_URL);
    assert_eq!(result.target_language, "es");
    assert_eq!(result.voice_id.as_deref(), Some("stub_voice_es"));
    assert!(!result.demo_mode);
    assert!(result.note.is_none());
    assert!(result.processing_time_secs >= 0.0);
}

#[tokio::test]
async fn test_progress_walks_the_stage_ladder() {
    let (store, service) = build_service(
        StubTranscriber {
            delay: Some(Duration::from_millis(40)),
            ..Default::default()
        },
        StubTranslator {
            delay: Some(Duration::from_millis(40)),
            ..Default::default()
        },
        StubSynthesizer {
            delay: Some(Duration::from_millis(40)),
            ..Default::default()
        },
        StubComposer {
            delay: Some(Duration::from_millis(40)),
            ..Default::default()
        },
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");

    let mut observed = Vec::new();
    loop {
        let job = store.get(id).expect("job should exist while polling");
        observed.push(job.progress);
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    for pair in observed.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "progress went backwards: {} -> {}",
            pair[0],
            pair[1]
        );
    }
    for progress in &observed {
        assert!(
            [0, 10, 30, 60, 85, 100].contains(progress),
            "progress {} is not a stage checkpoint",
            progress
        );
    }
    assert_eq!(*observed.last().unwrap(), 100);
    // With 40ms stages and 2ms polling, intermediate stages must be visible
    assert!(
        observed.iter().filter(|p| **p > 0 && **p < 100).count() >= 2,
        "expected to observe intermediate progress, saw {:?}",
        observed
    );
}

#[tokio::test]
async fn test_ingestion_failure_fails_the_job() {
    let (store, service) = build_service(
        StubTranscriber {
            fail_with: Some("source video unreachable".to_string()),
            ..Default::default()
        },
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.expect("failed job should carry an error");
    assert!(
        error.starts_with("ingestion/transcription failed: "),
        "unexpected error: {}",
        error
    );
    assert!(error.contains("source video unreachable"));
    assert!(job.result.is_none());
    // Progress freezes at the stage that was running
    assert_eq!(job.progress, 10);
}

#[tokio::test]
async fn test_translation_failure_fails_the_job() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator {
            fail_with: Some("model overloaded".to_string()),
            ..Default::default()
        },
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.expect("failed job should carry an error");
    assert!(
        error.starts_with("translation failed: "),
        "unexpected error: {}",
        error
    );
    assert!(error.contains("model overloaded"));
    assert!(job.result.is_none());
    assert_eq!(job.progress, 30);
    // The failure reason is also surfaced as the user-facing message
    assert_eq!(job.message, error);
}

#[tokio::test]
async fn test_synthesis_quota_failure_names_the_stage() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer {
            fail_with: Some("quota exceeded".to_string()),
            ..Default::default()
        },
        StubComposer::default(),
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.expect("failed job should carry an error");
    assert!(
        error.starts_with("voice synthesis failed: "),
        "unexpected error: {}",
        error
    );
    assert!(error.contains("quota exceeded"));
    assert_eq!(job.progress, 60);
}

#[tokio::test]
async fn test_composition_failure_fails_the_job() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer {
            fail_with: Some("timeline rejected".to_string()),
            ..Default::default()
        },
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.expect("failed job should carry an error");
    assert!(
        error.starts_with("composition failed: "),
        "unexpected error: {}",
        error
    );
    assert_eq!(job.progress, 85);
}

#[tokio::test]
async fn test_unknown_id_and_fresh_store_return_not_found() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let missing = Uuid::new_v4();
    assert_eq!(store.get(missing), Err(StoreError::NotFound(missing)));

    let id = service.submit(&dub_request("es")).expect("submit failed");
    wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    // A restart drops every job: a fresh store has never heard of the id
    let (fresh_store, _service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );
    assert_eq!(fresh_store.get(id), Err(StoreError::NotFound(id)));
}

#[tokio::test]
async fn test_demo_mode_completes_without_synthesis() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer {
            available: false,
            ..Default::default()
        },
        StubComposer::default(),
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.message, "Dubbing completed in demo mode (translation only)");

    let result = job.result.expect("demo job should carry a result");
    assert!(result.demo_mode);
    assert_eq!(result.video_url, STUB_STREAM_URL);
    assert_eq!(result.voice_id, None);
    assert!(result.note.is_some());
}

#[tokio::test]
async fn test_same_source_language_skips_translation() {
    // The translator is rigged to fail; reaching it would fail the job
    let (store, service) = build_service(
        StubTranscriber {
            source_language: "es".to_string(),
            ..Default::default()
        },
        StubTranslator {
            fail_with: Some("should not be called".to_string()),
            ..Default::default()
        },
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let id = service.submit(&dub_request("es")).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error.is_none());
}

#[tokio::test]
async fn test_explicit_voice_id_is_used() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let request = DubRequest {
        voice_id: Some("my_custom_voice".to_string()),
        ..dub_request("es")
    };
    let id = service.submit(&request).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    let result = job.result.expect("completed job should carry a result");
    assert_eq!(result.voice_id.as_deref(), Some("my_custom_voice"));
}

#[tokio::test]
async fn test_voice_cloning_wins_over_explicit_voice() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let request = DubRequest {
        voice_id: Some("my_custom_voice".to_string()),
        clone_original_voice: true,
        ..dub_request("es")
    };
    let id = service.submit(&request).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    let result = job.result.expect("completed job should carry a result");
    assert_eq!(result.voice_id.as_deref(), Some("cloned_voice_1"));
}

#[tokio::test]
async fn test_failed_clone_falls_back_to_default_voice() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer {
            clone_fails: true,
            ..Default::default()
        },
        StubComposer::default(),
    );

    let request = DubRequest {
        clone_original_voice: true,
        ..dub_request("es")
    };
    let id = service.submit(&request).expect("submit failed");
    let job = wait_for_terminal(&store, id, Duration::from_secs(5)).await;

    // A failed clone never fails the job; it narrates with the default voice
    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.expect("completed job should carry a result");
    assert_eq!(result.voice_id.as_deref(), Some("stub_voice_es"));
}

#[tokio::test]
async fn test_unsupported_language_is_rejected_at_submit() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let err = service.submit(&dub_request("xx")).unwrap_err();
    assert!(matches!(err, SubmitError::UnsupportedLanguage { .. }));

    let err = service
        .submit(&DubRequest {
            source_url: "   ".to_string(),
            ..dub_request("es")
        })
        .unwrap_err();
    assert_eq!(err, SubmitError::EmptySource);

    // Rejected submissions never create a job
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_preview_translates_without_creating_a_job() {
    let (store, service) = build_service(
        StubTranscriber::default(),
        StubTranslator::default(),
        StubSynthesizer::default(),
        StubComposer::default(),
    );

    let preview = service
        .preview(&PreviewRequest {
            source_url: "https://youtu.be/abc123".to_string(),
            target_language: "es".to_string(),
        })
        .await
        .expect("preview failed");

    assert_eq!(preview.source_language, "en");
    assert_eq!(preview.target_language, "es");
    assert_eq!(preview.video_id, STUB_VIDEO_ID);
    assert_eq!(preview.original_transcript.segments.len(), 3);
    assert_eq!(
        preview.original_transcript.text,
        "Hello and welcome - to the channel"
    );
    // Silence markers are dropped from the translation
    assert_eq!(preview.translated_transcript.len(), 2);
    assert_eq!(preview.translated_transcript[0].text, "[es] Hello and welcome");
    assert_eq!(
        preview.translated_transcript[0].original_text,
        "Hello and welcome"
    );

    assert!(store.is_empty(), "preview must not create jobs");
}
