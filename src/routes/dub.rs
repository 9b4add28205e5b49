use axum::extract::{Path, Query, State};
use axum::Json;
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::dubbing::{
    DubRequest, DubResponse, LanguagesResponse, PreviewRequest, PreviewResponse, VoicesResponse,
};
use crate::models::job::DubbingJob;
use crate::routes::ApiError;

/// POST /api/dub-video — submit a video for dubbing.
///
/// Validation happens before the job exists; the pipeline itself runs on a
/// spawned task, so this returns as soon as the job is queued.
pub async fn submit_dub(
    State(state): State<AppState>,
    Json(request): Json<DubRequest>,
) -> Result<Json<DubResponse>, ApiError> {
    request
        .validate()
        .map_err(|report| ApiError::BadRequest(report.to_string()))?;

    let job_id = state.dubbing.submit(&request)?;

    Ok(Json(DubResponse {
        job_id,
        status: "started".to_string(),
    }))
}

/// GET /api/job-status/{job_id} — poll a dubbing job.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<DubbingJob>, ApiError> {
    let job = state.store.get(job_id)?;
    Ok(Json(job))
}

/// POST /api/preview-translation — transcribe and translate a video without
/// starting a dubbing job. Runs synchronously; nothing is stored.
pub async fn preview_translation(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    request
        .validate()
        .map_err(|report| ApiError::BadRequest(report.to_string()))?;

    let preview = state.dubbing.preview(&request).await?;
    Ok(Json(preview))
}

/// GET /api/languages — languages the service can dub into.
pub async fn supported_languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    let languages = state
        .dubbing
        .languages()
        .into_iter()
        .map(|info| (info.code, info.name))
        .collect();

    Json(LanguagesResponse { languages })
}

#[derive(Debug, Deserialize)]
pub struct VoiceQuery {
    pub language: Option<String>,
}

/// GET /api/voices — narration voices, optionally filtered by language.
pub async fn available_voices(
    State(state): State<AppState>,
    Query(query): Query<VoiceQuery>,
) -> Result<Json<VoicesResponse>, ApiError> {
    let voices = state
        .dubbing
        .voices(query.language.as_deref())
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(VoicesResponse { voices }))
}
