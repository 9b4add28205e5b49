//! HTTP surface of the dubbing service.
//!
//! Route handlers stay thin: they validate the request shape, call into
//! `DubbingService` or `JobStore`, and map service errors onto wire errors.
//! All error responses share the `{"detail": "..."}` envelope.

pub mod dub;
pub mod health;
pub mod metrics;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use thiserror::Error;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::services::dubbing::{PreviewError, SubmitError};
use crate::services::store::StoreError;

/// Assemble the application router.
///
/// Kept out of `main` so integration tests can drive the full HTTP surface
/// in process against stub providers.
pub fn router(state: AppState, prometheus_handle: Arc<PrometheusHandle>) -> Router {
    Router::new()
        .route("/api/dub-video", post(dub::submit_dub))
        .route("/api/job-status/{job_id}", get(dub::job_status))
        .route("/api/preview-translation", post(dub::preview_translation))
        .route("/api/languages", get(dub::supported_languages))
        .route("/api/voices", get(dub::available_voices))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)) // 10 MB limit
}

/// Wire-level error for every API route.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            // The wire detail deliberately omits the id; clients already
            // know which job they asked for.
            StoreError::NotFound(_) => ApiError::NotFound("Job not found".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PreviewError> for ApiError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::Invalid(inner) => ApiError::BadRequest(inner.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
