use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub ingestion: String,
    pub translation: String,
    pub synthesis: String,
}

/// GET /api/health — provider configuration status.
///
/// Ingestion and translation must be configured for any job to succeed, so
/// a missing key degrades the service. Synthesis is optional: without it
/// the pipeline still completes in demo mode (translation only), so an
/// unconfigured voice provider reports "demo" and does not degrade.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ingestion = if state.ingestion_configured {
        "ok"
    } else {
        "error"
    };
    let translation = if state.translation_configured {
        "ok"
    } else {
        "error"
    };
    let synthesis = if state.dubbing.synthesis_available() {
        "ok"
    } else {
        "demo"
    };

    let all_required = state.ingestion_configured && state.translation_configured;
    let status_code = if all_required {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_required {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            ingestion: ingestion.to_string(),
            translation: translation.to_string(),
            synthesis: synthesis.to_string(),
        },
    };

    (status_code, Json(response))
}
