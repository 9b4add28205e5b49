mod app_state;
mod config;
mod models;
mod routes;
mod services;

use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    dubbing::DubbingService, store::JobStore, translate::OpenAiTranslator, video::VideoDbClient,
    voice::ElevenLabsClient,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing dubber server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_histogram!(
        "dubbing_processing_seconds",
        "Time from job submission to a terminal state"
    );
    metrics::describe_counter!("dubbing_jobs_total", "Total dubbing jobs submitted");
    metrics::describe_counter!(
        "dubbing_jobs_completed",
        "Total dubbing jobs that completed"
    );
    metrics::describe_counter!("dubbing_jobs_failed", "Total dubbing jobs that failed");
    metrics::describe_gauge!(
        "dubbing_jobs_in_store",
        "Current number of jobs held in memory"
    );

    let ingestion_configured = !config.videodb_api_key.is_empty();
    let translation_configured = !config.openai_api_key.is_empty();
    if !ingestion_configured {
        tracing::warn!("VIDEODB_API_KEY is not set; dubbing jobs will fail at ingestion");
    }
    if !translation_configured {
        tracing::warn!("OPENAI_API_KEY is not set; dubbing jobs will fail at translation");
    }
    if config.elevenlabs_api_key.as_deref().unwrap_or("").is_empty() {
        tracing::warn!(
            "ELEVENLABS_API_KEY is not set; jobs will complete in demo mode (translation only)"
        );
    }

    let provider_timeout = Duration::from_secs(config.provider_timeout_secs);

    // Initialize provider clients
    tracing::info!("Initializing video infrastructure client");
    let videodb = Arc::new(VideoDbClient::new(
        &config.videodb_base_url,
        &config.videodb_api_key,
        provider_timeout,
    ));

    tracing::info!("Initializing translation client");
    let translator = Arc::new(OpenAiTranslator::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.openai_model,
        provider_timeout,
    ));

    tracing::info!("Initializing voice synthesis client");
    let synthesizer = Arc::new(ElevenLabsClient::new(
        &config.elevenlabs_base_url,
        config.elevenlabs_api_key.clone(),
        provider_timeout,
    ));

    // Initialize the in-memory job store
    let store = Arc::new(JobStore::new(
        config.completed_job_ttl_secs.map(Duration::from_secs),
    ));

    // The video client handles both ingestion and composition
    let dubbing = DubbingService::new(
        store.clone(),
        videodb.clone(),
        translator,
        synthesizer,
        videodb,
        config.supported_languages.clone(),
    );

    // Create shared application state
    let state = AppState::new(store, dubbing, ingestion_configured, translation_configured);

    // Build API routes
    let app = routes::router(state, prometheus_handle);

    tracing::info!("Starting dubber on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
