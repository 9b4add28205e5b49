use std::sync::Arc;

use crate::services::dubbing::DubbingService;
use crate::services::store::JobStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub dubbing: DubbingService,
    /// Provider configuration flags surfaced by the health endpoint.
    pub ingestion_configured: bool,
    pub translation_configured: bool,
}

impl AppState {
    pub fn new(
        store: Arc<JobStore>,
        dubbing: DubbingService,
        ingestion_configured: bool,
        translation_configured: bool,
    ) -> Self {
        Self {
            store,
            dubbing,
            ingestion_configured,
            translation_configured,
        }
    }
}
