use std::sync::Arc;
use std::time::Duration;

use crate::{db::Storage, services::AnalysisOrchestrator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub storage: Arc<dyn Storage>,
    /// Wall-clock budget for one pipeline run
    pub pipeline_timeout: Duration,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        storage: Arc<dyn Storage>,
        pipeline_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            storage,
            pipeline_timeout,
        }
    }
}
