//! Shared application state.

use std::sync::Arc;

use lumigrade_core::Config;
use lumigrade_processing::GradingConfig;

/// Read-only state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub grading: Arc<GradingConfig>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let grading = Arc::new(GradingConfig::from_config(&config));
        Self { config, grading }
    }
}
