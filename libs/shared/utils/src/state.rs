use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::ClinicStore;

/// Shared handler state. The store is injected here once at startup and
/// reached by every cell through this handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ClinicStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
