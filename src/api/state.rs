use crate::config::AppConfig;
use crate::persistence::DataStore;

use std::sync::Arc;
use std::time::Instant;

/// State shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DataStore>,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<DataStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
