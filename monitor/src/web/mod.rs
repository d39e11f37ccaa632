pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::health::HealthMonitor;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub health_monitor: Arc<HealthMonitor>,
}

impl AppState {
    pub fn new(health_monitor: Arc<HealthMonitor>) -> Self {
        Self { health_monitor }
    }
}
