// File: monitor/src/web/server.rs
use crate::config::WebConfig;
use crate::health::HealthMonitor;
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(config: &WebConfig, health_monitor: Arc<HealthMonitor>) -> Result<()> {
    let app = create_router(AppState::new(health_monitor));
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Status API running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_service_health))
        .route("/api/status", get(handlers::get_fleet_status))
        .route("/api/status/refresh", post(handlers::refresh_fleet_status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
