// Fleet status endpoints

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tracing::{error, info};

use super::common::{api_error, ApiResponse, ApiResult};
use crate::health::{FleetSnapshot, PollState, TickOutcome};
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    pub polling: bool,
    pub last_poll: Option<String>,
}

/// Liveness plus whether a poll is in flight
pub async fn get_service_health(State(state): State<AppState>) -> ApiResult<ServiceHealth> {
    let last_poll = state
        .health_monitor
        .latest_snapshot()
        .await
        .map(|s| s.timestamp.to_rfc3339());

    Ok(Json(ApiResponse::success(ServiceHealth {
        status: "ok".to_string(),
        polling: state.health_monitor.poll_state() == PollState::Polling,
        last_poll,
    })))
}

/// Latest completed fleet snapshot
pub async fn get_fleet_status(State(state): State<AppState>) -> ApiResult<FleetSnapshot> {
    match state.health_monitor.latest_snapshot().await {
        Some(snapshot) => Ok(Json(ApiResponse::success(snapshot))),
        None => Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No poll has completed yet",
        )),
    }
}

/// Run a tick now (for refresh button). The tick runs in its own task so a
/// client hanging up does not cut it short.
pub async fn refresh_fleet_status(State(state): State<AppState>) -> ApiResult<FleetSnapshot> {
    info!("Manual refresh requested for fleet status");
    let monitor = state.health_monitor.clone();
    let outcome = tokio::spawn(async move { monitor.run_tick().await })
        .await
        .map_err(|e| {
            error!("Manual refresh task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Refresh task failed")
        })?;

    match outcome {
        TickOutcome::Completed(snapshot) => Ok(Json(ApiResponse::success(snapshot))),
        TickOutcome::Skipped => Err(api_error(
            StatusCode::CONFLICT,
            "A poll is already in progress",
        )),
        TickOutcome::SourceFailed(e) => Err(api_error(StatusCode::BAD_GATEWAY, e.to_string())),
    }
}
