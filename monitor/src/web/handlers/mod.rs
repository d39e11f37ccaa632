// API handlers for the status server

pub mod common;
pub mod health;

pub use common::{ApiResponse, ApiResult};
pub use health::{get_fleet_status, get_service_health, refresh_fleet_status};
