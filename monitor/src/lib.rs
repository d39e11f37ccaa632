pub mod config;
pub mod constants;
pub mod errors;
pub mod health;
pub mod scheduler;
pub mod services;
pub mod source;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use errors::MonitorError;
pub use health::{FleetSnapshot, HealthMonitor, TickOutcome};
pub use scheduler::PollScheduler;
pub use services::NotificationService;
