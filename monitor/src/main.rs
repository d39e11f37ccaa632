// File: monitor/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use monitor::config::ConfigManager;
use monitor::health::HealthMonitor;
use monitor::scheduler::PollScheduler;
use monitor::web::start_web_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("monitor=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("tokio_tungstenite=warn".parse()?)
        .add_directive("tungstenite=warn".parse()?)
        .add_directive("hickory_proto=warn".parse()?)
        .add_directive("hickory_resolver=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Electrum fleet sync monitor");

    // Load configuration
    let config_dir = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded: publishing to channel {} (label target: {})",
        config.discord.channel_id,
        config.discord.label_channel_id.as_deref().unwrap_or("none")
    );

    let health_monitor = Arc::new(HealthMonitor::from_config(&config)?);
    info!("Health monitor initialized");

    let mut scheduler = PollScheduler::new(
        health_monitor.clone(),
        Duration::from_secs(config.check_interval_seconds),
    )
    .await?;
    scheduler.start().await?;

    if config.web.enabled {
        let web_config = config.web.clone();
        let monitor_for_api = health_monitor.clone();
        tokio::spawn(async move {
            if let Err(e) = start_web_server(&web_config, monitor_for_api).await {
                error!("Status API stopped: {}", e);
            }
        });
    } else {
        info!("Status API disabled");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping poll scheduler");

    if let Err(e) = scheduler.shutdown().await {
        warn!("Scheduler shutdown failed: {}", e);
    }

    Ok(())
}
