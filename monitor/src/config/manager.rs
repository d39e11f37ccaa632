// File: monitor/src/config/manager.rs
use super::{Config, SecretsLoader};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

use crate::constants::defaults;

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let token_env = std::env::var(defaults::DISCORD_TOKEN_ENV).ok();
        let config = Self::load_configuration(&config_dir, token_env).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    /// Load `main.toml` and `secrets.toml` from `config_dir`. The token
    /// override is passed in rather than read here so tests stay hermetic.
    pub async fn load_configuration(config_dir: &str, token_env: Option<String>) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content = fs::read_to_string(&main_config_path)
            .await
            .map_err(|e| anyhow!("Failed to read main config {}: {}", main_config_path, e))?;

        let mut config: Config = toml::from_str(&main_config_content)
            .map_err(|e| anyhow!("Failed to parse main config: {}", e))?;

        let secrets_path = format!("{}/secrets.toml", config_dir);
        let secrets = SecretsLoader::load(Path::new(&secrets_path))?;
        config.discord.bot_token = secrets
            .resolve_discord_bot_token(token_env)
            .unwrap_or_default();

        config
            .validate()
            .map_err(|e| anyhow!("Invalid configuration in {}: {}", main_config_path, e))?;

        info!(
            "Loaded configuration: source {}, interval {}s, probe timeout {}s, concurrency {}x{}",
            config.endpoint_source_url,
            config.check_interval_seconds,
            config.probe.timeout_seconds,
            config.max_concurrent_endpoints,
            config.max_concurrent_probes
        );

        Ok(config)
    }
}
