// File: monitor/src/config/secrets.rs
//! Secrets loader for the Discord bot token.
//!
//! Secrets are stored in a separate TOML file (config/secrets.toml) that should
//! be excluded from version control. The `DISCORD_BOT_TOKEN` environment
//! variable takes precedence over the file when set.
//!
//! Example secrets.toml:
//! ```toml
//! [discord]
//! bot_token = "secret-bot-token"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::defaults;

/// Structure matching the secrets.toml file format
#[derive(Debug, Deserialize, Default)]
pub struct SecretsFile {
    #[serde(default)]
    pub discord: DiscordSecrets,
}

#[derive(Debug, Deserialize, Default)]
pub struct DiscordSecrets {
    pub bot_token: Option<String>,
}

/// Loader for secrets from the secrets.toml file
pub struct SecretsLoader {
    secrets: SecretsFile,
}

impl SecretsLoader {
    /// Load secrets from the specified file path.
    /// Returns an empty loader if the file doesn't exist.
    pub fn load(secrets_path: &Path) -> Result<Self> {
        if !secrets_path.exists() {
            warn!(
                "Secrets file not found at {:?}, bot token must come from {}",
                secrets_path,
                defaults::DISCORD_TOKEN_ENV
            );
            return Ok(Self {
                secrets: SecretsFile::default(),
            });
        }

        let content = std::fs::read_to_string(secrets_path)
            .with_context(|| format!("Failed to read secrets file: {:?}", secrets_path))?;

        let secrets: SecretsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file: {:?}", secrets_path))?;

        info!("Loaded secrets from {:?}", secrets_path);

        Ok(Self { secrets })
    }

    /// Bot token from the file, without the environment override.
    pub fn discord_bot_token(&self) -> Option<&str> {
        self.secrets
            .discord
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// Bot token with the environment variable taking precedence.
    pub fn resolve_discord_bot_token(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.discord_bot_token().map(str::to_string))
    }
}
