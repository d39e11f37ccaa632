// File: monitor/src/config/mod.rs
pub mod manager;
pub mod secrets;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::errors::ConfigError;
use crate::health::RepresentativePolicy;

pub use manager::ConfigManager;
pub use secrets::SecretsLoader;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    pub endpoint_source_url: String,
    #[serde(default = "default_endpoint_list_field")]
    pub endpoint_list_field: String,
    #[serde(default = "default_source_timeout")]
    pub source_timeout_seconds: u64,
    #[serde(default = "default_max_concurrent_endpoints")]
    pub max_concurrent_endpoints: usize,
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    #[serde(default)]
    pub representative_policy: RepresentativePolicy,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    pub discord: DiscordConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
    /// Skip certificate validation for probed servers. Electrum servers are
    /// commonly self-signed, so this defaults to true; set it to false to
    /// validate against the webpki roots.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_probe_timeout(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsUpstream {
    #[default]
    Cloudflare,
    Google,
    Quad9,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default)]
    pub upstream: DnsUpstream,
    #[serde(default = "default_dns_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream: DnsUpstream::default(),
            timeout_seconds: default_dns_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
    pub channel_id: String,
    pub label_channel_id: Option<String>,
    #[serde(default = "default_label_template")]
    pub label_template: String,
    // Populated from secrets.toml or the environment
    #[serde(skip)]
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Config {
    /// Reject values that would stall or disable polling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("check_interval_seconds", self.check_interval_seconds),
            ("source_timeout_seconds", self.source_timeout_seconds),
            ("probe.timeout_seconds", self.probe.timeout_seconds),
            ("dns.timeout_seconds", self.dns.timeout_seconds),
            (
                "max_concurrent_endpoints",
                self.max_concurrent_endpoints as u64,
            ),
            ("max_concurrent_probes", self.max_concurrent_probes as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.endpoint_source_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "endpoint_source_url".to_string(),
            });
        }
        if self.discord.channel_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "discord.channel_id".to_string(),
            });
        }
        if self.discord.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "discord.bot_token".to_string(),
            });
        }

        Ok(())
    }
}

fn default_check_interval() -> u64 {
    defaults::CHECK_INTERVAL_SECONDS
}

fn default_endpoint_list_field() -> String {
    defaults::ENDPOINT_LIST_FIELD.to_string()
}

fn default_source_timeout() -> u64 {
    defaults::SOURCE_TIMEOUT_SECONDS
}

fn default_max_concurrent_endpoints() -> usize {
    defaults::MAX_CONCURRENT_ENDPOINTS
}

fn default_max_concurrent_probes() -> usize {
    defaults::MAX_CONCURRENT_PROBES
}

fn default_probe_timeout() -> u64 {
    defaults::PROBE_TIMEOUT_SECONDS
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_dns_timeout() -> u64 {
    defaults::DNS_TIMEOUT_SECONDS
}

fn default_discord_api_base() -> String {
    defaults::DISCORD_API_BASE.to_string()
}

fn default_label_template() -> String {
    defaults::LABEL_TEMPLATE.to_string()
}

fn default_web_enabled() -> bool {
    true
}

fn default_web_host() -> String {
    defaults::WEB_HOST.to_string()
}

fn default_web_port() -> u16 {
    defaults::WEB_PORT
}
