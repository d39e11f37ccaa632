//! Fleet health types and Electrum JSON-RPC response structures

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::constants::protocol;

/// Transport scheme of a monitored endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Ws,
    Wss,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Ws => protocol::DEFAULT_WS_PORT,
            Scheme::Wss => protocol::DEFAULT_WSS_PORT,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical monitored server, identified by its canonical URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub hostname: String,
    pub scheme: Scheme,
    pub port: u16,
    pub uri: String,
}

impl Endpoint {
    /// Parse a `scheme://host:port` entry from the endpoint list.
    ///
    /// Only `ws` and `wss` are accepted. The canonical URI always carries an
    /// explicit port and a lower-cased host, so two spellings of the same
    /// server collapse to one identity.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw.trim()).map_err(|e| format!("invalid URI '{}': {}", raw, e))?;

        let scheme = match url.scheme() {
            "wss" => Scheme::Wss,
            "ws" => Scheme::Ws,
            other => return Err(format!("unsupported scheme '{}' in '{}'", other, raw)),
        };

        let hostname = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| format!("missing host in '{}'", raw))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_ascii_lowercase();

        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(Self::new(scheme, hostname, port))
    }

    pub fn new(scheme: Scheme, hostname: impl Into<String>, port: u16) -> Self {
        let hostname = hostname.into();
        let host_part = if hostname.contains(':') {
            format!("[{}]", hostname)
        } else {
            hostname.clone()
        };
        let uri = format!("{}://{}:{}", scheme, host_part, port);
        Self {
            hostname,
            scheme,
            port,
            uri,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Outcome of probing one address of one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub address: IpAddr,
    pub reachable: bool,
    pub version: Option<String>,
    pub height: Option<u64>,
    pub error: Option<String>,
    pub latency_ms: Option<u64>,
}

impl ProbeResult {
    pub fn reachable(address: IpAddr, version: String, height: u64, latency_ms: u64) -> Self {
        Self {
            address,
            reachable: true,
            version: Some(version),
            height: Some(height),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    pub fn unreachable(address: IpAddr, error: impl Into<String>) -> Self {
        Self {
            address,
            reachable: false,
            version: None,
            height: None,
            error: Some(error.into()),
            latency_ms: None,
        }
    }
}

/// Computed health/sync state of one endpoint for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointVerdict {
    pub endpoint: Endpoint,
    pub online_address_count: usize,
    pub total_address_count: usize,
    pub is_online: bool,
    pub version: Option<String>,
    pub height: Option<u64>,
    pub errors: Vec<String>,
}

impl EndpointVerdict {
    /// Verdict for an endpoint that could not be checked at all
    pub fn offline(endpoint: Endpoint, errors: Vec<String>) -> Self {
        Self {
            endpoint,
            online_address_count: 0,
            total_address_count: 0,
            is_online: false,
            version: None,
            height: None,
            errors,
        }
    }
}

/// Complete set of verdicts for one tick, plus aggregate counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub timestamp: DateTime<Utc>,
    pub verdicts: Vec<EndpointVerdict>,
    pub online_count: usize,
    pub total_count: usize,
}

impl FleetSnapshot {
    pub fn from_verdicts(verdicts: Vec<EndpointVerdict>) -> Self {
        Self::at(Utc::now(), verdicts)
    }

    pub fn at(timestamp: DateTime<Utc>, verdicts: Vec<EndpointVerdict>) -> Self {
        let online_count = verdicts.iter().filter(|v| v.is_online).count();
        let total_count = verdicts.len();
        Self {
            timestamp,
            verdicts,
            online_count,
            total_count,
        }
    }

    pub fn online(&self) -> impl Iterator<Item = &EndpointVerdict> {
        self.verdicts.iter().filter(|v| v.is_online)
    }

    pub fn offline(&self) -> impl Iterator<Item = &EndpointVerdict> {
        self.verdicts.iter().filter(|v| !v.is_online)
    }

    pub fn has_offline(&self) -> bool {
        self.online_count < self.total_count
    }
}

/// Electrum JSON-RPC response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// JSON-RPC request as sent to the server
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: [(); 0],
    pub id: u64,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, id: u64) -> Self {
        Self {
            jsonrpc: protocol::JSONRPC_VERSION,
            method,
            params: [],
            id,
        }
    }
}
