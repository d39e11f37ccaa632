//! Central repository for protocol constants, defaults and limits
//!
//! This module organizes constants by category so that timeouts, intervals
//! and wire-level identifiers have a single source of truth.

use std::time::Duration;

/// Electrum JSON-RPC protocol constants
pub mod protocol {
    /// JSON-RPC version string sent with every request
    pub const JSONRPC_VERSION: &str = "2.0";

    /// Method returning `[server_software_version, protocol_version]`
    pub const METHOD_SERVER_VERSION: &str = "server.version";

    /// Method returning the current chain tip header (with `height`)
    pub const METHOD_HEADERS_SUBSCRIBE: &str = "blockchain.headers.subscribe";

    /// Request id used for the version query
    pub const VERSION_REQUEST_ID: u64 = 1;

    /// Request id used for the headers subscription
    pub const HEADERS_REQUEST_ID: u64 = 2;

    /// Default port for `wss://` endpoints without an explicit port
    pub const DEFAULT_WSS_PORT: u16 = 443;

    /// Default port for `ws://` endpoints without an explicit port
    pub const DEFAULT_WS_PORT: u16 = 80;
}

/// Default configuration values
pub mod defaults {
    /// Default fleet poll interval in seconds
    pub const CHECK_INTERVAL_SECONDS: u64 = 300;

    /// Default per-step probe timeout in seconds
    pub const PROBE_TIMEOUT_SECONDS: u64 = 10;

    /// Default timeout for fetching the endpoint list
    pub const SOURCE_TIMEOUT_SECONDS: u64 = 15;

    /// Default DNS lookup timeout in seconds
    pub const DNS_TIMEOUT_SECONDS: u64 = 5;

    /// Default JSON field holding the endpoint list
    pub const ENDPOINT_LIST_FIELD: &str = "wss";

    /// Default endpoints processed concurrently per tick
    pub const MAX_CONCURRENT_ENDPOINTS: usize = 16;

    /// Default probes run concurrently per endpoint
    pub const MAX_CONCURRENT_PROBES: usize = 8;

    /// Default Discord REST API base
    pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

    /// Default fleet label template
    pub const LABEL_TEMPLATE: &str = "Servers: {online}/{total}";

    /// Default status API bind host
    pub const WEB_HOST: &str = "0.0.0.0";

    /// Default status API port
    pub const WEB_PORT: u16 = 8095;

    /// Environment variable overriding the Discord bot token
    pub const DISCORD_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";
}

/// Notification sink constants
pub mod notifications {
    use super::Duration;

    /// Timeout for a single Discord REST call
    pub const SINK_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Discord caps embeds at 25 fields
    pub const MAX_EMBED_FIELDS: usize = 25;

    /// Discord embed text limits, counted in characters
    pub const MAX_FIELD_NAME_CHARS: usize = 256;
    pub const MAX_FIELD_VALUE_CHARS: usize = 1024;
    pub const MAX_EMBED_TOTAL_CHARS: usize = 6000;

    /// Longest probe error quoted in the offline summary
    pub const MAX_ERROR_CHARS: usize = 200;

    /// Embed colour for the online summary (green)
    pub const ONLINE_COLOR: u32 = 0x2ECC71;

    /// Embed colour for the offline summary (red)
    pub const OFFLINE_COLOR: u32 = 0xE74C3C;
}

/// Probe engine limits
pub mod limits {
    use super::Duration;

    /// Upper bound on the best-effort close handshake after a probe
    pub const SOCKET_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Maximum frames skipped while waiting for a matching response id
    pub const MAX_SKIPPED_FRAMES: usize = 32;
}
