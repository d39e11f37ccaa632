//! Custom error types for the fleet monitor
//!
//! Provides structured error handling with context for the different failure
//! scenarios of a poll tick. Only configuration errors are fatal, and only at
//! startup; everything else is recorded on a verdict or logged.

use std::fmt;

/// Main error type for the fleet monitor
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Hostname could not be resolved
    Resolution { hostname: String, reason: String },

    /// Probe failures against a single address
    Probe(ProbeError),

    /// Endpoint list could not be retrieved
    Source(SourceError),

    /// Notification sink call failed
    Sink(SinkError),

    /// Unexpected failure while processing one endpoint
    Internal { endpoint: String, reason: String },
}

/// Configuration error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Probe error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// TCP, TLS or WebSocket handshake failed
    ConnectionFailed { address: String, reason: String },

    /// A probe step did not finish in time
    Timeout { address: String, step: String },

    /// Sending a request or receiving a response failed
    Transport { address: String, reason: String },

    /// Response arrived but lacked the expected fields
    Protocol { address: String, reason: String },
}

/// Endpoint source error variants
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Request to the source URL failed
    RequestFailed { url: String, reason: String },

    /// Source answered with a non-success status
    HttpStatus { url: String, status: u16 },

    /// Body could not be interpreted as an endpoint list
    InvalidDocument { url: String, reason: String },
}

/// Notification sink error variants
#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    /// Request to the sink failed before a response arrived
    RequestFailed { operation: String, reason: String },

    /// Sink rejected the call
    Rejected {
        operation: String,
        status: u16,
        body: String,
    },

    /// Sink answered but the response was unusable
    InvalidResponse { operation: String, reason: String },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Config(e) => write!(f, "Configuration error: {}", e),
            MonitorError::Resolution { hostname, reason } => {
                write!(f, "Failed to resolve {}: {}", hostname, reason)
            }
            MonitorError::Probe(e) => write!(f, "Probe error: {}", e),
            MonitorError::Source(e) => write!(f, "Endpoint source error: {}", e),
            MonitorError::Sink(e) => write!(f, "Notification sink error: {}", e),
            MonitorError::Internal { endpoint, reason } => {
                write!(f, "Internal error while checking {}: {}", endpoint, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::ConnectionFailed { address, reason } => {
                write!(f, "Connection to {} failed: {}", address, reason)
            }
            ProbeError::Timeout { address, step } => {
                write!(f, "Timeout while {} on {}", step, address)
            }
            ProbeError::Transport { address, reason } => {
                write!(f, "Transport failure on {}: {}", address, reason)
            }
            ProbeError::Protocol { address, reason } => {
                write!(f, "Invalid response from {}: {}", address, reason)
            }
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::RequestFailed { url, reason } => {
                write!(f, "Request to {} failed: {}", url, reason)
            }
            SourceError::HttpStatus { url, status } => {
                write!(f, "{} returned HTTP {}", url, status)
            }
            SourceError::InvalidDocument { url, reason } => {
                write!(f, "Invalid endpoint list from {}: {}", url, reason)
            }
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::RequestFailed { operation, reason } => {
                write!(f, "{} failed: {}", operation, reason)
            }
            SinkError::Rejected {
                operation,
                status,
                body,
            } => {
                write!(f, "{} rejected with HTTP {}: {}", operation, status, body)
            }
            SinkError::InvalidResponse { operation, reason } => {
                write!(f, "{} returned an invalid response: {}", operation, reason)
            }
        }
    }
}

impl std::error::Error for MonitorError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ProbeError {}
impl std::error::Error for SourceError {}
impl std::error::Error for SinkError {}

impl From<ConfigError> for MonitorError {
    fn from(err: ConfigError) -> Self {
        MonitorError::Config(err)
    }
}

impl From<ProbeError> for MonitorError {
    fn from(err: ProbeError) -> Self {
        MonitorError::Probe(err)
    }
}

impl From<SourceError> for MonitorError {
    fn from(err: SourceError) -> Self {
        MonitorError::Source(err)
    }
}

impl From<SinkError> for MonitorError {
    fn from(err: SinkError) -> Self {
        MonitorError::Sink(err)
    }
}
