//! Hostname to address resolution

use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{DnsConfig, DnsUpstream};
use crate::errors::MonitorError;

/// Deduplicated addresses for one hostname, with the failure if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub addresses: BTreeSet<IpAddr>,
    pub error: Option<MonitorError>,
}

impl Resolution {
    pub fn resolved(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
            error: None,
        }
    }

    pub fn failed(hostname: &str, reason: impl Into<String>) -> Self {
        Self {
            addresses: BTreeSet::new(),
            error: Some(MonitorError::Resolution {
                hostname: hostname.to_string(),
                reason: reason.into(),
            }),
        }
    }
}

/// Resolves an endpoint hostname to its current address set.
///
/// Implementations never fail: a lookup error yields an empty set with the
/// diagnostic attached.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, hostname: &str) -> Resolution;
}

pub struct DnsResolver {
    resolver: TokioResolver,
    lookup_timeout: Duration,
}

impl DnsResolver {
    pub fn new(config: &DnsConfig) -> Self {
        let upstream = match config.upstream {
            DnsUpstream::Cloudflare => ResolverConfig::cloudflare(),
            DnsUpstream::Google => ResolverConfig::google(),
            DnsUpstream::Quad9 => ResolverConfig::quad9(),
        };

        let resolver =
            TokioResolver::builder_with_config(upstream, TokioConnectionProvider::default())
                .build();

        info!("DNS resolver configured: {:?} upstream", config.upstream);

        Self {
            resolver,
            lookup_timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

#[async_trait]
impl AddressResolver for DnsResolver {
    async fn resolve(&self, hostname: &str) -> Resolution {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Resolution::resolved([ip]);
        }

        match timeout(self.lookup_timeout, self.resolver.lookup_ip(hostname)).await {
            Ok(Ok(lookup)) => {
                let resolution = Resolution::resolved(lookup.iter());
                debug!(
                    "Resolved {} to {} address(es)",
                    hostname,
                    resolution.addresses.len()
                );
                resolution
            }
            Ok(Err(e)) => {
                warn!("DNS resolution failed for {}: {}", hostname, e);
                Resolution::failed(hostname, e.to_string())
            }
            Err(_) => {
                warn!(
                    "DNS resolution timed out for {} after {}s",
                    hostname,
                    self.lookup_timeout.as_secs()
                );
                Resolution::failed(hostname, "lookup timed out")
            }
        }
    }
}
