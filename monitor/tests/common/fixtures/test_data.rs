//! Common test data and constants

use monitor::health::{Endpoint, EndpointVerdict, Scheme};
use std::net::IpAddr;

/// Common test hostnames
pub mod hosts {
    pub const A: &str = "a.example.com";
    pub const B: &str = "b.example.com";
    pub const C: &str = "c.example.com";
    pub const X: &str = "x.example.com";
}

/// Common server versions
pub mod versions {
    pub const V1: &str = "v1";
    pub const V2: &str = "v2";
    pub const ELECTRUMX: &str = "ElectrumX 1.16.0";
}

/// Common test channels
pub mod channels {
    pub const STATUS: &str = "1339641920141393970";
    pub const LABEL: &str = "1339641920141393971";
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

pub fn endpoint(host: &str) -> Endpoint {
    Endpoint::new(Scheme::Wss, host, 50004)
}

/// Verdict with one address, online or not
pub fn verdict(host: &str, online: bool) -> EndpointVerdict {
    EndpointVerdict {
        endpoint: endpoint(host),
        online_address_count: usize::from(online),
        total_address_count: 1,
        is_online: online,
        version: online.then(|| versions::V1.to_string()),
        height: online.then_some(100),
        errors: if online {
            vec![]
        } else {
            vec![format!("{}: connection refused", host)]
        },
    }
}
