//! Fleet health checking
//!
//! This module resolves endpoints, probes their addresses, folds the results
//! into per-endpoint verdicts and orchestrates fleet-wide ticks.

pub mod aggregator;
pub mod monitor;
pub mod probe;
pub mod resolver;
pub mod types;

pub use aggregator::{EndpointAggregator, RepresentativePolicy};
pub use monitor::{HealthMonitor, PollState, TickOutcome};
pub use probe::{ElectrumProber, Prober};
pub use resolver::{AddressResolver, DnsResolver, Resolution};
pub use types::{Endpoint, EndpointVerdict, FleetSnapshot, ProbeResult, Scheme};
