//! Folding per-address probe results into one endpoint verdict

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::probe::Prober;
use super::types::{Endpoint, EndpointVerdict, ProbeResult};

/// Which reachable probe supplies the verdict's version and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativePolicy {
    /// Last reachable probe to complete wins
    LastCompleted,
    /// Greatest reported height wins, ties go to the later completion
    #[default]
    HighestHeight,
}

pub struct EndpointAggregator {
    prober: Arc<dyn Prober>,
    probe_timeout: Duration,
    max_concurrent_probes: usize,
    policy: RepresentativePolicy,
}

impl EndpointAggregator {
    pub fn new(
        prober: Arc<dyn Prober>,
        probe_timeout: Duration,
        max_concurrent_probes: usize,
        policy: RepresentativePolicy,
    ) -> Self {
        Self {
            prober,
            probe_timeout,
            max_concurrent_probes: max_concurrent_probes.max(1),
            policy,
        }
    }

    /// Probe every address concurrently and fold the results in completion
    /// order. Zero addresses yield an offline verdict with zero counts.
    pub async fn aggregate(
        &self,
        endpoint: &Endpoint,
        addresses: &BTreeSet<IpAddr>,
    ) -> EndpointVerdict {
        let prober = &self.prober;
        let probe_timeout = self.probe_timeout;

        let results: Vec<ProbeResult> = stream::iter(addresses.iter().copied())
            .map(|address| async move { prober.probe(endpoint, address, probe_timeout).await })
            .buffer_unordered(self.max_concurrent_probes)
            .collect()
            .await;

        let verdict = fold_results(endpoint.clone(), results, self.policy);
        debug!(
            "{}: {}/{} addresses online",
            endpoint.uri, verdict.online_address_count, verdict.total_address_count
        );
        verdict
    }
}

/// Fold probe results, given in completion order, into a verdict.
pub fn fold_results(
    endpoint: Endpoint,
    results: Vec<ProbeResult>,
    policy: RepresentativePolicy,
) -> EndpointVerdict {
    let total_address_count = results.len();
    let mut online_address_count = 0;
    let mut representative: Option<&ProbeResult> = None;
    let mut errors = Vec::new();

    for result in &results {
        if !result.reachable {
            let cause = result.error.as_deref().unwrap_or("unreachable");
            errors.push(format!("{}: {}", result.address, cause));
            continue;
        }

        online_address_count += 1;
        representative = match (policy, representative) {
            (_, None) | (RepresentativePolicy::LastCompleted, Some(_)) => Some(result),
            (RepresentativePolicy::HighestHeight, Some(current)) => {
                if result.height >= current.height {
                    Some(result)
                } else {
                    Some(current)
                }
            }
        };
    }

    EndpointVerdict {
        endpoint,
        online_address_count,
        total_address_count,
        is_online: online_address_count > 0,
        version: representative.and_then(|r| r.version.clone()),
        height: representative.and_then(|r| r.height),
        errors,
    }
}
