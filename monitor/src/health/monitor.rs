// File: monitor/src/health/monitor.rs
//! Fleet-wide poll orchestration
//!
//! One tick fetches the endpoint list, resolves and probes every endpoint
//! with bounded fan-out, assembles the snapshot once all verdicts are in, and
//! hands it to notification sync. Ticks never overlap: a tick that starts
//! while another is polling is skipped outright.
//!
//! Notification sync runs in its own task. Dropping a tick future (timeout,
//! client disconnect) does not interrupt it, and the next tick waits for it
//! on the service lock before publishing.

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::aggregator::EndpointAggregator;
use super::probe::ElectrumProber;
use super::resolver::{AddressResolver, DnsResolver};
use super::types::{Endpoint, EndpointVerdict, FleetSnapshot};
use crate::config::Config;
use crate::errors::MonitorError;
use crate::services::{DiscordSink, NotificationService, NotificationState, NotificationTargets};
use crate::source::{EndpointSource, HttpEndpointSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Another tick was still polling
    Skipped,
    /// Endpoint list unavailable; notification state untouched
    SourceFailed(MonitorError),
    /// Snapshot assembled and handed to notification sync
    Completed(FleetSnapshot),
}

/// Resets the polling flag when the tick ends, including on panic.
struct PollingGuard<'a>(&'a AtomicBool);

impl Drop for PollingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct HealthMonitor {
    source: Arc<dyn EndpointSource>,
    resolver: Arc<dyn AddressResolver>,
    aggregator: Arc<EndpointAggregator>,
    notifications: Arc<Mutex<NotificationService>>,
    max_concurrent_endpoints: usize,
    polling: AtomicBool,
    latest_snapshot: RwLock<Option<FleetSnapshot>>,
}

impl HealthMonitor {
    pub fn new(
        source: Arc<dyn EndpointSource>,
        resolver: Arc<dyn AddressResolver>,
        aggregator: Arc<EndpointAggregator>,
        notifications: NotificationService,
        max_concurrent_endpoints: usize,
    ) -> Self {
        Self {
            source,
            resolver,
            aggregator,
            notifications: Arc::new(Mutex::new(notifications)),
            max_concurrent_endpoints: max_concurrent_endpoints.max(1),
            polling: AtomicBool::new(false),
            latest_snapshot: RwLock::new(None),
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpEndpointSource::new(
            config.endpoint_source_url.clone(),
            config.endpoint_list_field.clone(),
            Duration::from_secs(config.source_timeout_seconds),
        )?;
        let resolver = DnsResolver::new(&config.dns);
        let prober = ElectrumProber::new(&config.probe)
            .map_err(|e| anyhow!("Failed to build TLS client config: {}", e))?;
        let aggregator = EndpointAggregator::new(
            Arc::new(prober),
            Duration::from_secs(config.probe.timeout_seconds),
            config.max_concurrent_probes,
            config.representative_policy,
        );
        let sink = DiscordSink::new(&config.discord)?;
        let notifications = NotificationService::new(
            Arc::new(sink),
            NotificationTargets {
                channel: config.discord.channel_id.clone(),
                label_target: config.discord.label_channel_id.clone(),
                label_template: config.discord.label_template.clone(),
            },
        );

        Ok(Self::new(
            Arc::new(source),
            Arc::new(resolver),
            Arc::new(aggregator),
            notifications,
            config.max_concurrent_endpoints,
        ))
    }

    pub fn poll_state(&self) -> PollState {
        if self.polling.load(Ordering::Acquire) {
            PollState::Polling
        } else {
            PollState::Idle
        }
    }

    pub async fn latest_snapshot(&self) -> Option<FleetSnapshot> {
        self.latest_snapshot.read().await.clone()
    }

    pub async fn notification_state(&self) -> NotificationState {
        self.notifications.lock().await.state().clone()
    }

    fn try_begin_tick(&self) -> Option<PollingGuard<'_>> {
        self.polling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PollingGuard(&self.polling))
    }

    /// Run one fleet-wide tick.
    pub async fn run_tick(&self) -> TickOutcome {
        let Some(_guard) = self.try_begin_tick() else {
            warn!("Previous poll still running, skipping this tick");
            return TickOutcome::Skipped;
        };

        let tick_id = Uuid::new_v4();
        self.poll()
            .instrument(info_span!("tick", id = %tick_id))
            .await
    }

    async fn poll(&self) -> TickOutcome {
        let started = Instant::now();

        let endpoints = match self.source.fetch_endpoints().await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                error!("Tick aborted, endpoint list unavailable: {}", e);
                return TickOutcome::SourceFailed(e.into());
            }
        };

        let verdicts = self.check_all_endpoints(endpoints).await;
        let snapshot = FleetSnapshot::from_verdicts(verdicts);

        info!(
            "Fleet poll complete: {}/{} endpoints online in {:.2}s",
            snapshot.online_count,
            snapshot.total_count,
            started.elapsed().as_secs_f64()
        );

        *self.latest_snapshot.write().await = Some(snapshot.clone());

        let notifications = self.notifications.clone();
        let published = snapshot.clone();
        let publish = tokio::spawn(
            async move {
                notifications.lock_owned().await.publish(&published).await;
            }
            .in_current_span(),
        );
        if let Err(e) = publish.await {
            error!("Notification sync task failed: {}", e);
        }

        TickOutcome::Completed(snapshot)
    }

    /// Check every endpoint with bounded concurrency, preserving input order.
    /// Each endpoint runs in its own task so a panic stays local to it.
    pub async fn check_all_endpoints(&self, endpoints: Vec<Endpoint>) -> Vec<EndpointVerdict> {
        stream::iter(endpoints)
            .map(|endpoint| {
                let resolver = self.resolver.clone();
                let aggregator = self.aggregator.clone();
                async move {
                    let fallback = endpoint.clone();
                    let task = tokio::spawn(async move {
                        check_endpoint(resolver.as_ref(), aggregator.as_ref(), &endpoint).await
                    });

                    match task.await {
                        Ok(verdict) => verdict,
                        Err(e) => {
                            let err = MonitorError::Internal {
                                endpoint: fallback.uri.clone(),
                                reason: e.to_string(),
                            };
                            error!("{}", err);
                            EndpointVerdict::offline(fallback, vec![err.to_string()])
                        }
                    }
                }
            })
            .buffered(self.max_concurrent_endpoints)
            .collect()
            .await
    }
}

/// Resolve then aggregate one endpoint. A resolution failure is recorded on
/// the verdict rather than returned.
pub async fn check_endpoint(
    resolver: &dyn AddressResolver,
    aggregator: &EndpointAggregator,
    endpoint: &Endpoint,
) -> EndpointVerdict {
    let resolution = resolver.resolve(&endpoint.hostname).await;
    let mut verdict = aggregator.aggregate(endpoint, &resolution.addresses).await;
    if let Some(e) = resolution.error {
        verdict.errors.insert(0, e.to_string());
    }
    verdict
}
