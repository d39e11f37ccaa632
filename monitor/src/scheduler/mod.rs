//! Periodic driver for fleet polls
//!
//! Runs [`HealthMonitor::run_tick`] on a fixed interval using a repeated
//! `tokio-cron-scheduler` job, plus one immediate tick at startup so the
//! channel is populated without waiting a full interval.
//!
//! The scheduler itself does not serialize jobs. A tick that fires while the
//! previous one is still polling is skipped by the monitor's Idle/Polling
//! guard.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, instrument};

use crate::health::{HealthMonitor, TickOutcome};

pub struct PollScheduler {
    monitor: Arc<HealthMonitor>,
    interval: Duration,
    scheduler: JobScheduler,
}

impl PollScheduler {
    pub async fn new(monitor: Arc<HealthMonitor>, interval: Duration) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            monitor,
            interval,
            scheduler,
        })
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let monitor = self.monitor.clone();
        let job = Job::new_repeated_async(self.interval, move |_uuid, _scheduler| {
            let monitor = monitor.clone();
            Box::pin(async move {
                run_scheduled_tick(&monitor).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create poll job: {}", e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add poll job to scheduler: {}", e))?;
        self.scheduler.start().await?;

        info!(
            "Poll scheduler started with {}s interval",
            self.interval.as_secs()
        );

        let monitor = self.monitor.clone();
        tokio::spawn(async move {
            run_scheduled_tick(&monitor).await;
        });

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop scheduler: {}", e))
    }
}

async fn run_scheduled_tick(monitor: &HealthMonitor) {
    match monitor.run_tick().await {
        TickOutcome::Completed(snapshot) => debug!(
            "Scheduled tick published {}/{}",
            snapshot.online_count, snapshot.total_count
        ),
        TickOutcome::SourceFailed(_) => debug!("Scheduled tick aborted by source failure"),
        TickOutcome::Skipped => debug!("Scheduled tick skipped"),
    }
}
