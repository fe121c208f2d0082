use crate::app::{DataStore, Refresher};
use crate::healthcheck::HealthcheckReporter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use topstories_core::{BackgroundTasks, HnApi, KvStore, RefreshOutcome};
use tracing::{error, info};

/// Background task: runs the unguarded refresh on a fixed interval.
pub struct RefreshScheduler<H: HnApi + 'static> {
    refresher: Arc<Refresher<H>>,
    interval: Duration,
    healthcheck: Option<Arc<HealthcheckReporter>>,
    tasks: BackgroundTasks,
}

impl<H: HnApi + 'static> RefreshScheduler<H> {
    pub fn new(
        refresher: Arc<Refresher<H>>,
        interval: Duration,
        healthcheck: Option<Arc<HealthcheckReporter>>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            refresher,
            interval,
            healthcheck,
            tasks,
        }
    }

    /// One scheduled invocation. Failures are logged; the previous pointer
    /// stays in place until the next tick succeeds.
    pub async fn run_once(&self) -> Option<RefreshOutcome> {
        let result = match &self.healthcheck {
            Some(hc) => hc
                .report(&self.tasks, || self.refresher.refresh())
                .await
                .map_err(anyhow::Error::from),
            None => self.refresher.refresh().await.map_err(anyhow::Error::from),
        };

        match result {
            Ok(outcome) => {
                info!(
                    accepted = ?outcome.accepted,
                    skipped = outcome.skipped,
                    "scheduled refresh complete"
                );
                Some(outcome)
            }
            Err(e) => {
                error!("Scheduled refresh failed: {}", e);
                None
            }
        }
    }

    /// Run the refresh loop. Call via `tokio::spawn`. The first tick fires
    /// immediately so a fresh deployment has data to serve.
    pub async fn run(self) {
        info!("RefreshScheduler started (interval: {}s)", self.interval.as_secs());
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }
}

/// Background task: physically drops expired keys.
pub struct ExpirySweeper {
    kv: Arc<DataStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(kv: Arc<DataStore>, interval: Duration) -> Self {
        Self { kv, interval }
    }

    pub fn sweep_once(&self) -> usize {
        match self.kv.purge_expired() {
            Ok(0) => 0,
            Ok(n) => {
                info!("Sweep: removed {} expired keys", n);
                n
            }
            Err(e) => {
                error!("Sweep failed: {}", e);
                0
            }
        }
    }

    pub async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            self.sweep_once();
        }
    }
}
