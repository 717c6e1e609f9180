//! Scheduler: wraps one pipeline pass with bounded retry, then sleeps
//! a fixed interval before the next pass. Runs until shutdown.
//!
//! A cycle is: up to `max_attempts` calls to `run_once` with
//! `retry_delay` between failures; if all attempts fail, log and move
//! on; the next scheduled cycle is the recovery mechanism, there is no
//! escalation path. Shutdown is honored between cycles and during the
//! cycle sleep, never mid-message.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::pipeline::intake::IntakeTask;

/// Retry and cadence policy.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Attempts per cycle.
    pub max_attempts: u32,
    /// Delay between failed attempts.
    pub retry_delay: Duration,
    /// Sleep between cycles.
    pub cycle_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(10),
            cycle_interval: Duration::from_secs(3600), // 1 hour
        }
    }
}

/// Runs the intake task on a fixed cadence with bounded retries.
pub struct Scheduler {
    task: Arc<dyn IntakeTask>,
    config: SchedulerConfig,
    shutdown: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(
        task: Arc<dyn IntakeTask>,
        config: SchedulerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            task,
            config,
            shutdown,
        }
    }

    /// Run forever until the shutdown signal flips.
    pub async fn run(mut self) {
        info!(
            cycle_secs = self.config.cycle_interval.as_secs(),
            max_attempts = self.config.max_attempts,
            "Scheduler started"
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            info!("Scan cycle started");
            self.run_cycle().await;

            info!(
                secs = self.config.cycle_interval.as_secs(),
                "Sleeping until next cycle"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.cycle_interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// One cycle: retry `run_once` up to the attempt budget.
    async fn run_cycle(&self) {
        for attempt in 1..=self.config.max_attempts {
            match self.task.run_once().await {
                Ok(summary) => {
                    info!(
                        attempt,
                        accepted = summary.accepted,
                        rejected = summary.rejected,
                        failed = summary.failed,
                        "Scan cycle completed"
                    );
                    return;
                }
                Err(e) => {
                    error!(
                        attempt,
                        max = self.config.max_attempts,
                        error = %e,
                        "Scan attempt failed"
                    );
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }
        error!("All attempts failed, skipping to next cycle");
    }
}
