//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Periodic simulation driver and its lifecycle handle."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use swm_common::config::SimulationConfig;
use swm_common::metrics::{JitterSummary, LoopTimingReporter};
use swm_common::time::jitter_us;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::FleetError;
use crate::fleet::FleetController;

/// Fixed-period ticker. The first tick fires one full period after creation.
#[derive(Debug)]
pub struct RateLimiter {
    interval: tokio::time::Interval,
}

impl RateLimiter {
    pub fn new(period: Duration) -> Self {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) -> tokio::time::Instant {
        self.interval.tick().await
    }
}

/// Drives [`FleetController::tick`] on a fixed interval from a seeded random source.
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    controller: Arc<FleetController>,
    interval: Duration,
    seed: u64,
}

impl SimulationDriver {
    pub fn new(controller: Arc<FleetController>, interval: Duration, seed: u64) -> Self {
        Self {
            controller,
            interval,
            seed,
        }
    }

    pub fn from_config(controller: Arc<FleetController>, config: &SimulationConfig) -> Self {
        Self::new(controller, config.tick_interval, config.random_seed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking on the current tokio runtime.
    pub fn spawn(self) -> DriverHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        let task = tokio::spawn(self.run(shutdown_rx));
        DriverHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, mut shutdown: broadcast::Receiver<()>) -> DriverOutcome {
        let mut limiter = RateLimiter::new(self.interval);
        let reporter = LoopTimingReporter::new(self.interval);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut ticks: u64 = 0;
        let mut failure = None;
        info!(
            interval_ms = self.interval.as_millis() as u64,
            seed = self.seed,
            "simulation driver started"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("simulation driver shutdown signal received");
                    break;
                }
                instant = limiter.tick() => {
                    let scheduled_at = instant.into_std();
                    let now = Instant::now();
                    reporter.record_tick_at(now);
                    match self.controller.tick(&mut rng) {
                        Ok(report) => {
                            ticks += 1;
                            debug!(
                                tick = report.tick,
                                changed = report.changed.len(),
                                escalated = report.escalated.len(),
                                lateness_us = jitter_us(now.duration_since(scheduled_at), Duration::ZERO),
                                "driver tick complete"
                            );
                        }
                        Err(err) => {
                            error!(error = %err, ticks, "simulation tick failed; stopping driver");
                            failure = Some(err);
                            break;
                        }
                    }
                }
            }
        }

        let jitter = reporter.histogram().summary();
        if let Some(summary) = &jitter {
            info!(
                ticks,
                mean_jitter_ns = summary.mean_ns,
                max_jitter_ns = summary.max_ns,
                "simulation driver stopped"
            );
        } else {
            info!(ticks, "simulation driver stopped");
        }
        DriverOutcome {
            ticks,
            jitter,
            failure,
        }
    }
}

/// What a driver did before it stopped.
#[derive(Debug, Clone)]
pub struct DriverOutcome {
    pub ticks: u64,
    pub jitter: Option<JitterSummary>,
    /// Set when the driver stopped because a tick failed.
    pub failure: Option<FleetError>,
}

#[derive(Debug)]
pub struct DriverHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<DriverOutcome>,
}

impl DriverHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop scheduling further ticks and wait for the loop to exit. A tick that
    /// is already running completes first.
    pub async fn shutdown(self) -> Result<DriverOutcome> {
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|err| anyhow!("simulation driver join failure: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Category, Coordinates, ProvisioningRecord};
    use crate::fleet::FleetOptions;
    use crate::registry::ContainerRegistry;
    use crate::simulator::TelemetrySimulator;
    use crate::threshold::Thresholds;

    fn controller() -> Arc<FleetController> {
        let records = (0..3).map(|i| ProvisioningRecord {
            id: format!("BIN-{:03}", i + 1),
            location: format!("Block {i}"),
            category: Category::Recycling,
            coordinates: Coordinates::new(40.7, -74.0),
        });
        let mut rng = StdRng::seed_from_u64(1);
        let registry = ContainerRegistry::initialize(records, Thresholds::default(), &mut rng).unwrap();
        Arc::new(FleetController::new(
            registry,
            TelemetrySimulator::default(),
            FleetOptions::default(),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn driver_ticks_until_shutdown() {
        let fleet = controller();
        let handle = SimulationDriver::new(fleet.clone(), Duration::from_millis(5), 7).spawn();
        let deadline = Instant::now() + Duration::from_secs(5);
        while fleet.snapshot().ticks() < 3 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let outcome = handle.shutdown().await.unwrap();
        assert!(outcome.ticks >= 3);
        assert!(outcome.failure.is_none());
        assert_eq!(fleet.snapshot().ticks(), outcome.ticks);
    }

    #[tokio::test]
    async fn first_tick_waits_one_period() {
        let fleet = controller();
        let handle = SimulationDriver::new(fleet.clone(), Duration::from_secs(60), 7).spawn();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let outcome = handle.shutdown().await.unwrap();
        assert_eq!(outcome.ticks, 0);
        assert_eq!(fleet.snapshot().version(), 0);
    }
}
