//! ---
//! swm_section: "04-telemetry-simulation"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Biased random-walk generator for container fill levels."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use rand::Rng;
use serde::Serialize;
use swm_common::config::SimulationConfig;
use tracing::{debug, warn};

use crate::error::{FleetError, Result};
use crate::registry::ContainerRegistry;
use crate::threshold::FillStatus;

pub const DEFAULT_DRIFT_BIAS: f64 = 0.7;
pub const DEFAULT_DRIFT_MAGNITUDE: f64 = 5.0;

/// Parameters of the random walk: each tick moves a reading by
/// `(uniform(0, 1) - bias) * magnitude` percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftModel {
    bias: f64,
    magnitude: f64,
}

impl DriftModel {
    pub fn new(bias: f64, magnitude: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&bias) {
            return Err(FleetError::validation(format!(
                "drift bias {bias} must lie within [0, 1]"
            )));
        }
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(FleetError::validation(format!(
                "drift magnitude {magnitude} must be finite and non-negative"
            )));
        }
        Ok(Self { bias, magnitude })
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        Self::new(config.drift_bias, config.drift_magnitude)
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Draw the next perturbation from `rng`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        (rng.gen::<f64>() - self.bias) * self.magnitude
    }
}

impl Default for DriftModel {
    fn default() -> Self {
        Self {
            bias: DEFAULT_DRIFT_BIAS,
            magnitude: DEFAULT_DRIFT_MAGNITUDE,
        }
    }
}

/// Outcome of one simulation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// Containers whose fill level or status moved, in registry order.
    pub changed: Vec<String>,
    /// Containers that crossed into `critical` during this tick.
    pub escalated: Vec<String>,
}

/// Advances every container reading by one drift step. Holds no entropy of its
/// own; the random source is always supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySimulator {
    drift: DriftModel,
    ticks: u64,
}

impl TelemetrySimulator {
    pub fn new(drift: DriftModel) -> Self {
        Self { drift, ticks: 0 }
    }

    pub fn drift(&self) -> DriftModel {
        self.drift
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Perturb every reading once. The whole batch is staged first and applied
    /// through [`ContainerRegistry::apply_readings`], so a failure leaves every
    /// container as it was and is returned to the caller.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        registry: &mut ContainerRegistry,
        rng: &mut R,
    ) -> Result<TickReport> {
        let before: Vec<(String, u8, FillStatus)> = registry
            .iter()
            .map(|c| (c.id().to_owned(), c.fill_level(), c.status()))
            .collect();

        let readings: Vec<(String, i32)> = before
            .iter()
            .map(|(id, level, _)| {
                let candidate = f64::from(*level) + self.drift.sample(rng);
                (id.clone(), candidate.round() as i32)
            })
            .collect();

        if let Err(err) = registry.apply_readings(&readings) {
            warn!(tick = self.ticks + 1, error = %err, "tick aborted; registry left unchanged");
            return Err(err);
        }
        self.ticks += 1;

        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };
        for (id, level, status) in before {
            let container = registry.get(&id)?;
            if container.fill_level() != level || container.status() != status {
                report.changed.push(id.clone());
            }
            if container.status() == FillStatus::Critical && status != FillStatus::Critical {
                report.escalated.push(id);
            }
        }
        debug!(
            tick = report.tick,
            changed = report.changed.len(),
            escalated = report.escalated.len(),
            "simulation tick applied"
        );
        Ok(report)
    }
}

/// Single tick with explicit drift parameters.
pub fn tick<R: Rng + ?Sized>(
    registry: &mut ContainerRegistry,
    rng: &mut R,
    drift_bias_toward_full: f64,
    drift_magnitude: f64,
) -> Result<Vec<String>> {
    let drift = DriftModel::new(drift_bias_toward_full, drift_magnitude)?;
    Ok(TelemetrySimulator::new(drift).tick(registry, rng)?.changed)
}
