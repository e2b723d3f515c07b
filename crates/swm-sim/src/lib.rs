//! ---
//! swm_section: "11-simulation"
//! swm_subsection: "01-bootstrap"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Fleet bootstrap: provisioning sources and demo seeding."
//! swm_version: "v0.1.0"
//! swm_owner: "tbd"
//! ---
//! Builds a ready-to-run fleet from configuration, either from a provisioning
//! file or from the generated demo fleet.

pub mod loader;
pub mod provisioning;

use anyhow::{Context, Result};
use rand::Rng;
use swm_common::config::{FleetConfig, SimulationConfig};
use swm_core::{FleetController, ProvisioningRecord};
use tracing::info;

pub use loader::{load_provisioning, ProvisioningRow};
pub use provisioning::{
    demo_provisioning, sample_routes, seed_demo_routes, SampleProgress, CITY_CENTER,
    DEMO_LOCATIONS,
};

/// Provisioning list named by the configuration, or a generated demo fleet.
pub fn provisioning_records<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<Vec<ProvisioningRecord>> {
    match &config.provisioning_file {
        Some(path) => load_provisioning(path)
            .with_context(|| format!("failed to provision fleet from {}", path.display())),
        None => {
            info!(containers = config.demo_container_count, "generating demo fleet");
            Ok(demo_provisioning(rng, config.demo_container_count))
        }
    }
}

/// Provision the registry and, when configured, seed the sample routes.
pub fn bootstrap_fleet<R: Rng + ?Sized>(config: &FleetConfig, rng: &mut R) -> Result<FleetController> {
    let records = provisioning_records(&config.simulation, rng)?;
    let fleet = FleetController::from_config(config, records, rng)
        .context("failed to initialise fleet controller")?;
    if config.simulation.seed_demo_routes {
        seed_demo_routes(&fleet).context("failed to seed demo routes")?;
    }
    Ok(fleet)
}
