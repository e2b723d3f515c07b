//! ---
//! swm_section: "11-simulation"
//! swm_subsection: "01-bootstrap"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Fleet bootstrap from configuration."
//! swm_version: "v0.1.0"
//! swm_owner: "tbd"
//! ---
use std::io::Write;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use swm_common::config::FleetConfig;
use swm_core::RouteStatus;
use swm_sim::bootstrap_fleet;
use tempfile::Builder;

#[test]
fn default_config_builds_demo_fleet() -> Result<()> {
    let config = FleetConfig::default();
    let fleet = bootstrap_fleet(&config, &mut StdRng::seed_from_u64(config.simulation.random_seed))?;
    let snapshot = fleet.snapshot();
    assert_eq!(snapshot.summary().total, 10);
    assert_eq!(snapshot.route_stats().total, 4);
    assert_eq!(snapshot.routes_with_status(RouteStatus::Delayed).len(), 1);
    Ok(())
}

#[test]
fn provisioning_file_overrides_demo_fleet() -> Result<()> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    writeln!(file, "id,location,category,latitude,longitude")?;
    writeln!(file, "NORTH-1,Harbour Gate,general,51.5,-0.1")?;
    writeln!(file, "NORTH-2,Harbour Gate,organic,51.5,-0.1")?;
    file.flush()?;

    let mut config = FleetConfig::default();
    config.simulation.provisioning_file = Some(file.path().to_path_buf());
    config.simulation.seed_demo_routes = false;
    let fleet = bootstrap_fleet(&config, &mut StdRng::seed_from_u64(1))?;
    let snapshot = fleet.snapshot();
    let ids: Vec<_> = snapshot.containers().map(|c| c.id().to_owned()).collect();
    assert_eq!(ids, vec!["NORTH-1", "NORTH-2"]);
    assert_eq!(snapshot.route_stats().total, 0);
    Ok(())
}

#[test]
fn duplicate_ids_in_file_fail_bootstrap() -> Result<()> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    writeln!(file, "id,location,category,latitude,longitude")?;
    writeln!(file, "A,One,general,1.0,1.0")?;
    writeln!(file, "A,Two,general,1.0,1.0")?;
    file.flush()?;

    let mut config = FleetConfig::default();
    config.simulation.provisioning_file = Some(file.path().to_path_buf());
    let err = match bootstrap_fleet(&config, &mut StdRng::seed_from_u64(1)) {
        Ok(_) => panic!("duplicate ids must not provision"),
        Err(err) => err,
    };
    assert!(format!("{err:#}").contains("duplicate container id 'A'"));
    Ok(())
}

#[test]
fn same_seed_same_fleet() -> Result<()> {
    let config = FleetConfig::default();
    let a = bootstrap_fleet(&config, &mut StdRng::seed_from_u64(9))?;
    let b = bootstrap_fleet(&config, &mut StdRng::seed_from_u64(9))?;
    let levels = |fleet: &swm_core::FleetController| -> Vec<(String, u8)> {
        fleet
            .snapshot()
            .containers()
            .map(|c| (c.location().to_owned(), c.fill_level()))
            .collect()
    };
    assert_eq!(levels(&a), levels(&b));
    Ok(())
}
