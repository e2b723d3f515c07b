//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Controller, snapshot, and driver behaviour under concurrency."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use swm_common::config::FleetConfig;
use swm_core::{
    Category, Coordinates, FleetController, FleetError, FleetMetrics, FillStatus,
    ProvisioningRecord, RouteSpec, RouteStatus, SimulationDriver,
};

fn records(count: usize) -> Vec<ProvisioningRecord> {
    (0..count)
        .map(|i| ProvisioningRecord {
            id: format!("BIN-{:03}", i + 1),
            location: format!("Avenue {i}"),
            category: match i % 3 {
                0 => Category::General,
                1 => Category::Recycling,
                _ => Category::Organic,
            },
            coordinates: Coordinates::new(40.7128, -74.0060),
        })
        .collect()
}

fn controller(count: usize) -> Arc<FleetController> {
    let mut rng = StdRng::seed_from_u64(2024);
    Arc::new(FleetController::from_config(&FleetConfig::default(), records(count), &mut rng).unwrap())
}

#[test]
fn identically_seeded_controllers_agree() {
    let a = controller(10);
    let b = controller(10);
    let mut rng_a = StdRng::seed_from_u64(77);
    let mut rng_b = StdRng::seed_from_u64(77);
    for _ in 0..50 {
        a.tick(&mut rng_a).unwrap();
        b.tick(&mut rng_b).unwrap();
    }
    let levels = |fleet: &FleetController| -> Vec<u8> {
        fleet.snapshot().containers().map(|c| c.fill_level()).collect()
    };
    assert_eq!(levels(&a), levels(&b));
}

#[test]
fn invalid_fleet_config_is_rejected() {
    let mut config = FleetConfig::default();
    config.thresholds.warning = 90;
    config.thresholds.critical = 80;
    let mut rng = StdRng::seed_from_u64(1);
    let err = FleetController::from_config(&config, records(2), &mut rng).unwrap_err();
    assert!(matches!(err, FleetError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_partial_ticks() {
    let fleet = controller(50);
    let driver = SimulationDriver::new(fleet.clone(), Duration::from_millis(1), 5).spawn();

    let mut readers = Vec::new();
    for _ in 0..3 {
        let fleet = fleet.clone();
        readers.push(tokio::spawn(async move {
            let deadline = Instant::now() + Duration::from_millis(200);
            let mut last_version = 0;
            while Instant::now() < deadline {
                let snapshot = fleet.snapshot();
                assert!(snapshot.version() >= last_version);
                last_version = snapshot.version();

                let summary = snapshot.summary();
                assert_eq!(summary.total, 50);
                assert_eq!(summary.normal + summary.warning + summary.critical, 50);
                let thresholds = snapshot.thresholds();
                for container in snapshot.containers() {
                    assert!(container.fill_level() <= 100);
                    assert_eq!(container.status(), thresholds.classify(container.fill_level()));
                }
                assert_eq!(snapshot.critical_alerts().len(), summary.critical);
                tokio::task::yield_now().await;
            }
        }));
    }
    for reader in readers {
        reader.await.unwrap();
    }
    let outcome = driver.shutdown().await.unwrap();
    assert!(outcome.failure.is_none());
    assert_eq!(fleet.snapshot().ticks(), outcome.ticks);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commands_interleave_with_a_running_driver() {
    let fleet = controller(6);
    let driver = SimulationDriver::new(fleet.clone(), Duration::from_millis(2), 11).spawn();

    let route = fleet
        .schedule_route(RouteSpec {
            name: "Residential Area A".into(),
            container_ids: vec!["BIN-001".into(), "BIN-002".into()],
            driver: "Mike Johnson".into(),
            vehicle: "WM-102".into(),
            start_time: "10:30".into(),
            estimated_duration_hours: 2.8,
            ..RouteSpec::default()
        })
        .unwrap();
    fleet.start_route(route.id()).unwrap();
    fleet.mark_route_delayed(route.id()).unwrap();
    fleet.resume_route(route.id()).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    fleet.complete_route(route.id()).unwrap();
    let outcome = driver.shutdown().await.unwrap();
    assert!(outcome.failure.is_none());

    let snapshot = fleet.snapshot();
    assert_eq!(snapshot.route(route.id()).unwrap().status(), RouteStatus::Completed);
    assert_eq!(snapshot.route(route.id()).unwrap().progress(), 100);
    assert_eq!(snapshot.route_stats().completed, 1);
    assert_eq!(snapshot.ticks(), outcome.ticks);
}

#[test]
fn metrics_track_published_snapshots() {
    let registry = swm_common::metrics::new_registry();
    let metrics = FleetMetrics::new(registry.clone()).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let fleet = FleetController::from_config(&FleetConfig::default(), records(4), &mut rng)
        .unwrap()
        .with_metrics(metrics);
    fleet.apply_reading("BIN-001", 99).unwrap();
    fleet.apply_reading("BIN-002", 99).unwrap();
    fleet.apply_reading("BIN-003", 10).unwrap();
    fleet.apply_reading("BIN-004", 10).unwrap();
    fleet.tick(&mut StdRng::seed_from_u64(0)).unwrap();

    let snapshot = fleet.snapshot();
    let body = swm_common::metrics::encode_registry(&registry).unwrap();
    assert!(body.contains("swm_simulation_ticks_total 1"));
    let critical = snapshot.summary().count(FillStatus::Critical);
    assert!(body.contains(&format!("swm_containers{{status=\"critical\"}} {critical}")));
    assert!(body.contains(&format!("swm_snapshot_version {}", snapshot.version())));
}
