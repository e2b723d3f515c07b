//! ---
//! swm_section: "03-persistence-logging"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Prometheus gauges mirroring the published fleet snapshot."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use anyhow::Result;
use prometheus::{IntCounter, IntGauge, IntGaugeVec, Opts};
use strum::IntoEnumIterator;
use swm_common::metrics::SharedRegistry;

use crate::fleet::FleetSnapshot;
use crate::route::RouteStatus;
use crate::threshold::FillStatus;

#[derive(Clone, Debug)]
pub struct FleetMetrics {
    registry: SharedRegistry,
    containers: IntGaugeVec,
    average_fill: IntGauge,
    routes: IntGaugeVec,
    ticks: IntCounter,
    snapshot_version: IntGauge,
}

impl FleetMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let containers = IntGaugeVec::new(
            Opts::new(
                "swm_containers",
                "Number of monitored containers by fill status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(containers.clone()))?;

        let average_fill = IntGauge::with_opts(Opts::new(
            "swm_average_fill_level_percent",
            "Mean fill level across the fleet, rounded to whole percent",
        ))?;
        registry.register(Box::new(average_fill.clone()))?;

        let routes = IntGaugeVec::new(
            Opts::new("swm_routes", "Number of collection routes by lifecycle state"),
            &["status"],
        )?;
        registry.register(Box::new(routes.clone()))?;

        let ticks = IntCounter::with_opts(Opts::new(
            "swm_simulation_ticks_total",
            "Simulation ticks applied to the registry",
        ))?;
        registry.register(Box::new(ticks.clone()))?;

        let snapshot_version = IntGauge::with_opts(Opts::new(
            "swm_snapshot_version",
            "Version of the most recently published fleet snapshot",
        ))?;
        registry.register(Box::new(snapshot_version.clone()))?;

        Ok(Self {
            registry,
            containers,
            average_fill,
            routes,
            ticks,
            snapshot_version,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn record_tick(&self) {
        self.ticks.inc();
    }

    /// Overwrite every gauge from `snapshot`.
    pub fn observe(&self, snapshot: &FleetSnapshot) {
        let summary = snapshot.summary();
        for status in FillStatus::iter() {
            let label = status.to_string();
            self.containers
                .with_label_values(&[label.as_str()])
                .set(summary.count(status) as i64);
        }
        self.average_fill.set(i64::from(summary.average_fill_level));

        let stats = snapshot.route_stats();
        for status in RouteStatus::iter() {
            let count = match status {
                RouteStatus::Scheduled => stats.scheduled,
                RouteStatus::InProgress => stats.in_progress,
                RouteStatus::Completed => stats.completed,
                RouteStatus::Delayed => stats.delayed,
            };
            let label = status.to_string();
            self.routes
                .with_label_values(&[label.as_str()])
                .set(count as i64);
        }
        self.snapshot_version.set(snapshot.version() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swm_common::metrics::{encode_registry, new_registry};

    #[test]
    fn registers_fleet_families() -> Result<()> {
        let registry = new_registry();
        let metrics = FleetMetrics::new(registry.clone())?;
        metrics.record_tick();
        metrics.record_tick();
        let body = encode_registry(&registry)?;
        assert!(body.contains("swm_simulation_ticks_total 2"));
        Ok(())
    }

    #[test]
    fn double_registration_fails() {
        let registry = new_registry();
        assert!(FleetMetrics::new(registry.clone()).is_ok());
        assert!(FleetMetrics::new(registry).is_err());
    }
}
