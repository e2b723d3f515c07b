//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Single-writer fleet controller and published read snapshots."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
//! The controller serialises every mutation (ticks, readings, threshold
//! changes, route commands) behind one mutex. After each successful mutation
//! it publishes an immutable [`FleetSnapshot`]; readers only clone the
//! snapshot pointer and never wait for a tick to finish.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::Serialize;
use swm_common::config::FleetConfig;
use tracing::{debug, info, warn};

use crate::aggregator::{self, CategoryBreakdown, FleetSummary};
use crate::container::{Container, ProvisioningRecord};
use crate::error::Result;
use crate::metrics::FleetMetrics;
use crate::registry::ContainerRegistry;
use crate::route::{Route, RouteBook, RouteCommand, RouteSpec, RouteStats, RouteStatus};
use crate::simulator::{DriftModel, TelemetrySimulator, TickReport};
use crate::threshold::{FillStatus, Thresholds};

/// Immutable view of the fleet at one published version.
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    version: u64,
    taken_at: DateTime<Utc>,
    ticks: u64,
    registry: ContainerRegistry,
    routes: RouteBook,
}

impl FleetSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Simulation ticks applied before this snapshot was published.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn thresholds(&self) -> Thresholds {
        self.registry.thresholds()
    }

    pub fn summary(&self) -> FleetSummary {
        aggregator::summarize(&self.registry)
    }

    pub fn critical_alerts(&self) -> Vec<Container> {
        aggregator::critical_alerts(&self.registry)
    }

    pub fn containers_with_status(&self, status: FillStatus) -> Vec<Container> {
        aggregator::containers_with_status(&self.registry, status)
    }

    pub fn category_breakdown(&self) -> CategoryBreakdown {
        aggregator::category_breakdown(&self.registry)
    }

    pub fn container(&self, id: &str) -> Result<&Container> {
        self.registry.get(id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.registry.iter()
    }

    pub fn route(&self, id: &str) -> Result<&Route> {
        self.routes.get(id)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn routes_with_status(&self, status: RouteStatus) -> Vec<Route> {
        self.routes.with_status(status)
    }

    pub fn route_stats(&self) -> RouteStats {
        self.routes.stats()
    }

    /// Owned, serialisable rendition for presentation layers.
    pub fn report(&self) -> FleetReport {
        FleetReport {
            version: self.version,
            taken_at: self.taken_at,
            ticks: self.ticks,
            warning_threshold: self.registry.thresholds().warning(),
            critical_threshold: self.registry.thresholds().critical(),
            summary: self.summary(),
            categories: self.category_breakdown(),
            route_stats: self.route_stats(),
            critical_alerts: self.critical_alerts(),
            containers: self.registry.list_all(),
            routes: self.routes.list_all(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    pub version: u64,
    pub taken_at: DateTime<Utc>,
    pub ticks: u64,
    pub warning_threshold: u8,
    pub critical_threshold: u8,
    pub summary: FleetSummary,
    pub categories: CategoryBreakdown,
    pub route_stats: RouteStats,
    pub critical_alerts: Vec<Container>,
    pub containers: Vec<Container>,
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetOptions {
    /// Record a reading of 0 for every container of a route when it completes.
    pub empty_on_route_completion: bool,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            empty_on_route_completion: true,
        }
    }
}

#[derive(Debug)]
struct FleetState {
    registry: ContainerRegistry,
    routes: RouteBook,
    simulator: TelemetrySimulator,
    version: u64,
}

/// Owner of the registry and route book.
#[derive(Debug)]
pub struct FleetController {
    options: FleetOptions,
    state: Mutex<FleetState>,
    published: RwLock<Arc<FleetSnapshot>>,
    metrics: Option<FleetMetrics>,
}

impl FleetController {
    pub fn new(
        registry: ContainerRegistry,
        simulator: TelemetrySimulator,
        options: FleetOptions,
    ) -> Self {
        let state = FleetState {
            registry,
            routes: RouteBook::new(),
            simulator,
            version: 0,
        };
        let snapshot = Arc::new(snapshot_of(&state));
        Self {
            options,
            state: Mutex::new(state),
            published: RwLock::new(snapshot),
            metrics: None,
        }
    }

    /// Validate the fleet configuration and provision the registry from `records`.
    pub fn from_config<I, R>(config: &FleetConfig, records: I, rng: &mut R) -> Result<Self>
    where
        I: IntoIterator<Item = ProvisioningRecord>,
        R: Rng + ?Sized,
    {
        let thresholds = Thresholds::from_config(&config.thresholds)?;
        let drift = DriftModel::from_config(&config.simulation)?;
        let registry = ContainerRegistry::initialize(records, thresholds, rng)?;
        info!(
            containers = registry.len(),
            warning = thresholds.warning(),
            critical = thresholds.critical(),
            drift_bias = drift.bias(),
            drift_magnitude = drift.magnitude(),
            "fleet controller provisioned"
        );
        Ok(Self::new(
            registry,
            TelemetrySimulator::new(drift),
            FleetOptions {
                empty_on_route_completion: config.routes.empty_on_route_completion,
            },
        ))
    }

    /// Attach gauges; they are refreshed on every publish.
    pub fn with_metrics(mut self, metrics: FleetMetrics) -> Self {
        metrics.observe(&self.published.read());
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> FleetOptions {
        self.options
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.published.read().clone()
    }

    /// Advance the simulation by one step.
    pub fn tick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TickReport> {
        let mut state = self.state.lock();
        let FleetState {
            registry,
            simulator,
            ..
        } = &mut *state;
        let report = simulator.tick(registry, rng)?;
        for id in &report.escalated {
            if let Ok(container) = registry.get(id) {
                warn!(
                    container = %id,
                    location = container.location(),
                    fill_level = container.fill_level(),
                    "container reached critical fill level"
                );
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_tick();
        }
        self.publish(&mut state);
        Ok(report)
    }

    pub fn apply_reading(&self, id: &str, fill_level: i32) -> Result<Container> {
        let mut state = self.state.lock();
        let container = state.registry.apply_reading(id, fill_level)?.clone();
        self.publish(&mut state);
        Ok(container)
    }

    pub fn apply_readings(&self, readings: &[(String, i32)]) -> Result<()> {
        let mut state = self.state.lock();
        state.registry.apply_readings(readings)?;
        self.publish(&mut state);
        Ok(())
    }

    /// Replace the threshold pair and reclassify the fleet. Returns the ids
    /// whose status changed.
    pub fn update_thresholds(&self, warning: u8, critical: u8) -> Result<Vec<String>> {
        let thresholds = Thresholds::new(warning, critical)?;
        let mut state = self.state.lock();
        let changed = state.registry.update_thresholds(thresholds);
        info!(
            warning,
            critical,
            reclassified = changed.len(),
            "fill thresholds updated"
        );
        self.publish(&mut state);
        Ok(changed)
    }

    /// Schedule a route. Every assigned container must be in the registry.
    pub fn schedule_route(&self, spec: RouteSpec) -> Result<Route> {
        let mut state = self.state.lock();
        state
            .registry
            .ensure_known(spec.container_ids.iter().map(String::as_str))?;
        let route = state.routes.schedule(spec)?;
        self.publish(&mut state);
        Ok(route)
    }

    pub fn start_route(&self, id: &str) -> Result<Route> {
        let mut state = self.state.lock();
        let route = state.routes.start(id)?;
        self.publish(&mut state);
        Ok(route)
    }

    pub fn advance_route(&self, id: &str, percent: i32) -> Result<Route> {
        let mut state = self.state.lock();
        self.prepare_completion(&state, id, RouteCommand::AdvanceProgress)?;
        let route = state.routes.advance_progress(id, percent)?;
        self.finish_if_completed(&mut state, &route)?;
        self.publish(&mut state);
        Ok(route)
    }

    pub fn mark_route_delayed(&self, id: &str) -> Result<Route> {
        let mut state = self.state.lock();
        let route = state.routes.mark_delayed(id)?;
        warn!(route = %route.id(), progress = route.progress(), "route delayed");
        self.publish(&mut state);
        Ok(route)
    }

    pub fn resume_route(&self, id: &str) -> Result<Route> {
        let mut state = self.state.lock();
        let route = state.routes.resume(id)?;
        self.publish(&mut state);
        Ok(route)
    }

    pub fn complete_route(&self, id: &str) -> Result<Route> {
        let mut state = self.state.lock();
        self.prepare_completion(&state, id, RouteCommand::Complete)?;
        let route = state.routes.complete(id)?;
        self.finish_if_completed(&mut state, &route)?;
        self.publish(&mut state);
        Ok(route)
    }

    /// Reject a completing command up front when emptying would fail, so the
    /// route and the registry change together or not at all.
    fn prepare_completion(&self, state: &FleetState, id: &str, command: RouteCommand) -> Result<()> {
        let route = state.routes.check(id, command)?;
        if self.options.empty_on_route_completion {
            state
                .registry
                .ensure_known(route.container_ids().iter().map(String::as_str))?;
        }
        Ok(())
    }

    fn finish_if_completed(&self, state: &mut FleetState, route: &Route) -> Result<()> {
        if route.status() != RouteStatus::Completed {
            return Ok(());
        }
        info!(route = %route.id(), name = route.name(), "route completed");
        if !self.options.empty_on_route_completion || route.container_ids().is_empty() {
            return Ok(());
        }
        let readings: Vec<(String, i32)> = route
            .container_ids()
            .iter()
            .map(|id| (id.clone(), 0))
            .collect();
        state.registry.apply_readings(&readings)?;
        debug!(route = %route.id(), emptied = readings.len(), "route containers emptied");
        Ok(())
    }

    /// Called with the state lock held, so versions are published in order.
    fn publish(&self, state: &mut FleetState) {
        state.version += 1;
        let snapshot = Arc::new(snapshot_of(state));
        if let Some(metrics) = &self.metrics {
            metrics.observe(&snapshot);
        }
        *self.published.write() = snapshot;
    }
}

fn snapshot_of(state: &FleetState) -> FleetSnapshot {
    FleetSnapshot {
        version: state.version,
        taken_at: Utc::now(),
        ticks: state.simulator.ticks(),
        registry: state.registry.clone(),
        routes: state.routes.clone(),
    }
}
