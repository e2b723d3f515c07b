//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Fleet engine: containers, telemetry simulation, aggregation, and routes."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
//! Core fleet engine for SmartWaste container monitoring.

pub mod aggregator;
pub mod container;
pub mod driver;
pub mod error;
pub mod fleet;
pub mod metrics;
pub mod registry;
pub mod route;
pub mod simulator;
pub mod threshold;

pub use aggregator::{
    category_breakdown, containers_with_status, critical_alerts, summarize, CategoryBreakdown,
    CategoryStats, FleetSummary,
};
pub use container::{Category, Container, Coordinates, ProvisioningRecord};
pub use driver::{DriverHandle, DriverOutcome, RateLimiter, SimulationDriver};
pub use error::{EntityKind, FleetError, Result};
pub use fleet::{FleetController, FleetOptions, FleetReport, FleetSnapshot};
pub use metrics::FleetMetrics;
pub use registry::{clamp_fill_level, ContainerRegistry};
pub use route::{Route, RouteBook, RouteCommand, RouteSpec, RouteStats, RouteStatus};
pub use simulator::{DriftModel, TelemetrySimulator, TickReport};
pub use threshold::{classify, FillStatus, Thresholds};
