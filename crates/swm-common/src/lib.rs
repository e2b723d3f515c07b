//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Shared primitives and utilities for the fleet runtime."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
//! Shared primitives for the SmartWaste workspace: configuration loading,
//! tracing bootstrap, and the metrics exporter.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod time;

pub use config::{
    AppConfig, FleetConfig, LoggingConfig, MetricsConfig, RouteConfig, SimulationConfig,
    ThresholdConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{
    new_registry, spawn_http_server, JitterHistogram, LoopTimingReporter, MetricsServer,
    SharedRegistry,
};
