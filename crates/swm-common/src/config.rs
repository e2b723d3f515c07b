//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Shared primitives and utilities for the fleet runtime."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_warning_threshold() -> u8 {
    70
}

fn default_critical_threshold() -> u8 {
    85
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(5000)
}

fn default_drift_magnitude() -> f64 {
    5.0
}

fn default_drift_bias() -> f64 {
    0.7
}

fn default_random_seed() -> u64 {
    0x5EED_B1u64
}

fn default_demo_container_count() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9898))
}

/// Primary configuration object for the fleet daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "SWM_CONFIG";

    /// Load configuration from disk, respecting the `SWM_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Unlike a production deployment the fleet engine is usable without any
    /// file at all, so an empty search falls back to the built-in defaults.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found; using defaults"
        );
        let config = AppConfig::default();
        config.validate()?;
        Ok(LoadedAppConfig {
            config,
            source: None,
        })
    }

    /// Load a path the operator named explicitly. Unlike the candidate search
    /// a missing or unreadable file is an error, never a fallback to defaults.
    pub fn load_required(path: &Path) -> Result<LoadedAppConfig> {
        let config = Self::from_path(path)?;
        Ok(LoadedAppConfig {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.fleet.thresholds.validate()?;
        self.fleet.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub routes: RouteConfig,
}

/// Fill-level percentages at which containers escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_warning_threshold")]
    pub warning: u8,
    #[serde(default = "default_critical_threshold")]
    pub critical: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning: default_warning_threshold(),
            critical: default_critical_threshold(),
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        if self.critical > 100 {
            return Err(anyhow!(
                "critical threshold {} exceeds 100 percent",
                self.critical
            ));
        }
        if self.warning >= self.critical {
            return Err(anyhow!(
                "warning threshold {} must be below critical threshold {}",
                self.warning,
                self.critical
            ));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval", rename = "tick_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    #[serde(default = "default_drift_magnitude")]
    pub drift_magnitude: f64,
    #[serde(default = "default_drift_bias")]
    pub drift_bias: f64,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    /// JSON or CSV provisioning list; the demo fleet is generated when unset.
    #[serde(default)]
    pub provisioning_file: Option<PathBuf>,
    #[serde(default = "default_demo_container_count")]
    pub demo_container_count: usize,
    #[serde(default = "default_true")]
    pub seed_demo_routes: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            drift_magnitude: default_drift_magnitude(),
            drift_bias: default_drift_bias(),
            random_seed: default_random_seed(),
            provisioning_file: None,
            demo_container_count: default_demo_container_count(),
            seed_demo_routes: true,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(anyhow!("simulation tick_interval_ms must be greater than zero"));
        }
        if !self.drift_magnitude.is_finite() || self.drift_magnitude < 0.0 {
            return Err(anyhow!(
                "drift_magnitude must be a finite, non-negative number (got {})",
                self.drift_magnitude
            ));
        }
        if !(0.0..=1.0).contains(&self.drift_bias) {
            return Err(anyhow!(
                "drift_bias must lie within [0, 1] (got {})",
                self.drift_bias
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Reset the fill level of a route's containers once the route completes.
    #[serde(default = "default_true")]
    pub empty_on_route_completion: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            empty_on_route_completion: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_mirror_settings_panel() {
        let config = AppConfig::default();
        assert_eq!(config.fleet.thresholds.warning, 70);
        assert_eq!(config.fleet.thresholds.critical, 85);
        assert_eq!(config.fleet.simulation.tick_interval, Duration::from_secs(5));
        assert_eq!(config.fleet.simulation.drift_magnitude, 5.0);
        assert!(config.fleet.routes.empty_on_route_completion);
        config.validate().unwrap();
    }

    #[test]
    fn parses_partial_toml() {
        let config: AppConfig = r#"
            [fleet.thresholds]
            warning = 60
            critical = 90

            [fleet.simulation]
            tick_interval_ms = 250
            drift_magnitude = 2.5
        "#
        .parse()
        .unwrap();
        assert_eq!(config.fleet.thresholds.warning, 60);
        assert_eq!(config.fleet.thresholds.critical, 90);
        assert_eq!(config.fleet.simulation.tick_interval, Duration::from_millis(250));
        assert_eq!(config.fleet.simulation.drift_magnitude, 2.5);
        assert_eq!(config.fleet.simulation.drift_bias, 0.7);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = r#"
            [fleet.thresholds]
            warning = 90
            critical = 80
        "#
        .parse::<AppConfig>()
        .unwrap_err();
        assert!(err.to_string().contains("must be below"));
    }

    #[test]
    fn rejects_out_of_range_bias() {
        let err = r#"
            [fleet.simulation]
            drift_bias = 1.5
        "#
        .parse::<AppConfig>()
        .unwrap_err();
        assert!(err.to_string().contains("drift_bias"));
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let config = AppConfig {
            fleet: FleetConfig {
                simulation: SimulationConfig {
                    tick_interval: Duration::ZERO,
                    ..SimulationConfig::default()
                },
                ..FleetConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_first_existing_candidate() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[fleet.thresholds]\nwarning = 50\ncritical = 75")?;
        file.flush()?;
        let missing = PathBuf::from("does/not/exist.toml");
        let loaded = AppConfig::load_with_source(&[missing, file.path().to_path_buf()])?;
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.fleet.thresholds.warning, 50);
        Ok(())
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = AppConfig::load_required(Path::new("typo/swmd.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("typo/swmd.toml"));
    }

    #[test]
    fn explicit_path_loads_with_source() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[fleet.thresholds]\nwarning = 40\ncritical = 60")?;
        file.flush()?;
        let loaded = AppConfig::load_required(file.path())?;
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.fleet.thresholds.critical, 60);
        Ok(())
    }

    #[test]
    fn missing_candidates_fall_back_to_defaults() -> Result<()> {
        let loaded = AppConfig::load_with_source(&[PathBuf::from("nowhere/fleet.toml")])?;
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.fleet.thresholds.critical, 85);
        Ok(())
    }
}
