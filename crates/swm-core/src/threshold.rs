//! ---
//! swm_section: "02-classification"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Fill-level threshold policy."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use swm_common::config::ThresholdConfig;

use crate::error::{FleetError, Result};

pub const DEFAULT_WARNING_THRESHOLD: u8 = 70;
pub const DEFAULT_CRITICAL_THRESHOLD: u8 = 85;

/// Urgency tier of a container. Ordered by severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FillStatus {
    Normal,
    Warning,
    Critical,
}

/// Classify a reading. Both thresholds are exclusive: a level equal to the
/// critical threshold is still only a warning.
pub fn classify(fill_level: u8, warning_threshold: u8, critical_threshold: u8) -> FillStatus {
    if fill_level > critical_threshold {
        FillStatus::Critical
    } else if fill_level > warning_threshold {
        FillStatus::Warning
    } else {
        FillStatus::Normal
    }
}

/// Validated warning/critical pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    warning: u8,
    critical: u8,
}

impl Thresholds {
    pub fn new(warning: u8, critical: u8) -> Result<Self> {
        Self::from_config(&ThresholdConfig { warning, critical })
    }

    /// The ordering rule lives in [`ThresholdConfig::validate`].
    pub fn from_config(config: &ThresholdConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| FleetError::validation(err.to_string()))?;
        Ok(Self {
            warning: config.warning,
            critical: config.critical,
        })
    }

    pub fn warning(&self) -> u8 {
        self.warning
    }

    pub fn critical(&self) -> u8 {
        self.critical
    }

    pub fn classify(&self, fill_level: u8) -> FillStatus {
        classify(fill_level, self.warning, self.critical)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING_THRESHOLD,
            critical: DEFAULT_CRITICAL_THRESHOLD,
        }
    }
}
