//! ---
//! swm_section: "02-classification"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Monitored container model and provisioning records."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::threshold::{FillStatus, Thresholds};

/// Waste stream collected by a container.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    General,
    Recycling,
    Organic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Static identity of a container as handed to the registry at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningRecord {
    pub id: String,
    pub location: String,
    pub category: Category,
    pub coordinates: Coordinates,
}

/// Latest known state of a monitored container.
///
/// Fields are read-only outside the crate: the status can only change together
/// with the fill level, through the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    id: String,
    location: String,
    fill_level: u8,
    status: FillStatus,
    category: Category,
    coordinates: Coordinates,
    last_update: DateTime<Utc>,
}

impl Container {
    pub(crate) fn provision(
        record: ProvisioningRecord,
        fill_level: u8,
        thresholds: &Thresholds,
        now: DateTime<Utc>,
    ) -> Self {
        let fill_level = fill_level.min(100);
        Self {
            id: record.id,
            location: record.location,
            fill_level,
            status: thresholds.classify(fill_level),
            category: record.category,
            coordinates: record.coordinates,
            last_update: now,
        }
    }

    /// Store a reading that has already been clamped to `0..=100`.
    pub(crate) fn record(&mut self, fill_level: u8, thresholds: &Thresholds, now: DateTime<Utc>) {
        self.fill_level = fill_level;
        self.status = thresholds.classify(fill_level);
        self.last_update = now;
    }

    /// Re-derive the status only; the reading and its timestamp stay as they are.
    pub(crate) fn reclassify(&mut self, thresholds: &Thresholds) -> bool {
        let status = thresholds.classify(self.fill_level);
        let changed = status != self.status;
        self.status = status;
        changed
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn fill_level(&self) -> u8 {
        self.fill_level
    }

    pub fn status(&self) -> FillStatus {
        self.status
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }
}
