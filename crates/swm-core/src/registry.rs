//! ---
//! swm_section: "02-classification"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Owned set of monitored containers and their latest readings."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use chrono::Utc;
use indexmap::IndexMap;
use rand::Rng;
use tracing::debug;

use crate::container::{Container, ProvisioningRecord};
use crate::error::{FleetError, Result};
use crate::threshold::Thresholds;

/// Clamp an arbitrary reading into the valid percentage range.
pub fn clamp_fill_level(reading: i32) -> u8 {
    reading.clamp(0, 100) as u8
}

/// Monitored containers in provisioning order.
#[derive(Debug, Clone)]
pub struct ContainerRegistry {
    containers: IndexMap<String, Container>,
    thresholds: Thresholds,
}

impl ContainerRegistry {
    /// Build the registry from a provisioning list. Initial fill levels are drawn
    /// uniformly from `0..100` using the caller's random source.
    pub fn initialize<I, R>(records: I, thresholds: Thresholds, rng: &mut R) -> Result<Self>
    where
        I: IntoIterator<Item = ProvisioningRecord>,
        R: Rng + ?Sized,
    {
        let now = Utc::now();
        let mut containers = IndexMap::new();
        for record in records {
            if containers.contains_key(&record.id) {
                return Err(FleetError::DuplicateId(record.id));
            }
            let fill_level: u8 = rng.gen_range(0..100);
            let id = record.id.clone();
            containers.insert(id, Container::provision(record, fill_level, &thresholds, now));
        }
        debug!(
            containers = containers.len(),
            warning = thresholds.warning(),
            critical = thresholds.critical(),
            "container registry initialised"
        );
        Ok(Self {
            containers,
            thresholds,
        })
    }

    pub fn get(&self, id: &str) -> Result<&Container> {
        self.containers
            .get(id)
            .ok_or_else(|| FleetError::container_not_found(id))
    }

    /// Record a new reading, clamped to `0..=100`, and re-derive the status.
    pub fn apply_reading(&mut self, id: &str, fill_level: i32) -> Result<&Container> {
        let thresholds = self.thresholds;
        let container = self
            .containers
            .get_mut(id)
            .ok_or_else(|| FleetError::container_not_found(id))?;
        container.record(clamp_fill_level(fill_level), &thresholds, Utc::now());
        Ok(container)
    }

    /// Apply several readings as one unit: unknown ids are rejected before any
    /// container is touched. All readings share one timestamp.
    pub fn apply_readings(&mut self, readings: &[(String, i32)]) -> Result<()> {
        self.ensure_known(readings.iter().map(|(id, _)| id.as_str()))?;
        let now = Utc::now();
        let thresholds = self.thresholds;
        for (id, fill_level) in readings {
            if let Some(container) = self.containers.get_mut(id) {
                container.record(clamp_fill_level(*fill_level), &thresholds, now);
            }
        }
        Ok(())
    }

    /// Fail with `NotFound` on the first id the registry does not hold.
    pub fn ensure_known<'a, I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in ids {
            if !self.containers.contains_key(id) {
                return Err(FleetError::container_not_found(id));
            }
        }
        Ok(())
    }

    /// Swap the threshold pair and reclassify every container. Returns the ids
    /// whose status changed.
    pub fn update_thresholds(&mut self, thresholds: Thresholds) -> Vec<String> {
        self.thresholds = thresholds;
        self.containers
            .values_mut()
            .filter_map(|container| {
                container
                    .reclassify(&thresholds)
                    .then(|| container.id().to_owned())
            })
            .collect()
    }

    /// Containers in provisioning order.
    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Owned copy of every container in provisioning order.
    pub fn list_all(&self) -> Vec<Container> {
        self.containers.values().cloned().collect()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn contains(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
