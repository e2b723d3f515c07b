//! ---
//! swm_section: "05-fleet-aggregation"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Read-only projections over the container registry."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use serde::Serialize;

use crate::container::{Category, Container};
use crate::registry::ContainerRegistry;
use crate::threshold::FillStatus;

/// Fleet-wide counts and mean fill level at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
    pub average_fill_level: u8,
}

impl FleetSummary {
    pub fn count(&self, status: FillStatus) -> usize {
        match status {
            FillStatus::Normal => self.normal,
            FillStatus::Warning => self.warning,
            FillStatus::Critical => self.critical,
        }
    }
}

/// Per-category count and mean fill level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub count: usize,
    pub average_fill_level: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub general: CategoryStats,
    pub recycling: CategoryStats,
    pub organic: CategoryStats,
}

impl CategoryBreakdown {
    pub fn get(&self, category: Category) -> CategoryStats {
        match category {
            Category::General => self.general,
            Category::Recycling => self.recycling,
            Category::Organic => self.organic,
        }
    }
}

/// Mean of `sum / count` rounded half-up; zero when there is nothing to average.
fn rounded_mean(sum: u64, count: usize) -> u8 {
    if count == 0 {
        return 0;
    }
    let count = count as u64;
    ((sum * 2 + count) / (count * 2)) as u8
}

pub fn summarize(registry: &ContainerRegistry) -> FleetSummary {
    summarize_containers(registry.iter())
}

/// Single pass over any container sequence.
pub fn summarize_containers<'a, I>(containers: I) -> FleetSummary
where
    I: IntoIterator<Item = &'a Container>,
{
    let mut summary = FleetSummary::default();
    let mut fill_sum = 0u64;
    for container in containers {
        summary.total += 1;
        fill_sum += u64::from(container.fill_level());
        match container.status() {
            FillStatus::Normal => summary.normal += 1,
            FillStatus::Warning => summary.warning += 1,
            FillStatus::Critical => summary.critical += 1,
        }
    }
    summary.average_fill_level = rounded_mean(fill_sum, summary.total);
    summary
}

/// Containers needing urgent collection, in registry order.
pub fn critical_alerts(registry: &ContainerRegistry) -> Vec<Container> {
    containers_with_status(registry, FillStatus::Critical)
}

pub fn containers_with_status(registry: &ContainerRegistry, status: FillStatus) -> Vec<Container> {
    registry
        .iter()
        .filter(|container| container.status() == status)
        .cloned()
        .collect()
}

pub fn category_breakdown(registry: &ContainerRegistry) -> CategoryBreakdown {
    let mut sums = [0u64; 3];
    let mut counts = [0usize; 3];
    for container in registry.iter() {
        let slot = match container.category() {
            Category::General => 0,
            Category::Recycling => 1,
            Category::Organic => 2,
        };
        sums[slot] += u64::from(container.fill_level());
        counts[slot] += 1;
    }
    let stats = |slot: usize| CategoryStats {
        count: counts[slot],
        average_fill_level: rounded_mean(sums[slot], counts[slot]),
    };
    CategoryBreakdown {
        general: stats(0),
        recycling: stats(1),
        organic: stats(2),
    }
}
