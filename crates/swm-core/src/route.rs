//! ---
//! swm_section: "06-collection-routes"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Collection route lifecycle and progress tracking."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use chrono::NaiveTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info};

use crate::error::{FleetError, Result};
use crate::registry::clamp_fill_level;

const START_TIME_FORMAT: &str = "%H:%M";

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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RouteStatus {
    Scheduled,
    InProgress,
    Completed,
    Delayed,
}

/// Commands that move a route through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RouteCommand {
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "advance progress")]
    AdvanceProgress,
    #[strum(serialize = "mark delayed")]
    MarkDelayed,
    #[strum(serialize = "resume")]
    Resume,
    #[strum(serialize = "complete")]
    Complete,
}

impl RouteCommand {
    /// States from which the command is legal.
    fn allowed_from(self) -> &'static [RouteStatus] {
        match self {
            RouteCommand::Start => &[RouteStatus::Scheduled],
            RouteCommand::AdvanceProgress | RouteCommand::Complete => {
                &[RouteStatus::InProgress, RouteStatus::Delayed]
            }
            RouteCommand::MarkDelayed => &[RouteStatus::InProgress],
            RouteCommand::Resume => &[RouteStatus::Delayed],
        }
    }
}

/// Request to schedule a new route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Assigned sequentially (`RT-001`, ...) when omitted.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Derived from `container_ids` when left at zero.
    #[serde(default)]
    pub container_count: u32,
    #[serde(default)]
    pub container_ids: Vec<String>,
    pub driver: String,
    pub vehicle: String,
    /// Local start time, `HH:MM`.
    pub start_time: String,
    pub estimated_duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    id: String,
    name: String,
    status: RouteStatus,
    progress: u8,
    container_count: u32,
    container_ids: Vec<String>,
    driver: String,
    vehicle: String,
    start_time: NaiveTime,
    estimated_duration_hours: f64,
}

impl Route {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RouteStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn container_count(&self) -> u32 {
        self.container_count
    }

    /// Registry containers served by the route; may be empty.
    pub fn container_ids(&self) -> &[String] {
        &self.container_ids
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn vehicle(&self) -> &str {
        &self.vehicle
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn estimated_duration_hours(&self) -> f64 {
        self.estimated_duration_hours
    }
}

/// Route counts per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub total: usize,
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub delayed: usize,
}

/// Owned set of collection routes in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct RouteBook {
    routes: IndexMap<String, Route>,
    next_sequence: u32,
}

impl RouteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, spec: RouteSpec) -> Result<Route> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(FleetError::validation("route name must not be empty"));
        }
        let start_time = NaiveTime::parse_from_str(spec.start_time.trim(), START_TIME_FORMAT)
            .map_err(|err| {
                FleetError::validation(format!(
                    "start time '{}' is not HH:MM: {err}",
                    spec.start_time
                ))
            })?;
        if !spec.estimated_duration_hours.is_finite() || spec.estimated_duration_hours < 0.0 {
            return Err(FleetError::validation(format!(
                "estimated duration {} must be a finite, non-negative number of hours",
                spec.estimated_duration_hours
            )));
        }
        let assigned = spec.container_ids.len() as u32;
        let container_count = match (spec.container_count, assigned) {
            (0, n) => n,
            (count, 0) => count,
            (count, n) if count == n => count,
            (count, n) => {
                return Err(FleetError::validation(format!(
                    "container count {count} does not match {n} assigned container ids"
                )))
            }
        };

        let id = match spec.id {
            Some(id) if id.trim().is_empty() => {
                return Err(FleetError::validation("route id must not be blank"))
            }
            Some(id) => id,
            None => self.next_id(),
        };
        if self.routes.contains_key(&id) {
            return Err(FleetError::validation(format!(
                "route '{id}' is already scheduled"
            )));
        }

        let route = Route {
            id: id.clone(),
            name: name.to_owned(),
            status: RouteStatus::Scheduled,
            progress: 0,
            container_count,
            container_ids: spec.container_ids,
            driver: spec.driver,
            vehicle: spec.vehicle,
            start_time,
            estimated_duration_hours: spec.estimated_duration_hours,
        };
        self.routes.insert(id, route.clone());
        info!(route = %route.id, name = %route.name, start = %route.start_time, "route scheduled");
        Ok(route)
    }

    pub fn start(&mut self, id: &str) -> Result<Route> {
        self.transition(id, RouteCommand::Start, |route| {
            route.status = RouteStatus::InProgress;
        })
    }

    /// Set progress to `percent` (clamped to `0..=100`). Reaching 100 completes
    /// the route; a target below the current progress is rejected.
    pub fn advance_progress(&mut self, id: &str, percent: i32) -> Result<Route> {
        let target = clamp_fill_level(percent);
        let current = self.check(id, RouteCommand::AdvanceProgress)?.progress;
        if target < current {
            return Err(FleetError::validation(format!(
                "route '{id}' progress cannot move back from {current} to {target}"
            )));
        }
        self.transition(id, RouteCommand::AdvanceProgress, |route| {
            route.progress = target;
            if target == 100 {
                route.status = RouteStatus::Completed;
            }
        })
    }

    pub fn mark_delayed(&mut self, id: &str) -> Result<Route> {
        self.transition(id, RouteCommand::MarkDelayed, |route| {
            route.status = RouteStatus::Delayed;
        })
    }

    pub fn resume(&mut self, id: &str) -> Result<Route> {
        self.transition(id, RouteCommand::Resume, |route| {
            route.status = RouteStatus::InProgress;
        })
    }

    pub fn complete(&mut self, id: &str) -> Result<Route> {
        self.transition(id, RouteCommand::Complete, |route| {
            route.status = RouteStatus::Completed;
            route.progress = 100;
        })
    }

    /// Check that `command` is legal for route `id` without applying it.
    pub fn check(&self, id: &str, command: RouteCommand) -> Result<&Route> {
        let route = self.get(id)?;
        if !command.allowed_from().contains(&route.status) {
            return Err(FleetError::InvalidTransition {
                id: id.to_owned(),
                from: route.status,
                command,
            });
        }
        Ok(route)
    }

    fn transition<F>(&mut self, id: &str, command: RouteCommand, apply: F) -> Result<Route>
    where
        F: FnOnce(&mut Route),
    {
        let from = self.check(id, command)?.status;
        let route = self
            .routes
            .get_mut(id)
            .ok_or_else(|| FleetError::route_not_found(id))?;
        apply(route);
        debug!(
            route = %route.id,
            %command,
            %from,
            to = %route.status,
            progress = route.progress,
            "route transition"
        );
        Ok(route.clone())
    }

    fn next_id(&mut self) -> String {
        loop {
            self.next_sequence += 1;
            let candidate = format!("RT-{:03}", self.next_sequence);
            if !self.routes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<&Route> {
        self.routes
            .get(id)
            .ok_or_else(|| FleetError::route_not_found(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Owned copy of every route in scheduling order.
    pub fn list_all(&self) -> Vec<Route> {
        self.routes.values().cloned().collect()
    }

    pub fn with_status(&self, status: RouteStatus) -> Vec<Route> {
        self.routes
            .values()
            .filter(|route| route.status == status)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> RouteStats {
        let mut stats = RouteStats::default();
        for route in self.routes.values() {
            stats.total += 1;
            match route.status {
                RouteStatus::Scheduled => stats.scheduled += 1,
                RouteStatus::InProgress => stats.in_progress += 1,
                RouteStatus::Completed => stats.completed += 1,
                RouteStatus::Delayed => stats.delayed += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
