//! ---
//! swm_section: "11-simulation"
//! swm_subsection: "01-bootstrap"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Demo container fleet and sample collection routes."
//! swm_version: "v0.1.0"
//! swm_owner: "tbd"
//! ---
use rand::Rng;
use swm_core::{Category, Coordinates, FleetController, ProvisioningRecord, Route, RouteSpec};
use tracing::info;

/// Street locations used for generated demo containers.
pub const DEMO_LOCATIONS: [&str; 10] = [
    "Main Street & 1st Ave",
    "Central Park East",
    "Shopping Mall North",
    "University Campus",
    "Residential Area A",
    "Industrial Zone",
    "Bus Station",
    "City Center",
    "Market Square",
    "Sports Complex",
];

/// Centre of the demo service area (lower Manhattan).
pub const CITY_CENTER: (f64, f64) = (40.7128, -74.0060);

/// Width of the square around [`CITY_CENTER`] containers are scattered over, in degrees.
pub const COORDINATE_SPREAD: f64 = 0.1;

const CATEGORIES: [Category; 3] = [Category::General, Category::Recycling, Category::Organic];

/// Generate `count` containers with ids `BIN-001`, `BIN-002`, ... Locations
/// cycle through [`DEMO_LOCATIONS`]; category and position come from `rng`.
pub fn demo_provisioning<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ProvisioningRecord> {
    (0..count)
        .map(|index| {
            let name = DEMO_LOCATIONS[index % DEMO_LOCATIONS.len()];
            let lap = index / DEMO_LOCATIONS.len();
            let location = if lap == 0 {
                name.to_owned()
            } else {
                format!("{name} #{}", lap + 1)
            };
            let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
            let latitude = CITY_CENTER.0 + (rng.gen::<f64>() - 0.5) * COORDINATE_SPREAD;
            let longitude = CITY_CENTER.1 + (rng.gen::<f64>() - 0.5) * COORDINATE_SPREAD;
            ProvisioningRecord {
                id: format!("BIN-{:03}", index + 1),
                location,
                category,
                coordinates: Coordinates::new(latitude, longitude),
            }
        })
        .collect()
}

/// Where a sample route is left after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleProgress {
    Scheduled,
    InProgress(i32),
    Delayed(i32),
    Completed,
}

fn sample(
    id: &str,
    name: &str,
    start_time: &str,
    hours: f64,
    containers: u32,
    driver: &str,
    vehicle: &str,
) -> RouteSpec {
    RouteSpec {
        id: Some(id.to_owned()),
        name: name.to_owned(),
        container_count: containers,
        container_ids: Vec::new(),
        driver: driver.to_owned(),
        vehicle: vehicle.to_owned(),
        start_time: start_time.to_owned(),
        estimated_duration_hours: hours,
    }
}

/// The four demo routes and the state each one is driven into.
pub fn sample_routes() -> Vec<(RouteSpec, SampleProgress)> {
    vec![
        (
            sample("RT-001", "Downtown Circuit", "08:00", 3.5, 24, "John Smith", "WM-101"),
            SampleProgress::InProgress(65),
        ),
        (
            sample("RT-002", "Residential Area A", "10:30", 2.8, 18, "Mike Johnson", "WM-102"),
            SampleProgress::Scheduled,
        ),
        (
            sample("RT-003", "Industrial Zone", "06:00", 4.2, 32, "Sarah Davis", "WM-103"),
            SampleProgress::Completed,
        ),
        (
            sample("RT-004", "University Campus", "14:00", 1.5, 12, "Tom Wilson", "WM-104"),
            SampleProgress::Delayed(25),
        ),
    ]
}

/// Schedule the sample routes on `fleet` and drive each one through legal
/// lifecycle commands until it reaches its sample state.
pub fn seed_demo_routes(fleet: &FleetController) -> swm_core::Result<Vec<Route>> {
    let mut seeded = Vec::new();
    for (spec, progress) in sample_routes() {
        let route = fleet.schedule_route(spec)?;
        let id = route.id().to_owned();
        let route = match progress {
            SampleProgress::Scheduled => route,
            SampleProgress::InProgress(percent) => {
                fleet.start_route(&id)?;
                fleet.advance_route(&id, percent)?
            }
            SampleProgress::Delayed(percent) => {
                fleet.start_route(&id)?;
                fleet.advance_route(&id, percent)?;
                fleet.mark_route_delayed(&id)?
            }
            SampleProgress::Completed => {
                fleet.start_route(&id)?;
                fleet.complete_route(&id)?
            }
        };
        seeded.push(route);
    }
    info!(routes = seeded.len(), "demo routes seeded");
    Ok(seeded)
}
