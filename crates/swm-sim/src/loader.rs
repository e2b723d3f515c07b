//! ---
//! swm_section: "11-simulation"
//! swm_subsection: "01-bootstrap"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Provisioning list loaders for JSON and CSV files."
//! swm_version: "v0.1.0"
//! swm_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use swm_core::{Category, Coordinates, ProvisioningRecord};
use tracing::debug;

/// One CSV row: `id,location,category,latitude,longitude`.
#[derive(Debug, Deserialize)]
pub struct ProvisioningRow {
    pub id: String,
    pub location: String,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<ProvisioningRow> for ProvisioningRecord {
    fn from(row: ProvisioningRow) -> Self {
        ProvisioningRecord {
            id: row.id,
            location: row.location,
            category: row.category,
            coordinates: Coordinates::new(row.latitude, row.longitude),
        }
    }
}

/// Load a provisioning list, choosing the format from the file extension.
pub fn load_provisioning(path: &Path) -> Result<Vec<ProvisioningRecord>> {
    let records = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => from_json(path)?,
        Some("csv") => from_csv(path)?,
        _ => bail!("unsupported provisioning format: {}", path.display()),
    };
    for (index, record) in records.iter().enumerate() {
        check_record(record)
            .with_context(|| format!("invalid provisioning entry {} in {}", index + 1, path.display()))?;
    }
    debug!(path = %path.display(), containers = records.len(), "provisioning list loaded");
    Ok(records)
}

fn from_json(path: &Path) -> Result<Vec<ProvisioningRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read provisioning file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid provisioning JSON {}", path.display()))
}

fn from_csv(path: &Path) -> Result<Vec<ProvisioningRecord>> {
    let file = fs::File::open(path)
        .with_context(|| format!("unable to open provisioning csv {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize::<ProvisioningRow>() {
        let row = row.with_context(|| format!("invalid provisioning row in {}", path.display()))?;
        records.push(row.into());
    }
    Ok(records)
}

fn check_record(record: &ProvisioningRecord) -> Result<()> {
    if record.id.trim().is_empty() {
        bail!("container id must not be empty");
    }
    let Coordinates {
        latitude,
        longitude,
    } = record.coordinates;
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        bail!("container '{}' has latitude {} outside [-90, 90]", record.id, latitude);
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        bail!(
            "container '{}' has longitude {} outside [-180, 180]",
            record.id,
            longitude
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_with(suffix: &str, contents: &str) -> Result<tempfile::NamedTempFile> {
        let mut file = Builder::new().suffix(suffix).tempfile()?;
        write!(file, "{contents}")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn loads_json_lists() -> Result<()> {
        let file = temp_with(
            ".json",
            r#"[{"id":"BIN-001","location":"Bus Station","category":"organic","coordinates":{"latitude":40.71,"longitude":-74.0}}]"#,
        )?;
        let records = load_provisioning(file.path())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, Category::Organic);
        assert_eq!(records[0].coordinates.latitude, 40.71);
        Ok(())
    }

    #[test]
    fn loads_csv_lists() -> Result<()> {
        let file = temp_with(
            ".csv",
            "id,location,category,latitude,longitude\n\
             BIN-001,City Center,recycling,40.70,-74.01\n\
             BIN-002, Market Square ,general,40.72,-73.99\n",
        )?;
        let records = load_provisioning(file.path())?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].location, "Market Square");
        assert_eq!(records[0].category, Category::Recycling);
        Ok(())
    }

    #[test]
    fn rejects_unknown_categories() -> Result<()> {
        let file = temp_with(
            ".csv",
            "id,location,category,latitude,longitude\nBIN-001,City Center,glass,40.7,-74.0\n",
        )?;
        assert!(load_provisioning(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn rejects_out_of_range_coordinates() -> Result<()> {
        let file = temp_with(
            ".csv",
            "id,location,category,latitude,longitude\nBIN-001,City Center,general,140.0,-74.0\n",
        )?;
        let err = load_provisioning(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("latitude"));
        Ok(())
    }

    #[test]
    fn rejects_unknown_extensions() -> Result<()> {
        let file = temp_with(".yaml", "[]")?;
        assert!(load_provisioning(file.path()).is_err());
        Ok(())
    }
}
