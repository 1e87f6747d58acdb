use anyhow::{Context, Result};
use geolocate_core::{BatchReport, Coordinate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CoordinateRow<'a> {
    name: &'a str,
    latitude: f64,
    longitude: f64,
}

/// Write resolved names as CSV; names without coordinates are left out
pub fn write_csv(report: &BatchReport, path: &Path) -> Result<usize> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut rows = 0;
    for (name, outcome) in report.iter() {
        if let Some(coordinate) = outcome.coordinate() {
            writer.serialize(CoordinateRow {
                name,
                latitude: coordinate.lat,
                longitude: coordinate.lng,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;

    log::info!("Wrote {} coordinates to {}", rows, path.display());
    Ok(rows)
}

/// Write the full mapping as JSON, `null` for unresolved names
pub fn write_json(report: &BatchReport, path: &Path) -> Result<()> {
    create_parent(path)?;
    let mapping: BTreeMap<String, Option<Coordinate>> = report.coordinates().into_iter().collect();
    let data = serde_json::to_string_pretty(&mapping)?;
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Wrote mapping for {} names to {}", mapping.len(), path.display());
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}
