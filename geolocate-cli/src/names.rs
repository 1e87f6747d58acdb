use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read the names to resolve from a CSV column or a plain-text list
///
/// Names are returned exactly as written (they double as cache keys);
/// empty cells and blank lines are skipped.
pub fn read_names(path: &Path, column: &str) -> Result<Vec<String>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let names = if is_csv {
        read_csv_column(path, column)?
    } else {
        read_lines(path)?
    };

    log::info!("Read {} names from {}", names.len(), path.display());
    Ok(names)
}

fn read_csv_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Column {:?} not found in {} (available: {})",
                column,
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;

    let mut names = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Invalid CSV row {}", row + 2))?;
        match record.get(index) {
            Some(name) if !name.trim().is_empty() => names.push(name.to_string()),
            _ => log::debug!("Skipping row {} without a name", row + 2),
        }
    }
    Ok(names)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(data
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}
