use nav_returns_core::nav::RawNavEntry;
use serde::Deserialize;

use super::file::resolve_path;

/// One `date,nav` row. Both columns are kept as text so that the engine's
/// data-quality filter decides what to drop.
#[derive(Debug, Deserialize)]
struct CsvNavRow {
    #[serde(alias = "Date", alias = "DATE")]
    date: String,
    #[serde(alias = "NAV", alias = "Nav", alias = "net_asset_value")]
    nav: String,
}

/// Read NAV history from a headed CSV file with `date` and `nav` columns.
pub fn read_nav_csv(path: &str) -> Result<Vec<RawNavEntry>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let mut entries = Vec::new();
    for (line, row) in reader.deserialize::<CsvNavRow>().enumerate() {
        let row = row.map_err(|e| {
            format!("Malformed NAV row {} in '{}': {}", line + 2, canonical.display(), e)
        })?;
        entries.push(RawNavEntry::new(row.date, row.nav));
    }
    tracing::debug!(rows = entries.len(), path = %canonical.display(), "loaded NAV csv");
    Ok(entries)
}

/// Embedded history unless a CSV file overrides it.
pub fn nav_history(
    csv_path: Option<&str>,
    embedded: Vec<RawNavEntry>,
) -> Result<Vec<RawNavEntry>, Box<dyn std::error::Error>> {
    match csv_path {
        Some(path) => read_nav_csv(path),
        None => Ok(embedded),
    }
}
