//! Workbook export — a directory of named CSV sheets.
//!
//! Each sheet is one aggregated table written with its index as the
//! leftmost labeled column. A `manifest.json` records the content
//! fingerprint per sheet so re-exports of identical data are detectable.
//! Failures here are reported with the attempted path; export problems
//! never reach back into the pipeline.

use anyhow::{Context, Result};
use spotdisc_core::Table;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sheet names keep workbook compatibility: path separators and control
/// characters are replaced, and the name is capped at 31 characters.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '[' | ']') {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned.chars().take(31).collect()
}

fn write_sheet(path: &Path, table: &Table) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("create sheet file {}", path.display()))?;

    let mut header = Vec::with_capacity(1 + table.columns().len());
    header.push(table.index_name().to_string());
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header)?;

    for (i, label) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(label.clone());
        record.extend(table.row(i).iter().map(|c| c.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()
        .with_context(|| format!("flush sheet file {}", path.display()))?;
    Ok(())
}

/// Write every sheet into `dir` (created if missing) plus a manifest of
/// per-sheet content fingerprints. Returns the written sheet paths.
pub fn export_workbook(dir: &Path, sheets: &[(&str, &Table)]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create workbook directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(sheets.len());
    let mut manifest = BTreeMap::new();

    for (name, table) in sheets {
        let file_name = format!("{}.csv", sanitize_sheet_name(name));
        let path = dir.join(&file_name);
        write_sheet(&path, table)
            .with_context(|| format!("write sheet '{name}' to {}", path.display()))?;
        manifest.insert(file_name, table.fingerprint());
        written.push(path);
    }

    let manifest_path = dir.join("manifest.json");
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&manifest_path, json)
        .with_context(|| format!("write manifest {}", manifest_path.display()))?;

    Ok(written)
}
