use crate::analyze::ComplianceReport;
use crate::model::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Writes `value` as indented JSON, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Reads a previously written `compliance.json`.
pub fn read_compliance(path: &Path) -> Result<ComplianceReport> {
    let json_str = fs::read_to_string(path)?;
    let mut report: ComplianceReport = serde_json::from_str(&json_str)?;
    for (team_id, record) in report.iter_mut() {
        record.team_id = team_id.clone();
    }
    Ok(report)
}
