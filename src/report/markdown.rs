//! Markdown report renderer
//!
//! Produces a review-ready document: summary table, then one row per artifact
//! with its final license and any forbidden-license hits.

use super::{LicenseReport, ReportEntry};
use crate::ClearanceResult;

/// Render a license report as Markdown
pub fn render(report: &LicenseReport) -> ClearanceResult<String> {
    let mut md = String::with_capacity(4096);

    md.push_str("# License Clearance Report\n\n");

    md.push_str("| Field | Value |\n|---|---|\n");
    md.push_str(&format!("| **Artifacts** | {} |\n", report.total_artifacts));
    md.push_str(&format!(
        "| **Unknown Licenses** | {} |\n",
        report.unknown_licenses
    ));
    md.push_str(&format!(
        "| **Forbidden License Hits** | {} |\n",
        report.forbidden_hits
    ));
    md.push_str(&format!("| **Tool Version** | {} |\n", report.tool_version));
    md.push('\n');

    if report.forbidden_hits == 0 {
        md.push_str("✅ **No forbidden licenses found.**\n\n");
    } else {
        md.push_str(&format!(
            "❌ **{} artifact(s) carry a forbidden license.**\n\n",
            report.forbidden_hits
        ));
    }

    if report.entries.is_empty() {
        return Ok(md);
    }

    md.push_str("## Artifacts\n\n");
    md.push_str("| Artifact | License | Source | Notes |\n|---|---|---|---|\n");
    for entry in &report.entries {
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            truncate(&entry.artifact, 80),
            license_cell(entry),
            entry.analysis_source,
            notes(entry)
        ));
    }
    md.push('\n');

    Ok(md)
}

fn license_cell(entry: &ReportEntry) -> String {
    if entry.license.is_empty() {
        "⚠️ unknown".to_string()
    } else {
        format!("`{}`", entry.license)
    }
}

fn notes(entry: &ReportEntry) -> String {
    let mut notes = Vec::new();
    if !entry.forbidden.is_empty() {
        notes.push(format!("❌ forbidden: {}", entry.forbidden.join(", ")));
    }
    if entry.proprietary {
        notes.push("proprietary".to_string());
    }
    if entry.modified_by_configuration {
        notes.push("configured".to_string());
    }
    if entry.ignore_for_download {
        notes.push("no source download".to_string());
    }
    notes.join("; ")
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}
