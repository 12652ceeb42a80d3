//! JSON report renderer

use super::LicenseReport;
use crate::ClearanceResult;

/// Render a license report as pretty-printed JSON
pub fn render(report: &LicenseReport) -> ClearanceResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
