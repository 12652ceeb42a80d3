//! Report generation: JSON and Markdown license reports
//!
//! Every license shown in a report comes from
//! [`final_license`](crate::license::final_license); renderers only format.

pub mod json;
pub mod markdown;

use crate::artifact::{Artifact, FLAG_IGNORE_FOR_DOWNLOAD, FLAG_MODIFIED_BY_CONFIGURATION};
use crate::license::{final_license, spdx};
use crate::policy::PolicyEngine;
use crate::ClearanceResult;
use serde::Serialize;
use std::path::Path;

/// Output format for the license report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Structured JSON (machine-readable)
    Json,
    /// Human-readable Markdown table
    Markdown,
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Main coordinate as package URL, or the artifact's pretty print
    pub artifact: String,
    pub analysis_source: String,
    /// Final license as SPDX expression; empty when nothing is known
    pub license: String,
    pub license_ids: Vec<String>,
    pub forbidden: Vec<String>,
    pub proprietary: bool,
    pub modified_by_configuration: bool,
    pub ignore_for_download: bool,
}

/// The whole report, in artifact order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseReport {
    pub tool_version: String,
    pub total_artifacts: usize,
    pub unknown_licenses: usize,
    pub forbidden_hits: usize,
    pub entries: Vec<ReportEntry>,
}

impl LicenseReport {
    pub fn build(artifacts: &[Artifact], policy: &PolicyEngine) -> Self {
        let entries: Vec<ReportEntry> = artifacts.iter().map(|a| entry(a, policy)).collect();
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            total_artifacts: entries.len(),
            unknown_licenses: entries.iter().filter(|e| e.license.is_empty()).count(),
            forbidden_hits: entries.iter().filter(|e| !e.forbidden.is_empty()).count(),
            entries,
        }
    }
}

fn entry(artifact: &Artifact, policy: &PolicyEngine) -> ReportEntry {
    let license = final_license(artifact);
    ReportEntry {
        artifact: artifact.artifact_as_coordinate(),
        analysis_source: artifact.analysis_source().to_string(),
        license: spdx::serialize(&license),
        license_ids: license.licenses().into_iter().map(|l| l.id).collect(),
        forbidden: policy
            .forbidden_hits(artifact)
            .into_iter()
            .map(|f| f.id.clone())
            .collect(),
        proprietary: artifact.is_proprietary(),
        modified_by_configuration: artifact.get_flag(FLAG_MODIFIED_BY_CONFIGURATION),
        ignore_for_download: artifact.get_flag(FLAG_IGNORE_FOR_DOWNLOAD),
    }
}

/// Write a report in the specified format
pub fn write_report(
    artifacts: &[Artifact],
    policy: &PolicyEngine,
    format: ReportFormat,
    output: &Path,
) -> ClearanceResult<()> {
    let content = render_report(artifacts, policy, format)?;
    std::fs::write(output, content)?;
    Ok(())
}

/// Render a report to a string
pub fn render_report(
    artifacts: &[Artifact],
    policy: &PolicyEngine,
    format: ReportFormat,
) -> ClearanceResult<String> {
    let report = LicenseReport::build(artifacts, policy);
    match format {
        ReportFormat::Json => json::render(&report),
        ReportFormat::Markdown => markdown::render(&report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactCoordinates, DeclaredLicenseInformation, ObservedLicenseInformation};
    use crate::coordinate::Coordinate;

    fn artifacts() -> Vec<Artifact> {
        let mut a = Artifact::with_source("npm");
        a.add_fact(ArtifactCoordinates::from(Coordinate::npm("left-pad", "1.3.0")))
            .add_fact(DeclaredLicenseInformation(spdx::parse_lenient("MIT")))
            .add_fact(ObservedLicenseInformation(spdx::parse_lenient("AGPL-3.0-only")));
        let mut b = Artifact::with_source("npm");
        b.add_fact(ArtifactCoordinates::from(Coordinate::npm("mystery", "0.1.0")));
        vec![a, b]
    }

    #[test]
    fn test_build_report() {
        let policy: PolicyEngine = "[[forbidden]]\nid = \"AGPL-3.0-only\"\n".parse().unwrap();
        let report = LicenseReport::build(&artifacts(), &policy);
        assert_eq!(report.total_artifacts, 2);
        assert_eq!(report.unknown_licenses, 1);
        assert_eq!(report.forbidden_hits, 1);
        assert_eq!(report.entries[0].license, "( MIT AND AGPL-3.0-only )");
        assert_eq!(report.entries[0].license_ids, vec!["MIT", "AGPL-3.0-only"]);
        assert_eq!(report.entries[1].artifact, "pkg:npm/mystery@0.1.0");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("licenses.json");
        write_report(&artifacts(), &PolicyEngine::default(), ReportFormat::Json, &out).unwrap();
        let written = std::fs::read_to_string(out).unwrap();
        assert!(written.contains("pkg:npm/left-pad@1.3.0"));
    }
}
