//! Configuration-driven corrections, end to end
//!
//! Loads a policy file from disk, applies it to analyzer output, and checks
//! that reports show the corrected final licenses.

use clearance::artifact::{
    ArtifactCoordinates, ArtifactFilename, DeclaredLicenseInformation, ObservedLicenseInformation,
    FLAG_IGNORE_FOR_DOWNLOAD, FLAG_MODIFIED_BY_CONFIGURATION,
};
use clearance::coordinate::{Coordinate, CoordinateType};
use clearance::license::{final_license, spdx};
use clearance::report::{render_report, write_report, ReportFormat};
use clearance::{Artifact, ClearanceError, PolicyEngine};
use std::path::Path;

const POLICY: &str = r#"
[[overrides]]
selector = { filename = "jsr305-*.jar" }
configured_license = "BSD-3-Clause"
reason = "Sources are BSD despite the POM"

[[overrides]]
overridden_license = "EPL-2.0 OR GPL-2.0-only WITH Classpath-exception-2.0"
coordinates = ["pkg:p2/org.eclipse.jetty.util@9.4.31"]
[overrides.selector.coordinates.maven]
namespace = "org.eclipse.jetty"
name = "jetty-*"

[[overrides]]
selector = { filename = "acme-*.jar" }
proprietary = true

[[ignore_for_download]]
filename = "acme-*.jar"

[[forbidden]]
id = "GPL-3.0-only"
reason = "Distributed in closed firmware"
"#;

// ─── Helper ─────────────────────────────────────────────────────────

fn analyzed() -> Vec<Artifact> {
    let mut jsr = Artifact::with_source("maven");
    jsr.add_fact(ArtifactFilename::new("jsr305-3.0.2.jar"))
        .add_fact(DeclaredLicenseInformation(spdx::parse_lenient("LGPL-2.1-only")));

    let mut jetty = Artifact::with_source("maven");
    jetty
        .add_fact(ArtifactCoordinates::from(Coordinate::maven("org.eclipse.jetty", "jetty-util", "9.4.31")))
        .add_fact(DeclaredLicenseInformation(spdx::parse_lenient("Apache-2.0")));

    let mut acme = Artifact::with_source("maven");
    acme.add_fact(ArtifactFilename::new("acme-core-2.0.jar"));

    let mut readline = Artifact::with_source("maven");
    readline
        .add_fact(ArtifactFilename::new("readline-8.1.jar"))
        .add_fact(DeclaredLicenseInformation(spdx::parse_lenient("GPL-3.0-only")))
        .add_fact(ObservedLicenseInformation(spdx::parse_lenient("GPL-3.0-or-later")));

    vec![jsr, jetty, acme, readline]
}

fn load(dir: &Path) -> PolicyEngine {
    let path = dir.join(".clearance.toml");
    std::fs::write(&path, POLICY).unwrap();
    PolicyEngine::from_file(&path).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn policy_file_corrects_analyzer_results() {
    let dir = tempfile::tempdir().unwrap();
    let engine = load(dir.path());
    let mut artifacts = analyzed();

    assert_eq!(engine.apply(&mut artifacts), 3);

    let [jsr, jetty, acme, readline] = &artifacts[..] else {
        panic!("expected four artifacts");
    };

    assert_eq!(final_license(jsr).evaluate(), "BSD-3-Clause");
    assert!(jsr.get_flag(FLAG_MODIFIED_BY_CONFIGURATION));

    assert_eq!(
        spdx::serialize(&final_license(jetty)),
        "( EPL-2.0 OR GPL-2.0-only WITH Classpath-exception-2.0 )"
    );
    assert_eq!(
        jetty.coordinate_for(CoordinateType::P2).map(Coordinate::canonicalize),
        Some("pkg:p2/org.eclipse.jetty.util@9.4.31".to_string())
    );
    assert_eq!(jetty.main_coordinate().map(|c| c.coordinate_type), Some(CoordinateType::Maven));

    assert!(acme.is_proprietary());
    assert!(acme.get_flag(FLAG_IGNORE_FOR_DOWNLOAD));
    assert!(final_license(acme).is_empty());

    assert!(!readline.get_flag(FLAG_MODIFIED_BY_CONFIGURATION));
    assert_eq!(engine.forbidden_hits(readline).len(), 1);
}

#[test]
fn reports_show_final_licenses() {
    let dir = tempfile::tempdir().unwrap();
    let engine = load(dir.path());
    let mut artifacts = analyzed();
    engine.apply(&mut artifacts);

    let json = render_report(&artifacts, &engine, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_artifacts"], 4);
    assert_eq!(value["forbidden_hits"], 1);
    assert_eq!(value["unknown_licenses"], 1);
    assert_eq!(value["entries"][0]["license"], "BSD-3-Clause");
    assert_eq!(value["entries"][3]["license"], "( GPL-3.0-only AND GPL-3.0-or-later )");
    assert_eq!(value["entries"][3]["forbidden"][0], "GPL-3.0-only");

    let out = dir.path().join("report.md");
    write_report(&artifacts, &engine, ReportFormat::Markdown, &out).unwrap();
    let md = std::fs::read_to_string(out).unwrap();
    assert!(md.contains("# License Clearance Report"));
    assert!(md.contains("`pkg:maven/org.eclipse.jetty/jetty-util@9.4.31`"));
    assert!(md.contains("❌ forbidden: GPL-3.0-only"));
}

#[test]
fn project_root_lookup() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PolicyEngine::from_project_root(dir.path()).config().overrides.is_empty());

    std::fs::write(dir.path().join("clearance.toml"), POLICY).unwrap();
    let engine = PolicyEngine::from_project_root(dir.path());
    assert_eq!(engine.config().overrides.len(), 3);
}

#[test]
fn missing_policy_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PolicyEngine::from_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ClearanceError::Io(_)));
}

#[test]
fn malformed_policy_is_toml_error() {
    let err = "[[overrides]\nselector = 1".parse::<PolicyEngine>().unwrap_err();
    assert!(matches!(err, ClearanceError::Toml(_)));
}
