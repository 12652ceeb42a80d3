//! Policy engine: `.clearance.toml` corrections to analyzer results
//!
//! Projects use the policy file to pin the license of artifacts the analyzers
//! get wrong, to fix coordinates, to mark their own code as proprietary, to
//! exclude artifacts from source downloads, and to list licenses that must
//! not ship.
//!
//! ```toml
//! [[overrides]]
//! selector = { filename = "jsr305-*.jar" }
//! configured_license = "BSD-3-Clause"
//! reason = "Manifest claims LGPL, sources are BSD"
//!
//! [[ignore_for_download]]
//! coordinates.maven = { namespace = "com.example.*" }
//!
//! [[forbidden]]
//! id = "AGPL-3.0-only"
//! ```

use crate::artifact::{
    Artifact, ArtifactCoordinates, ConfiguredLicenseInformation, OverriddenLicenseInformation,
    FLAG_IGNORE_FOR_DOWNLOAD, FLAG_MODIFIED_BY_CONFIGURATION, FLAG_PROPRIETARY,
};
use crate::coordinate::Coordinate;
use crate::license::{final_license, spdx, License, LicenseInformation};
use crate::selector::ArtifactSelector;
use crate::{ClearanceError, ClearanceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Analysis source of the overlays built from configuration
pub const CONFIGURATION_SOURCE: &str = "configuration";

/// Project-level policy configuration (loaded from `.clearance.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Corrections applied to every artifact the selector matches
    #[serde(default)]
    pub overrides: Vec<ArtifactOverride>,

    /// Artifacts whose sources must not be downloaded
    #[serde(default)]
    pub ignore_for_download: Vec<ArtifactSelector>,

    /// Licenses that must not appear in any final license
    #[serde(default)]
    pub forbidden: Vec<ForbiddenLicense>,
}

/// Per-artifact correction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactOverride {
    pub selector: ArtifactSelector,

    /// SPDX expression that wins over everything analyzers found
    #[serde(default, with = "spdx::as_spdx", skip_serializing_if = "LicenseInformation::is_empty")]
    pub configured_license: LicenseInformation,

    /// SPDX expression replacing declared and observed licenses
    #[serde(default, with = "spdx::as_spdx", skip_serializing_if = "LicenseInformation::is_empty")]
    pub overridden_license: LicenseInformation,

    /// Coordinate corrections as package URLs
    #[serde(default, with = "purl_list", skip_serializing_if = "Vec::is_empty")]
    pub coordinates: Vec<Coordinate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proprietary: Option<bool>,

    /// Reason for the override (for audit trail)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ArtifactOverride {
    /// The artifact laid over every match
    pub fn overlay(&self) -> Artifact {
        let mut overlay = Artifact::with_source(CONFIGURATION_SOURCE);
        overlay
            .add_fact(ConfiguredLicenseInformation(self.configured_license.clone()))
            .add_fact(OverriddenLicenseInformation(self.overridden_license.clone()))
            .set_flag(FLAG_MODIFIED_BY_CONFIGURATION, true);
        if !self.coordinates.is_empty() {
            overlay.add_fact(ArtifactCoordinates::new(self.coordinates.iter().cloned()));
        }
        if let Some(proprietary) = self.proprietary {
            overlay.set_flag(FLAG_PROPRIETARY, proprietary);
        }
        overlay
    }
}

/// A license that fails the policy wherever it shows up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenLicense {
    /// SPDX id, compared case-insensitively
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ForbiddenLicense {
    pub fn matches(&self, license: &License) -> bool {
        license.id.trim().eq_ignore_ascii_case(self.id.trim())
    }
}

impl PolicyConfig {
    /// Reject selectors that could never match and blank forbidden ids
    pub fn validate(&self) -> ClearanceResult<()> {
        for (i, ovr) in self.overrides.iter().enumerate() {
            if ovr.selector.is_empty() {
                return Err(ClearanceError::Selector(format!(
                    "override #{} has a selector without any pattern",
                    i + 1
                )));
            }
        }
        if let Some(i) = self.ignore_for_download.iter().position(ArtifactSelector::is_empty) {
            return Err(ClearanceError::Selector(format!(
                "ignore_for_download #{} has a selector without any pattern",
                i + 1
            )));
        }
        if self.forbidden.iter().any(|f| f.id.trim().is_empty()) {
            return Err(ClearanceError::Policy("forbidden license with blank id".into()));
        }
        Ok(())
    }
}

/// Applies a [`PolicyConfig`] to analyzed artifacts
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Load policy from a TOML file
    pub fn from_file(path: &Path) -> ClearanceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Try `.clearance.toml`, then `clearance.toml`, fall back to default
    pub fn from_project_root(root: &Path) -> Self {
        for name in [".clearance.toml", "clearance.toml"] {
            let policy_path = root.join(name);
            if !policy_path.exists() {
                continue;
            }
            match Self::from_file(&policy_path) {
                Ok(engine) => {
                    tracing::info!("Loaded policy from {}", policy_path.display());
                    return engine;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", policy_path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Apply overrides and download exclusions in place; returns how many
    /// artifacts an override touched
    pub fn apply(&self, artifacts: &mut [Artifact]) -> usize {
        let mut modified = 0;
        for artifact in artifacts.iter_mut() {
            let mut touched = false;
            for ovr in &self.config.overrides {
                if ovr.selector.matches(artifact) {
                    tracing::debug!(
                        "Override applies to {}{}",
                        artifact,
                        ovr.reason.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default()
                    );
                    artifact.override_with(&ovr.overlay());
                    touched = true;
                }
            }
            if self.config.ignore_for_download.iter().any(|s| s.matches(artifact)) {
                artifact.set_flag(FLAG_IGNORE_FOR_DOWNLOAD, true);
            }
            if touched {
                modified += 1;
            }
        }
        modified
    }

    /// Forbidden entries hit by the artifact's final license
    pub fn forbidden_hits(&self, artifact: &Artifact) -> Vec<&ForbiddenLicense> {
        let licenses = final_license(artifact).licenses();
        self.config
            .forbidden
            .iter()
            .filter(|f| licenses.iter().any(|l| f.matches(l)))
            .collect()
    }

    pub fn is_forbidden(&self, license: &License) -> bool {
        self.config.forbidden.iter().any(|f| f.matches(license))
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl FromStr for PolicyEngine {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: PolicyConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(Self::new(config))
    }
}

/// Serde adapter for lists of package URLs
mod purl_list {
    use crate::coordinate::Coordinate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(coordinates: &[Coordinate], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(coordinates.iter().map(Coordinate::canonicalize))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Coordinate>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|purl| purl.parse().map_err(D::Error::custom))
            .collect()
    }
}
