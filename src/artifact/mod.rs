//! Per-artifact fact store
//!
//! An [`Artifact`] is everything known about one third-party dependency: at
//! most one fact per [`FactKind`], a bag of boolean flags, and the name of
//! the analyzer that created it.
//!
//! ```text
//!   analyzer ──add_fact──▶ ┌──────────────────────────┐
//!                          │ facts: FactKind → Fact    │ ◀──override_with── configuration
//!   processor ─get/get_all▶│ flags: name → bool        │
//!                          │ analysis_source           │ ──final_license──▶ generator
//!                          └──────────────────────────┘
//! ```
//!
//! Empty facts are invisible: every read skips them, so a fact that was
//! added empty and a fact that was never added look the same.

pub mod coordinates;
pub mod facts;
pub mod identifiers;

pub use coordinates::ArtifactCoordinates;
pub use facts::*;
pub use identifiers::{ArtifactFilename, ArtifactIdentifier, ArtifactPathnames, FilenameEntry, Identifiers};

use crate::coordinate::{Coordinate, CoordinateType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Flag set on artifacts that are the user's own code
pub const FLAG_PROPRIETARY: &str = "isProprietary";
/// Flag set once configuration amended the artifact
pub const FLAG_MODIFIED_BY_CONFIGURATION: &str = "isModifiedByConfiguration";
/// Flag telling source downloaders to skip the artifact
pub const FLAG_IGNORE_FOR_DOWNLOAD: &str = "isIgnoreForDownload";

const UNKNOWN_SOURCE: &str = "UNKNOWN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    analysis_source: Option<String>,
    #[serde(default)]
    facts: BTreeMap<FactKind, ArtifactFact>,
    #[serde(default)]
    flags: BTreeMap<String, bool>,
}

impl Artifact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact created by the named analyzer
    pub fn with_source(analysis_source: impl Into<String>) -> Self {
        Self {
            analysis_source: Some(analysis_source.into()),
            ..Self::default()
        }
    }

    pub fn analysis_source(&self) -> &str {
        self.analysis_source.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }

    // ─── Facts ─────────────────────────────────────────────────────

    /// Store a fact, merging it into an existing one of the same kind
    pub fn add_fact(&mut self, fact: impl Into<ArtifactFact>) -> &mut Self {
        let fact = fact.into();
        let kind = fact.kind();
        tracing::trace!("{} ← {}", self.analysis_source(), fact.pretty_print());

        let stored = match self.facts.remove(&kind) {
            Some(existing) => {
                tracing::debug!("Merging {} into existing fact", kind.content_name());
                existing.merge(fact)
            }
            None => fact,
        };
        self.facts.insert(kind, stored);
        self
    }

    /// The stored fact of type `F`, unless absent or empty
    pub fn get<F: StoredFact>(&self) -> Option<&F> {
        self.facts
            .get(&F::KIND)
            .filter(|fact| !fact.is_empty())
            .and_then(F::downcast)
    }

    pub fn has<F: StoredFact>(&self) -> bool {
        self.get::<F>().is_some()
    }

    /// Every non-empty fact the capability `C` covers, in kind order
    pub fn get_all<C: FactCapability>(&self) -> Vec<C::View<'_>> {
        self.facts().filter_map(C::view).collect()
    }

    /// Every non-empty fact, in kind order
    pub fn facts(&self) -> impl Iterator<Item = &ArtifactFact> {
        self.facts.values().filter(|fact| !fact.is_empty())
    }

    // ─── Flags ─────────────────────────────────────────────────────

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.flags.insert(key.into(), value);
        self
    }

    /// Unset flags read as `false`
    pub fn get_flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    /// Overlay `other`: its non-empty facts go through `add_fact`, its flags
    /// overwrite ours.
    pub fn override_with(&mut self, other: &Artifact) -> &mut Self {
        for fact in other.facts() {
            self.add_fact(fact.clone());
        }
        for (key, value) in &other.flags {
            self.flags.insert(key.clone(), *value);
        }
        self
    }

    // ─── Identity ──────────────────────────────────────────────────

    pub fn coordinates(&self) -> Option<&ArtifactCoordinates> {
        self.get::<ArtifactCoordinates>()
    }

    pub fn coordinate_for(&self, ty: CoordinateType) -> Option<&Coordinate> {
        self.coordinates().and_then(|c| c.get(ty))
    }

    pub fn main_coordinate(&self) -> Option<&Coordinate> {
        self.coordinates().and_then(ArtifactCoordinates::main)
    }

    /// Package URL of the main coordinate, otherwise the pretty print
    pub fn artifact_as_coordinate(&self) -> String {
        self.main_coordinate()
            .map(Coordinate::canonicalize)
            .unwrap_or_else(|| self.pretty_print())
    }

    pub fn identifiers(&self) -> Vec<ArtifactIdentifier<'_>> {
        self.get_all::<Identifiers>()
    }

    /// Any identifier of one artifact matches any identifier of the other
    pub fn is_potential_duplicate_of(&self, other: &Artifact) -> bool {
        let theirs = other.identifiers();
        self.identifiers()
            .iter()
            .any(|mine| theirs.iter().any(|t| mine.matches(t) || t.matches(mine)))
    }

    pub fn is_proprietary(&self) -> bool {
        self.get_flag(FLAG_PROPRIETARY)
    }

    pub fn match_state(&self) -> MatchState {
        self.get::<ArtifactMatchingMetadata>()
            .map(|m| m.match_state)
            .unwrap_or_default()
    }

    /// Multi-line human-readable dump of facts and flags
    pub fn pretty_print(&self) -> String {
        let mut out = format!("Artifact ({}): ", self.analysis_source());

        let mut lines: Vec<String> = self.facts().map(ArtifactFact::pretty_print).collect();
        if lines.is_empty() && self.flags.is_empty() {
            out.push_str("empty");
            return out;
        }
        lines.sort();
        out.push_str(&lines.join("\n\t"));

        let flags: Vec<String> = self
            .flags
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        out.push_str(&format!("\n\tFlags: [{}]", flags.join(", ")));
        out
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.identifiers().iter().map(ToString::to_string).collect();
        if ids.is_empty() {
            write!(f, "Artifact=[no identifier]")
        } else {
            write!(f, "Artifact=[{}]", ids.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::{License, LicenseInformation};

    fn mit() -> LicenseInformation {
        License::new("MIT").into()
    }

    #[test]
    fn test_add_then_get() {
        let mut artifact = Artifact::new();
        artifact.add_fact(DeclaredLicenseInformation(mit()));
        assert_eq!(
            artifact.get::<DeclaredLicenseInformation>(),
            Some(&DeclaredLicenseInformation(mit()))
        );
        assert!(artifact.get::<ObservedLicenseInformation>().is_none());
    }

    #[test]
    fn test_empty_fact_is_invisible() {
        let mut with_empty = Artifact::new();
        with_empty.add_fact(DeclaredLicenseInformation::default());
        let never_added = Artifact::new();

        assert!(with_empty.get::<DeclaredLicenseInformation>().is_none());
        assert!(with_empty.get_all::<LicenseFacts>().is_empty());
        assert_eq!(with_empty.pretty_print(), never_added.pretty_print());
        assert_eq!(with_empty.pretty_print(), "Artifact (UNKNOWN): empty");
    }

    #[test]
    fn test_flags_default_false_and_overwrite() {
        let mut artifact = Artifact::new();
        assert!(!artifact.get_flag(FLAG_PROPRIETARY));
        artifact.set_flag(FLAG_PROPRIETARY, true).set_flag(FLAG_PROPRIETARY, false);
        assert!(!artifact.is_proprietary());
    }

    #[test]
    fn test_get_all_identifiers() {
        let mut artifact = Artifact::new();
        artifact
            .add_fact(ArtifactCoordinates::from(Coordinate::maven("org.foo", "bar", "1.0")))
            .add_fact(ArtifactFilename::new("bar-1.0.jar"))
            .add_fact(ArtifactSourceUrl("https://example.org/bar".into()))
            .add_fact(ArtifactPathnames::default());
        assert_eq!(artifact.identifiers().len(), 2);
    }

    #[test]
    fn test_override_with_skips_empty_and_overlays_flags() {
        let mut artifact = Artifact::with_source("maven");
        artifact.add_fact(DeclaredLicenseInformation(mit()));

        let mut overlay = Artifact::with_source("configuration");
        overlay
            .add_fact(DeclaredLicenseInformation::default())
            .add_fact(ConfiguredLicenseInformation(License::new("Apache-2.0").into()))
            .set_flag(FLAG_MODIFIED_BY_CONFIGURATION, true);

        artifact.override_with(&overlay);
        assert_eq!(artifact.get::<DeclaredLicenseInformation>(), Some(&DeclaredLicenseInformation(mit())));
        assert!(artifact.has::<ConfiguredLicenseInformation>());
        assert!(artifact.get_flag(FLAG_MODIFIED_BY_CONFIGURATION));
        assert_eq!(artifact.analysis_source(), "maven");
    }

    #[test]
    fn test_pretty_print_sorted_lines() {
        let mut artifact = Artifact::with_source("npm");
        artifact
            .add_fact(ObservedLicenseInformation(mit()))
            .add_fact(DeclaredLicenseInformation(mit()))
            .set_flag(FLAG_PROPRIETARY, false);
        assert_eq!(
            artifact.pretty_print(),
            "Artifact (npm): Set DeclaredLicenseInformation to MIT\n\t\
             Set ObservedLicenseInformation to MIT\n\tFlags: [isProprietary: false]"
        );
    }

    #[test]
    fn test_artifact_as_coordinate() {
        let mut artifact = Artifact::new();
        assert_eq!(artifact.artifact_as_coordinate(), "Artifact (UNKNOWN): empty");
        artifact.add_fact(ArtifactCoordinates::from(Coordinate::npm("left-pad", "1.3.0")));
        assert_eq!(artifact.artifact_as_coordinate(), "pkg:npm/left-pad@1.3.0");
        assert_eq!(artifact.to_string(), "Artifact=[[ \"pkg:npm/left-pad@1.3.0\" ]]");
        assert_eq!(Artifact::new().to_string(), "Artifact=[no identifier]");
    }

    #[test]
    fn test_match_state_defaults_unknown() {
        let mut artifact = Artifact::new();
        assert_eq!(artifact.match_state(), MatchState::Unknown);
        artifact.add_fact(ArtifactMatchingMetadata { match_state: MatchState::Exact });
        assert_eq!(artifact.match_state(), MatchState::Exact);
        assert_eq!(artifact.analysis_source(), "UNKNOWN");
    }
}
