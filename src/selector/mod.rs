//! Artifact selectors
//!
//! A selector picks artifacts by wildcard patterns over their identity:
//! filename and hash on one side, per-ecosystem coordinate fields on the
//! other. It is satisfied when *any* dimension it configures matches;
//! dimensions it leaves out are ignored.
//!
//! ```toml
//! [[overrides]]
//! selector = { filename = "log4j-core-*.jar" }
//!
//! [[overrides]]
//! [overrides.selector.coordinates.maven]
//! namespace = "org.apache.logging.*"
//! name = "log4j-core"
//! ```

use crate::artifact::{Artifact, ArtifactFilename, ArtifactPathnames, FilenameEntry};
use crate::coordinate::wildcard::{self, WildcardPattern};
use crate::coordinate::{Coordinate, CoordinateType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Field Patterns ────────────────────────────────────────────────

/// Wildcards for the fields of one coordinate; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPatterns {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<WildcardPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<WildcardPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<WildcardPattern>,
}

impl FieldPatterns {
    pub fn name(pattern: &str) -> Self {
        Self {
            name: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, pattern: &str) -> Self {
        self.namespace = Some(pattern.into());
        self
    }

    pub fn with_version(mut self, pattern: &str) -> Self {
        self.version = Some(pattern.into());
        self
    }

    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        wildcard::matches(self.namespace.as_ref(), coordinate.namespace.as_deref())
            && wildcard::matches(self.name.as_ref(), Some(coordinate.name.as_str()))
            && wildcard::matches(self.version.as_ref(), coordinate.version.as_deref())
    }
}

impl From<&Coordinate> for FieldPatterns {
    /// Patterns that match exactly this coordinate's set fields
    fn from(coordinate: &Coordinate) -> Self {
        Self {
            namespace: coordinate.namespace.as_deref().map(WildcardPattern::from),
            name: Some(coordinate.name.as_str())
                .filter(|n| !n.trim().is_empty())
                .map(WildcardPattern::from),
            version: coordinate.version.as_deref().map(WildcardPattern::from),
        }
    }
}

// ─── Selector ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<WildcardPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<WildcardPattern>,
    /// Only consulted together with `hash`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub coordinates: BTreeMap<CoordinateType, FieldPatterns>,
}

impl ArtifactSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, pattern: &str) -> Self {
        self.filename = Some(pattern.into());
        self
    }

    pub fn with_hash(mut self, pattern: &str, algorithm: &str) -> Self {
        self.hash = Some(pattern.into());
        self.hash_algorithm = Some(algorithm.to_string());
        self
    }

    pub fn with_coordinate(mut self, ty: CoordinateType, patterns: FieldPatterns) -> Self {
        self.coordinates.insert(ty, patterns);
        self
    }

    /// Selector matching exactly the given coordinate
    pub fn for_coordinate(coordinate: &Coordinate) -> Self {
        Self::new().with_coordinate(coordinate.coordinate_type, coordinate.into())
    }

    fn has_file_dimension(&self) -> bool {
        self.filename.is_some() || self.hash.is_some()
    }

    /// A selector configuring no dimension selects nothing
    pub fn is_empty(&self) -> bool {
        !self.has_file_dimension() && self.coordinates.is_empty()
    }

    pub fn matches(&self, artifact: &Artifact) -> bool {
        let matched = (self.has_file_dimension() && self.matches_files(artifact))
            || (!self.coordinates.is_empty() && self.matches_coordinates(artifact));
        if matched {
            tracing::debug!("Selector {:?} matched {}", self, artifact);
        }
        matched
    }

    fn matches_files(&self, artifact: &Artifact) -> bool {
        let mut candidates: Vec<FilenameEntry> = artifact
            .get::<ArtifactFilename>()
            .map(|f| f.entries().cloned().collect())
            .unwrap_or_default();
        if let Some(paths) = artifact.get::<ArtifactPathnames>() {
            candidates.extend(paths.basenames().map(FilenameEntry::new));
        }
        if candidates.is_empty() {
            return self.matches_entry(&FilenameEntry::new(""));
        }
        candidates.iter().any(|entry| self.matches_entry(entry))
    }

    fn matches_entry(&self, entry: &FilenameEntry) -> bool {
        wildcard::matches(self.filename.as_ref(), entry.filename.as_deref())
            && wildcard::matches(self.hash.as_ref(), entry.hash.as_deref())
            && self.matches_algorithm(entry)
    }

    fn matches_algorithm(&self, entry: &FilenameEntry) -> bool {
        match (&self.hash, &self.hash_algorithm) {
            (Some(_), Some(algorithm)) => entry.is_same_algorithm(Some(algorithm)),
            _ => true,
        }
    }

    /// Existential over types present on both sides
    fn matches_coordinates(&self, artifact: &Artifact) -> bool {
        self.coordinates.iter().any(|(ty, patterns)| {
            artifact
                .coordinate_for(*ty)
                .is_some_and(|coordinate| patterns.matches(coordinate))
        })
    }
}

// ─── Selector Sets ─────────────────────────────────────────────────

/// Combinator over several selectors; an empty set selects nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorSet {
    All(Vec<ArtifactSelector>),
    Any(Vec<ArtifactSelector>),
}

impl SelectorSet {
    pub fn matches(&self, artifact: &Artifact) -> bool {
        match self {
            Self::All(selectors) => {
                !selectors.is_empty() && selectors.iter().all(|s| s.matches(artifact))
            }
            Self::Any(selectors) => selectors.iter().any(|s| s.matches(artifact)),
        }
    }
}
