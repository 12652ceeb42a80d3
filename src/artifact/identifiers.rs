//! Identifying facts
//!
//! Coordinates, filenames and pathnames are the facts that say *which*
//! artifact a store describes. They are what selectors and duplicate
//! detection look at.

use super::coordinates::ArtifactCoordinates;
use super::facts::{ArtifactFact, Fact, FactCapability};
use crate::coordinate::wildcard;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

// ─── Filename Entries ──────────────────────────────────────────────

/// A filename, optionally with the hash of the file's contents
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilenameEntry {
    pub filename: Option<String>,
    pub hash: Option<String>,
    pub hash_algorithm: Option<String>,
}

impl FilenameEntry {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: sanitize(filename),
            hash: None,
            hash_algorithm: None,
        }
    }

    pub fn with_hash(filename: &str, hash: &str, hash_algorithm: &str) -> Self {
        Self {
            filename: sanitize(filename),
            hash: sanitize(hash),
            hash_algorithm: sanitize(hash_algorithm),
        }
    }

    /// Entry carrying the SHA-256 digest of `contents`
    pub fn sha256_of(filename: &str, contents: &[u8]) -> Self {
        let digest = hex::encode(Sha256::digest(contents));
        Self::with_hash(filename, &digest, "SHA-256")
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.hash.is_none()
    }

    /// Wildcard match with `self` as the pattern. A hash pattern also
    /// requires the algorithms to agree.
    pub fn matches(&self, candidate: &FilenameEntry) -> bool {
        wildcard::matches_str(self.filename.as_deref(), candidate.filename.as_deref())
            && wildcard::matches_str(self.hash.as_deref(), candidate.hash.as_deref())
            && (self.hash.is_none() || self.is_same_algorithm(candidate.hash_algorithm.as_deref()))
    }

    /// Hash algorithm names compare case-insensitively ("sha-1" is "SHA-1")
    pub fn is_same_algorithm(&self, algorithm: Option<&str>) -> bool {
        match (self.hash_algorithm.as_deref(), algorithm) {
            (Some(own), Some(other)) => own.trim().eq_ignore_ascii_case(other.trim()),
            (own, other) => own == other,
        }
    }
}

impl fmt::Display for FilenameEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename.as_deref().unwrap_or("<unnamed>"))?;
        if let Some(hash) = &self.hash {
            write!(
                f,
                " ({}: {})",
                self.hash_algorithm.as_deref().unwrap_or("UNKNOWN"),
                hash
            )?;
        }
        Ok(())
    }
}

fn sanitize(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// ─── Filename ──────────────────────────────────────────────────────

/// Every filename/hash pair any source reported; merging unions the sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFilename {
    entries: BTreeSet<FilenameEntry>,
}

impl ArtifactFilename {
    pub fn new(filename: &str) -> Self {
        Self::from(FilenameEntry::new(filename))
    }

    pub fn entries(&self) -> impl Iterator<Item = &FilenameEntry> {
        self.entries.iter().filter(|e| !e.is_empty())
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.filename.as_deref())
    }

    /// Longest known filename, the most specific guess
    pub fn best_filename(&self) -> Option<&str> {
        self.filenames().max_by_key(|f| f.len())
    }

    /// Symmetric: either side's entry may act as the pattern
    pub fn matches(&self, other: &ArtifactFilename) -> bool {
        self.entries()
            .any(|a| other.entries().any(|b| a.matches(b) || b.matches(a)))
    }

    pub fn matches_pathnames(&self, pathnames: &ArtifactPathnames) -> bool {
        self.filenames()
            .any(|name| pathnames.iter().any(|path| path_ends_with(path, name)))
    }
}

impl From<FilenameEntry> for ArtifactFilename {
    fn from(entry: FilenameEntry) -> Self {
        Self {
            entries: BTreeSet::from([entry]),
        }
    }
}

impl FromIterator<FilenameEntry> for ArtifactFilename {
    fn from_iter<I: IntoIterator<Item = FilenameEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Fact for ArtifactFilename {
    fn is_empty(&self) -> bool {
        self.entries.iter().all(FilenameEntry::is_empty)
    }

    fn merge(mut self, incoming: Self) -> Self {
        self.entries.extend(incoming.entries);
        self
    }
}

impl fmt::Display for ArtifactFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.entries().map(ToString::to_string).collect();
        write!(f, "[{}]", entries.join(","))
    }
}

// ─── Pathnames ─────────────────────────────────────────────────────

/// Paths at which the artifact was found inside the analyzed project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPathnames(Vec<String>);

impl ArtifactPathnames {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pathnames = Self::default();
        for path in paths {
            pathnames.push(path.into());
        }
        pathnames
    }

    fn push(&mut self, path: String) {
        if !path.trim().is_empty() && !self.0.contains(&path) {
            self.0.push(path);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Last path component of every path
    pub fn basenames(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter_map(|p| p.rsplit(['/', '\\']).next())
            .filter(|b| !b.is_empty())
    }

    pub fn matches(&self, other: &ArtifactPathnames) -> bool {
        self.iter().any(|p| other.0.iter().any(|q| q == p))
    }
}

impl Fact for ArtifactPathnames {
    fn is_empty(&self) -> bool {
        self.0.iter().all(|p| p.trim().is_empty())
    }

    fn merge(mut self, incoming: Self) -> Self {
        for path in incoming.0 {
            self.push(path);
        }
        self
    }
}

impl fmt::Display for ArtifactPathnames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

fn path_ends_with(path: &str, filename: &str) -> bool {
    path == filename
        || path
            .strip_suffix(filename)
            .is_some_and(|prefix| prefix.ends_with('/') || prefix.ends_with('\\'))
}

// ─── Identifier Capability ─────────────────────────────────────────

/// A borrowed identifying fact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactIdentifier<'a> {
    Coordinates(&'a ArtifactCoordinates),
    Filename(&'a ArtifactFilename),
    Pathnames(&'a ArtifactPathnames),
}

impl ArtifactIdentifier<'_> {
    /// Whether `self`, read as a pattern, identifies the same artifact as `other`
    pub fn matches(&self, other: &ArtifactIdentifier<'_>) -> bool {
        use ArtifactIdentifier::*;
        match (self, other) {
            (Coordinates(a), Coordinates(b)) => a.matches(b),
            (Filename(a), Filename(b)) => a.matches(b),
            (Filename(a), Pathnames(b)) | (Pathnames(b), Filename(a)) => a.matches_pathnames(b),
            (Pathnames(a), Pathnames(b)) => a.matches(b),
            _ => false,
        }
    }
}

impl fmt::Display for ArtifactIdentifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates(c) => write!(f, "{}", c),
            Self::Filename(n) => write!(f, "{}", n),
            Self::Pathnames(p) => write!(f, "{}", p),
        }
    }
}

/// Selects the identifying facts of an artifact
pub struct Identifiers;

impl FactCapability for Identifiers {
    type View<'a> = ArtifactIdentifier<'a>;

    fn view(fact: &ArtifactFact) -> Option<Self::View<'_>> {
        match fact {
            ArtifactFact::Coordinates(c) => Some(ArtifactIdentifier::Coordinates(c)),
            ArtifactFact::Filename(n) => Some(ArtifactIdentifier::Filename(n)),
            ArtifactFact::Pathnames(p) => Some(ArtifactIdentifier::Pathnames(p)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_entry_wildcard() {
        let pattern = FilenameEntry::new("commons-*.jar");
        assert!(pattern.matches(&FilenameEntry::new("commons-io-2.11.0.jar")));
        assert!(!pattern.matches(&FilenameEntry::new("guava-31.jar")));
    }

    #[test]
    fn test_hash_requires_same_algorithm() {
        let a = FilenameEntry::with_hash("a.jar", "abc", "SHA-1");
        let b = FilenameEntry::with_hash("a.jar", "abc", "MD5");
        assert!(!a.matches(&b));
        assert!(a.matches(&FilenameEntry::with_hash("a.jar", "abc", "SHA-1")));
    }

    #[test]
    fn test_hash_algorithm_case_insensitive() {
        let upper = FilenameEntry::with_hash("a.jar", "abc", "SHA-1");
        let lower = FilenameEntry::with_hash("a.jar", "abc", "sha-1");
        assert!(upper.matches(&lower));
        assert!(lower.matches(&upper));
        assert!(!upper.is_same_algorithm(None));
        assert!(FilenameEntry::new("a.jar").is_same_algorithm(None));
    }

    #[test]
    fn test_filename_matching_is_symmetric() {
        let pattern = ArtifactFilename::new("foo-*.jar");
        let concrete = ArtifactFilename::new("foo-1.0.jar");
        assert!(pattern.matches(&concrete));
        assert!(concrete.matches(&pattern));
    }

    #[test]
    fn test_filename_matches_pathname_suffix() {
        let name = ArtifactFilename::new("foo.jar");
        assert!(name.matches_pathnames(&ArtifactPathnames::new(["lib/foo.jar"])));
        assert!(name.matches_pathnames(&ArtifactPathnames::new(["C:\\libs\\foo.jar"])));
        assert!(name.matches_pathnames(&ArtifactPathnames::new(["foo.jar"])));
        assert!(!name.matches_pathnames(&ArtifactPathnames::new(["lib/barfoo.jar"])));
    }

    #[test]
    fn test_filename_merge_is_union() {
        let merged = ArtifactFilename::new("a.jar").merge(ArtifactFilename::new("a-sources.jar"));
        assert_eq!(merged.filenames().count(), 2);
        assert_eq!(merged.best_filename(), Some("a-sources.jar"));
    }

    #[test]
    fn test_pathnames_merge_dedups() {
        let merged = ArtifactPathnames::new(["lib/a.jar"]).merge(ArtifactPathnames::new(["lib/a.jar", "lib/b.jar"]));
        assert_eq!(merged.iter().count(), 2);
        assert_eq!(merged.basenames().collect::<Vec<_>>(), vec!["a.jar", "b.jar"]);
    }

    #[test]
    fn test_sha256_entry() {
        let entry = FilenameEntry::sha256_of("empty.txt", b"");
        assert_eq!(
            entry.hash.as_deref(),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(entry.hash_algorithm.as_deref(), Some("SHA-256"));
    }
}
