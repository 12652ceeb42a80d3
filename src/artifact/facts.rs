//! Fact kinds
//!
//! Every piece of information about an artifact is a fact. Each fact kind
//! decides for itself what "empty" means and how a second fact of the same
//! kind is merged into the stored one. [`ArtifactFact`] is the closed set of
//! kinds the store can hold, keyed by [`FactKind`].

use super::coordinates::ArtifactCoordinates;
use super::identifiers::{ArtifactFilename, ArtifactPathnames};
use crate::license::LicenseInformation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ─── Traits ────────────────────────────────────────────────────────

/// Behaviour every fact kind defines
pub trait Fact: Clone + fmt::Debug + fmt::Display {
    /// Empty facts are invisible to every read operation of the store
    fn is_empty(&self) -> bool;

    /// Combine the stored fact with an incoming one of the same kind.
    /// Last write wins unless a kind accumulates.
    fn merge(self, incoming: Self) -> Self
    where
        Self: Sized,
    {
        incoming
    }
}

/// A fact type that has a slot in [`ArtifactFact`]
pub trait StoredFact: Fact + Into<ArtifactFact> {
    const KIND: FactKind;

    fn downcast(fact: &ArtifactFact) -> Option<&Self>;
}

/// A cross-cutting view over several fact kinds, used with
/// [`Artifact::get_all`](super::Artifact::get_all)
pub trait FactCapability {
    type View<'a>;

    fn view(fact: &ArtifactFact) -> Option<Self::View<'_>>;
}

// ─── The Closed Set ────────────────────────────────────────────────

macro_rules! artifact_facts {
    ($($kind:ident($ty:ty) => $name:literal,)+) => {
        /// Type tag of a fact; the store holds at most one fact per kind
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FactKind {
            $($kind,)+
        }

        impl FactKind {
            /// Name used when pretty-printing artifacts
            pub fn content_name(&self) -> &'static str {
                match self {
                    $(Self::$kind => $name,)+
                }
            }
        }

        /// Any fact the store can hold
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(tag = "kind", content = "value")]
        pub enum ArtifactFact {
            $($kind($ty),)+
        }

        impl ArtifactFact {
            pub fn kind(&self) -> FactKind {
                match self {
                    $(Self::$kind(_) => FactKind::$kind,)+
                }
            }

            pub fn is_empty(&self) -> bool {
                match self {
                    $(Self::$kind(fact) => Fact::is_empty(fact),)+
                }
            }

            /// Dispatch to the kind's merge policy; mismatched kinds keep `incoming`
            pub fn merge(self, incoming: ArtifactFact) -> ArtifactFact {
                match (self, incoming) {
                    $((Self::$kind(stored), Self::$kind(incoming)) => Self::$kind(stored.merge(incoming)),)+
                    (_, incoming) => incoming,
                }
            }

            fn payload(&self) -> &dyn fmt::Display {
                match self {
                    $(Self::$kind(fact) => fact,)+
                }
            }
        }

        $(
            impl From<$ty> for ArtifactFact {
                fn from(fact: $ty) -> Self {
                    Self::$kind(fact)
                }
            }

            impl StoredFact for $ty {
                const KIND: FactKind = FactKind::$kind;

                fn downcast(fact: &ArtifactFact) -> Option<&Self> {
                    match fact {
                        ArtifactFact::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )+
    };
}

artifact_facts! {
    Coordinates(ArtifactCoordinates) => "ArtifactCoordinates",
    Filename(ArtifactFilename) => "Filename",
    Pathnames(ArtifactPathnames) => "Pathnames",
    File(ArtifactFile) => "File",
    SourceFile(ArtifactSourceFile) => "SourceFile",
    SourceUrl(ArtifactSourceUrl) => "SourceUrl",
    ReleaseTagUrl(ArtifactReleaseTagUrl) => "ReleaseTagUrl",
    VcsInfo(ArtifactVcsInfo) => "VCS Information",
    Cpe(ArtifactCpe) => "CPE",
    Copyright(CopyrightStatement) => "Copyright",
    MatchingMetadata(ArtifactMatchingMetadata) => "MatchingMetadata",
    Issues(ArtifactIssues) => "Issues",
    DeclaredLicense(DeclaredLicenseInformation) => "DeclaredLicenseInformation",
    ObservedLicense(ObservedLicenseInformation) => "ObservedLicenseInformation",
    OverriddenLicense(OverriddenLicenseInformation) => "OverriddenLicenseInformation",
    ConfiguredLicense(ConfiguredLicenseInformation) => "ConfiguredLicenseInformation",
}

impl ArtifactFact {
    pub fn pretty_print(&self) -> String {
        format!("Set {} to {}", self.kind().content_name(), self.payload())
    }
}

impl fmt::Display for ArtifactFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print())
    }
}

// ─── Files and URLs ────────────────────────────────────────────────

/// Local path of the artifact's binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile(pub PathBuf);

/// Local path of the artifact's source archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSourceFile(pub PathBuf);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSourceUrl(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReleaseTagUrl(pub String);

/// Common Platform Enumeration name (`cpe:2.3:a:vendor:product:…`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCpe(pub String);

impl Fact for ArtifactFile {
    fn is_empty(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

impl fmt::Display for ArtifactFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Fact for ArtifactSourceFile {
    fn is_empty(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

impl fmt::Display for ArtifactSourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Fact for ArtifactSourceUrl {
    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ArtifactSourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Fact for ArtifactReleaseTagUrl {
    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ArtifactReleaseTagUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Fact for ArtifactCpe {
    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ArtifactCpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── VCS ───────────────────────────────────────────────────────────

/// Where the artifact's sources are versioned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVcsInfo {
    /// "git", "svn", …
    pub vcs_type: Option<String>,
    pub url: Option<String>,
    pub revision: Option<String>,
}

impl Fact for ArtifactVcsInfo {
    fn is_empty(&self) -> bool {
        self.vcs_type.is_none() && self.url.is_none() && self.revision.is_none()
    }
}

impl fmt::Display for ArtifactVcsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VcsInfo{{type='{}', url='{}', revision='{}'}}",
            self.vcs_type.as_deref().unwrap_or(""),
            self.url.as_deref().unwrap_or(""),
            self.revision.as_deref().unwrap_or("")
        )
    }
}

// ─── Copyright ─────────────────────────────────────────────────────

/// Copyright notices; merging appends new lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyrightStatement(pub String);

impl Fact for CopyrightStatement {
    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn merge(self, incoming: Self) -> Self {
        if incoming.is_empty() {
            return self;
        }
        if self.is_empty() {
            return incoming;
        }
        let known: Vec<&str> = self.0.lines().map(str::trim).collect();
        let fresh: Vec<&str> = incoming
            .0
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !known.contains(l))
            .collect();
        if fresh.is_empty() {
            return self;
        }
        CopyrightStatement(format!("{}\n{}", self.0, fresh.join("\n")))
    }
}

impl fmt::Display for CopyrightStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Matching Metadata ─────────────────────────────────────────────

/// How reliably an analyzer identified the artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    Exact,
    Similar,
    #[default]
    Unknown,
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "EXACT"),
            Self::Similar => write!(f, "SIMILAR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMatchingMetadata {
    pub match_state: MatchState,
}

impl Fact for ArtifactMatchingMetadata {
    fn is_empty(&self) -> bool {
        self.match_state == MatchState::Unknown
    }
}

impl fmt::Display for ArtifactMatchingMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.match_state)
    }
}

// ─── Issues ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Confirmed,
    NotApplicable,
    Resolved,
}

/// A known security or quality issue (CVE, advisory, …)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    pub reference: String,
    pub status: IssueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Issues reported by different sources accumulate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIssues(pub Vec<Issue>);

impl Fact for ArtifactIssues {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn merge(mut self, incoming: Self) -> Self {
        for issue in incoming.0 {
            if !self.0.contains(&issue) {
                self.0.push(issue);
            }
        }
        self
    }
}

impl fmt::Display for ArtifactIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let refs: Vec<&str> = self.0.iter().map(|i| i.reference.as_str()).collect();
        write!(f, "[{}]", refs.join(", "))
    }
}

// ─── License Facts ─────────────────────────────────────────────────

macro_rules! license_fact {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name(pub LicenseInformation);

        impl $name {
            pub fn license(&self) -> &LicenseInformation {
                &self.0
            }
        }

        impl Fact for $name {
            fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0.evaluate())
            }
        }

        impl From<LicenseInformation> for $name {
            fn from(info: LicenseInformation) -> Self {
                Self(info)
            }
        }
    };
}

license_fact! {
    /// License the package declares about itself (manifest, POM, package.json)
    DeclaredLicenseInformation
}

license_fact! {
    /// Licenses found by scanners in the artifact's files
    ObservedLicenseInformation
}

license_fact! {
    /// License corrected by tooling, e.g. a curated component catalogue
    OverriddenLicenseInformation
}

license_fact! {
    /// License set by the user's configuration; wins over everything else
    ConfiguredLicenseInformation
}

/// View over the four license facts
pub struct LicenseFacts;

impl FactCapability for LicenseFacts {
    type View<'a> = (FactKind, &'a LicenseInformation);

    fn view(fact: &ArtifactFact) -> Option<Self::View<'_>> {
        match fact {
            ArtifactFact::DeclaredLicense(f) => Some((fact.kind(), &f.0)),
            ArtifactFact::ObservedLicense(f) => Some((fact.kind(), &f.0)),
            ArtifactFact::OverriddenLicense(f) => Some((fact.kind(), &f.0)),
            ArtifactFact::ConfiguredLicense(f) => Some((fact.kind(), &f.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::License;

    #[test]
    fn test_default_merge_is_last_write_wins() {
        let merged = ArtifactFact::from(ArtifactSourceUrl("https://a".into()))
            .merge(ArtifactSourceUrl("https://b".into()).into());
        assert_eq!(merged, ArtifactFact::SourceUrl(ArtifactSourceUrl("https://b".into())));
    }

    #[test]
    fn test_copyright_merge_appends_new_lines() {
        let a = CopyrightStatement("Copyright (c) 2019 Foo".into());
        let b = CopyrightStatement("Copyright (c) 2019 Foo\nCopyright (c) 2020 Bar".into());
        let merged = a.merge(b);
        assert_eq!(merged.0, "Copyright (c) 2019 Foo\nCopyright (c) 2020 Bar");
    }

    #[test]
    fn test_issues_merge_dedups() {
        let issue = Issue {
            reference: "CVE-2021-44228".into(),
            status: IssueStatus::Confirmed,
            url: None,
        };
        let merged = ArtifactIssues(vec![issue.clone()]).merge(ArtifactIssues(vec![issue]));
        assert_eq!(merged.0.len(), 1);
    }

    #[test]
    fn test_pretty_print_names_kind() {
        let fact = ArtifactFact::from(DeclaredLicenseInformation(License::new("MIT").into()));
        assert_eq!(fact.pretty_print(), "Set DeclaredLicenseInformation to MIT");
        assert_eq!(fact.kind(), DeclaredLicenseInformation::KIND);
    }

    #[test]
    fn test_unknown_match_state_is_empty() {
        assert!(ArtifactMatchingMetadata { match_state: MatchState::Unknown }.is_empty());
        assert!(!ArtifactMatchingMetadata { match_state: MatchState::Exact }.is_empty());
    }
}
