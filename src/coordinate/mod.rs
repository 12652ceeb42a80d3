//! Package coordinates
//!
//! A coordinate is one ecosystem's identity for a package. Every ecosystem
//! spells it differently (Maven GAV, npm scope/name, NuGet package id, P2
//! bundle symbolic name, …); here they share one shape, discriminated by
//! [`CoordinateType`], with a package-URL text form.

pub mod wildcard;

use crate::ClearanceError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Coordinate Types ──────────────────────────────────────────────

/// Ecosystem a coordinate belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateType {
    Maven,
    Npm,
    NuGet,
    P2,
    Golang,
    PyPi,
    Cargo,
    Generic,
}

impl CoordinateType {
    /// Package-URL type string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maven => "maven",
            Self::Npm => "npm",
            Self::NuGet => "nuget",
            Self::P2 => "p2",
            Self::Golang => "golang",
            Self::PyPi => "pypi",
            Self::Cargo => "cargo",
            Self::Generic => "generic",
        }
    }

    /// Unknown package-URL types collapse into `Generic`
    pub fn from_purl_type(ty: &str) -> Self {
        match ty.to_lowercase().as_str() {
            "maven" => Self::Maven,
            "npm" => Self::Npm,
            "nuget" => Self::NuGet,
            "p2" => Self::P2,
            "golang" => Self::Golang,
            "pypi" => Self::PyPi,
            "cargo" => Self::Cargo,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for CoordinateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Coordinate ────────────────────────────────────────────────────

/// One ecosystem-specific package identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "type")]
    pub coordinate_type: CoordinateType,
    /// Maven groupId, npm scope, Go module path prefix, …
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Coordinate {
    pub fn new(
        coordinate_type: CoordinateType,
        namespace: Option<&str>,
        name: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self {
            coordinate_type,
            namespace: sanitize(namespace),
            name: name.into().trim().to_string(),
            version: sanitize(version),
        }
    }

    pub fn maven(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self::new(CoordinateType::Maven, Some(group_id), artifact_id, Some(version))
    }

    pub fn npm(name: &str, version: &str) -> Self {
        match name.rsplit_once('/') {
            Some((scope, name)) => Self::new(CoordinateType::Npm, Some(scope), name, Some(version)),
            None => Self::new(CoordinateType::Npm, None, name, Some(version)),
        }
    }

    pub fn nuget(package_id: &str, version: &str) -> Self {
        Self::new(CoordinateType::NuGet, None, package_id, Some(version))
    }

    pub fn p2(symbolic_name: &str, bundle_version: &str) -> Self {
        Self::new(CoordinateType::P2, None, symbolic_name, Some(bundle_version))
    }

    pub fn generic(name: &str, version: Option<&str>) -> Self {
        Self::new(CoordinateType::Generic, None, name, version)
    }

    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.namespace.is_none() && self.version.is_none()
    }

    /// Wildcard match with `self` as the pattern.
    ///
    /// Types must agree. Fields `self` leaves unset (a blank name counts as
    /// unset) match anything.
    pub fn matches(&self, candidate: &Coordinate) -> bool {
        if self.coordinate_type != candidate.coordinate_type {
            return false;
        }
        let name = Some(self.name.as_str()).filter(|n| !n.trim().is_empty());
        wildcard::matches_str(name, Some(&candidate.name))
            && wildcard::matches_str(self.namespace.as_deref(), candidate.namespace.as_deref())
            && wildcard::matches_str(self.version.as_deref(), candidate.version.as_deref())
    }

    /// Field-wise merge: fields set on `incoming` win, unset ones keep `self`'s
    pub fn merged_with(self, incoming: Coordinate) -> Coordinate {
        if self.coordinate_type != incoming.coordinate_type {
            return incoming;
        }
        Coordinate {
            coordinate_type: incoming.coordinate_type,
            namespace: incoming.namespace.or(self.namespace),
            name: if incoming.name.trim().is_empty() {
                self.name
            } else {
                incoming.name
            },
            version: incoming.version.or(self.version),
        }
    }

    /// Package-URL form: `pkg:<type>/<namespace>/<name>@<version>`
    pub fn canonicalize(&self) -> String {
        let mut purl = format!("pkg:{}/", self.coordinate_type);
        if let Some(ns) = &self.namespace {
            purl.push_str(&encode_segment(ns, true));
            purl.push('/');
        }
        purl.push_str(&encode_segment(&self.name, false));
        if let Some(v) = &self.version {
            purl.push('@');
            purl.push_str(&encode_segment(v, false));
        }
        purl
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonicalize())
    }
}

impl FromStr for Coordinate {
    type Err = ClearanceError;

    /// Parse a package URL. Qualifiers and subpath are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| ClearanceError::Coordinate(format!("'{}': {}", s, why));

        let rest = s
            .trim()
            .strip_prefix("pkg:")
            .ok_or_else(|| invalid("missing 'pkg:' scheme"))?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (ty, path) = rest
            .split_once('/')
            .ok_or_else(|| invalid("missing package type"))?;
        let path = path.trim_matches('/');

        let (path, version) = match path.rsplit_once('@') {
            Some((p, v)) if !p.is_empty() && !v.contains('/') => (p, Some(v)),
            _ => (path, None),
        };
        let (namespace, name) = match path.rsplit_once('/') {
            Some((ns, name)) => (Some(ns), name),
            None => (None, path),
        };
        if name.is_empty() {
            return Err(invalid("missing package name"));
        }

        Ok(Coordinate {
            coordinate_type: CoordinateType::from_purl_type(ty),
            namespace: sanitize(namespace.map(decode_segment).as_deref()),
            name: decode_segment(name),
            version: sanitize(version.map(decode_segment).as_deref()),
        })
    }
}

fn sanitize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Characters escaped in a purl namespace; `/` separates its segments
const NAMESPACE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b'@').add(b'?').add(b'#');

/// Characters escaped in a purl name or version
const SEGMENT_SET: &AsciiSet = &NAMESPACE_SET.add(b'/');

fn encode_segment(segment: &str, keep_slash: bool) -> String {
    let set = if keep_slash { NAMESPACE_SET } else { SEGMENT_SET };
    utf8_percent_encode(segment, set).to_string()
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
