//! License algebra and SPDX interoperability
//!
//! Contains the boolean license-expression tree stored in license facts,
//! the SPDX expression parser/serializer, the final-license precedence rule,
//! and the coarse classification metadata licenses may carry.

pub mod information;
pub mod resolver;
pub mod spdx;
pub mod spdx_expression;

pub use information::*;
pub use resolver::{combine, final_license};
pub use spdx_expression::{LicenseParseError, ParseErrorKind, SpdxExpression};

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── License Classification ─────────────────────────────────────────

/// Whether a license is covered by the organisation's license catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseClassification {
    Covered,
    NotClassified,
    NotCovered,
}

// ─── Threat Groups ──────────────────────────────────────────────────

/// Broad compliance-risk grouping of a license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseThreatGroup {
    /// Not yet assessed
    Unknown,
    /// MIT, BSD, Apache, and file-level copyleft (LGPL, MPL, EPL)
    Liberal,
    /// GPL family; derivative works must use the same license
    StrictCopyleft,
    /// Network copyleft, source-available and non-commercial terms
    HighRisk,
    /// Public-domain equivalents (CC0, Unlicense, WTFPL)
    Freeware,
    /// Custom `LicenseRef-*` or otherwise unrecognized licenses
    NonStandard,
    /// License texts that deviate from their canonical wording
    NonVerbatim,
}

impl LicenseThreatGroup {
    /// Best-effort grouping from an SPDX identifier
    pub fn from_spdx(spdx: &str) -> Self {
        // Normalize: strip -only/-or-later/+ suffixes for grouping
        let upper = spdx.trim().to_uppercase();
        let normalized = upper
            .trim_end_matches("-ONLY")
            .trim_end_matches("-OR-LATER")
            .trim_end_matches('+');

        match normalized {
            "" | "NONE" | "NOASSERTION" => Self::Unknown,

            // ── Network copyleft / source-available / restricted ──
            s if s.starts_with("AGPL-") || s == "AGPL" => Self::HighRisk,
            s if s.contains("SSPL") => Self::HighRisk,
            s if s.contains("COMMONS-CLAUSE") || s.contains("POLYFORM") => Self::HighRisk,
            s if s.starts_with("BUSL") || s.starts_with("ELASTIC-") => Self::HighRisk,
            s if s.contains("CC-BY-NC") || s.contains("PROPRIETARY") => Self::HighRisk,

            // ── Strong copyleft ──
            s if s.starts_with("GPL-") || s == "GPL" => Self::StrictCopyleft,
            s if s.starts_with("CECILL-2") || s == "SLEEPYCAT" => Self::StrictCopyleft,
            s if s.starts_with("OSL-") || s.starts_with("EUPL-") => Self::StrictCopyleft,

            // ── Public domain ──
            "UNLICENSE" | "CC0-1.0" | "CC0" | "WTFPL" | "0BSD" => Self::Freeware,

            // ── Weak copyleft and permissive ──
            s if s.starts_with("LGPL-") || s.starts_with("MPL-") => Self::Liberal,
            s if s.starts_with("EPL-") || s.starts_with("CDDL-") || s.starts_with("CPL-") => {
                Self::Liberal
            }
            s if s.starts_with("APACHE-") || s.starts_with("MIT") => Self::Liberal,
            s if s.starts_with("BSD-") || s.starts_with("BSL-1") => Self::Liberal,
            "ISC" | "ZLIB" | "POSTGRESQL" | "NCSA" | "X11" | "PSF-2.0" | "UNICODE-DFS-2016" => {
                Self::Liberal
            }
            s if s.starts_with("ARTISTIC-") || s.starts_with("OFL-") => Self::Liberal,

            // LicenseRef-*, DocumentRef-* and anything unrecognized
            _ => Self::NonStandard,
        }
    }
}

impl fmt::Display for LicenseThreatGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Liberal => write!(f, "Liberal"),
            Self::StrictCopyleft => write!(f, "Strict Copyleft"),
            Self::HighRisk => write!(f, "High Risk"),
            Self::Freeware => write!(f, "Freeware"),
            Self::NonStandard => write!(f, "Non Standard"),
            Self::NonVerbatim => write!(f, "Non Verbatim"),
        }
    }
}
