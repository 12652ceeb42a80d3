//! License algebra
//!
//! A license finding is a small boolean expression tree: single licenses,
//! AND/OR statements over sub-expressions, and `WITH` exceptions. The tree is
//! what analyzers store as license facts and what the final-license
//! resolution collapses into one value.

use super::{LicenseClassification, LicenseThreatGroup};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// ─── Operator ──────────────────────────────────────────────────────

/// Boolean operator joining the children of a license statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LicenseOperator {
    /// Conjunction: every child applies
    And,
    /// Disjunction: the licensee may choose one child
    Or,
}

impl LicenseOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LicenseOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Single License ────────────────────────────────────────────────

/// A single license with its descriptive metadata.
///
/// Equality is structural over every field: two values sharing an id but
/// carrying different texts are different licenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct License {
    /// SPDX identifier or `LicenseRef-*` reference
    pub id: String,
    /// Human-readable name ("Apache License 2.0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    /// Full license text, when a source provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<LicenseClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_group: Option<LicenseThreatGroup>,
}

impl License {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn builder(id: impl Into<String>) -> LicenseBuilder {
        LicenseBuilder {
            license: Self::new(id),
        }
    }

    /// A license without an id carries no information
    pub fn is_empty(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Long name if known, otherwise the id
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Builder for licenses coming out of knowledge bases
pub struct LicenseBuilder {
    license: License,
}

impl LicenseBuilder {
    pub fn long_name(mut self, name: impl Into<String>) -> Self {
        self.license.long_name = Some(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.license.text = Some(text.into());
        self
    }

    pub fn classification(mut self, classification: LicenseClassification) -> Self {
        self.license.classification = Some(classification);
        self
    }

    pub fn threat_group(mut self, group: LicenseThreatGroup) -> Self {
        self.license.threat_group = Some(group);
        self
    }

    pub fn build(self) -> License {
        self.license
    }
}

// ─── Expression Tree ───────────────────────────────────────────────

/// License information attached to an artifact.
///
/// `Statement` children are expected to be non-empty; the constructors
/// ([`LicenseInformation::statement`], [`LicenseInformation::and`],
/// [`LicenseInformation::or`]) drop empty operands, and the read operations
/// skip empty children if a caller built the variant by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LicenseInformation {
    #[default]
    Empty,
    License(License),
    Statement {
        op: LicenseOperator,
        children: Vec<LicenseInformation>,
    },
    WithException {
        license: License,
        exception: License,
    },
}

impl LicenseInformation {
    /// Build a statement, dropping empty children.
    ///
    /// No remaining children yields `Empty`; a single remaining child is
    /// returned as is.
    pub fn statement(op: LicenseOperator, children: Vec<LicenseInformation>) -> Self {
        let mut children: Vec<_> = children.into_iter().filter(|c| !c.is_empty()).collect();
        match children.len() {
            0 => Self::Empty,
            1 => children.remove(0),
            _ => Self::Statement { op, children },
        }
    }

    pub fn with_exception(license: License, exception: License) -> Self {
        Self::WithException { license, exception }
    }

    /// SPDX-style rendering using license ids.
    ///
    /// Statements render as `( a OP b OP c )`.
    pub fn evaluate(&self) -> String {
        self.render(by_id)
    }

    /// Same layout as [`evaluate`](Self::evaluate) but with long names
    pub fn evaluate_long(&self) -> String {
        self.render(by_long_name)
    }

    /// Render the tree, naming every license through `name`
    pub(crate) fn render(&self, name: fn(&License) -> Cow<'_, str>) -> String {
        match self {
            Self::Empty => String::new(),
            Self::License(license) => name(license).into_owned(),
            Self::Statement { op, children } => {
                let parts: Vec<String> = children
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(|c| c.render(name))
                    .collect();
                if parts.is_empty() {
                    return String::new();
                }
                format!("( {} )", parts.join(&format!(" {} ", op)))
            }
            Self::WithException { license, exception } => {
                format!("{} WITH {}", name(license), name(exception))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::License(license) => license.is_empty(),
            Self::Statement { children, .. } => children.iter().all(Self::is_empty),
            Self::WithException { license, exception } => license.is_empty() && exception.is_empty(),
        }
    }

    /// Every license in the tree, depth-first, without exact duplicates.
    ///
    /// A `WITH` node contributes its license and its exception. Duplicates are
    /// detected by full structural equality, not by id.
    pub fn licenses(&self) -> Vec<License> {
        let mut flat = Vec::new();
        self.collect_licenses(&mut flat);

        let mut unique: Vec<License> = Vec::with_capacity(flat.len());
        for license in flat {
            if !unique.contains(license) {
                unique.push(license.clone());
            }
        }
        unique
    }

    fn collect_licenses<'a>(&'a self, out: &mut Vec<&'a License>) {
        match self {
            Self::Empty => {}
            Self::License(license) => {
                if !license.is_empty() {
                    out.push(license);
                }
            }
            Self::Statement { children, .. } => {
                for child in children {
                    child.collect_licenses(out);
                }
            }
            Self::WithException { license, exception } => {
                for member in [license, exception] {
                    if !member.is_empty() {
                        out.push(member);
                    }
                }
            }
        }
    }

    /// Top-level operator, if this is a statement
    pub fn operator(&self) -> Option<LicenseOperator> {
        match self {
            Self::Statement { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn and(self, other: LicenseInformation) -> Self {
        self.join(LicenseOperator::And, other)
    }

    pub fn or(self, other: LicenseInformation) -> Self {
        self.join(LicenseOperator::Or, other)
    }

    fn join(self, op: LicenseOperator, other: LicenseInformation) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::Statement {
            op,
            children: vec![self, other],
        }
    }
}

fn by_id(license: &License) -> Cow<'_, str> {
    Cow::Borrowed(&license.id)
}

fn by_long_name(license: &License) -> Cow<'_, str> {
    Cow::Borrowed(license.display_name())
}

impl From<License> for LicenseInformation {
    fn from(license: License) -> Self {
        Self::License(license)
    }
}

impl fmt::Display for LicenseInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.evaluate())
    }
}

/// Fold a flat list of license ids into one statement joined by `op`
pub fn licenses_from_ids<I, S>(ids: I, op: LicenseOperator) -> LicenseInformation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    LicenseInformation::statement(
        op,
        ids.into_iter()
            .map(|id| LicenseInformation::License(License::new(id)))
            .collect(),
    )
}
