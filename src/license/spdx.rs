//! SPDX codec
//!
//! Converts between SPDX license-expression strings and the license algebra.
//! Parsing flattens associative runs, so `A AND B AND C` becomes a single
//! three-child AND statement instead of a right- or left-leaning chain.

use super::spdx_expression::{is_license_identifier, SpdxExpression, SpdxOperator};
use super::{License, LicenseInformation, LicenseOperator, LicenseParseError};
use std::borrow::Cow;

/// Parse an SPDX expression into license information.
///
/// Blank input yields `LicenseInformation::Empty`.
pub fn parse(expr: &str) -> Result<LicenseInformation, LicenseParseError> {
    if expr.trim().is_empty() {
        return Ok(LicenseInformation::Empty);
    }
    let tree = SpdxExpression::parse(expr)?;
    Ok(convert(&tree))
}

/// Parse, falling back to one opaque license named by the whole input.
///
/// License information is never dropped: an unparsable declaration such as
/// `"Apache License, Version 2.0"` is kept verbatim as a license id.
pub fn parse_lenient(expr: &str) -> LicenseInformation {
    match parse(expr) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("Treating '{}' as a single license: {}", expr, e);
            LicenseInformation::License(License::new(expr.trim()))
        }
    }
}

/// Render license information in SPDX expression syntax.
///
/// Ids that are not valid SPDX tokens, such as the opaque licenses kept by
/// [`parse_lenient`], are written through [`spdx_id`] so the output always
/// parses back.
pub fn serialize(info: &LicenseInformation) -> String {
    info.render(spdx_name)
}

/// The id as it appears in an SPDX expression.
///
/// Valid identifiers pass through. Anything else becomes a `LicenseRef-`
/// with every character outside `[A-Za-z0-9.-]` replaced by `-`.
pub fn spdx_id(id: &str) -> Cow<'_, str> {
    let id = id.trim();
    if id.is_empty() || is_license_identifier(id) {
        return Cow::Borrowed(id);
    }
    let body = id.strip_prefix("LicenseRef-").unwrap_or(id);
    let sanitized: String = body
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect();
    Cow::Owned(format!("LicenseRef-{}", sanitized))
}

fn spdx_name(license: &License) -> Cow<'_, str> {
    spdx_id(&license.id)
}

fn operator(op: SpdxOperator) -> LicenseOperator {
    match op {
        SpdxOperator::And => LicenseOperator::And,
        SpdxOperator::Or => LicenseOperator::Or,
    }
}

fn convert(expr: &SpdxExpression) -> LicenseInformation {
    match expr {
        SpdxExpression::LicenseId { .. } | SpdxExpression::LicenseRef { .. } => {
            LicenseInformation::License(License::new(expr.leaf_id()))
        }
        SpdxExpression::WithException { license, exception } => LicenseInformation::WithException {
            license: License::new(license.leaf_id()),
            exception: License::new(exception.as_str()),
        },
        SpdxExpression::Compound { op, operands } => {
            let mut children = Vec::new();
            for operand in operands {
                flatten_into(operand, *op, &mut children);
            }
            LicenseInformation::Statement {
                op: operator(*op),
                children,
            }
        }
    }
}

/// Splice same-operator compounds into `out`; anything else becomes one child
fn flatten_into(expr: &SpdxExpression, parent: SpdxOperator, out: &mut Vec<LicenseInformation>) {
    match expr {
        SpdxExpression::Compound { op, operands } if *op == parent => {
            for operand in operands {
                flatten_into(operand, parent, out);
            }
        }
        other => out.push(convert(other)),
    }
}

/// Serde adapter storing license information as an SPDX string.
///
/// ```ignore
/// #[serde(default, with = "clearance::license::spdx::as_spdx")]
/// configured_license: LicenseInformation,
/// ```
pub mod as_spdx {
    use super::{parse_lenient, serialize as render};
    use crate::license::LicenseInformation;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(info: &LicenseInformation, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&render(info))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LicenseInformation, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(parse_lenient(&raw))
    }
}
