//! SPDX License Expression Parser
//!
//! Parses compound SPDX expressions like:
//!   `MIT OR Apache-2.0`
//!   `GPL-2.0-only WITH Classpath-exception-2.0`
//!   `(MIT AND BSD-2-Clause) OR Apache-2.0`
//!   `LGPL-2.1+ AND LicenseRef-acme-eula`
//!
//! into the raw grammar tree. Conversion into the license algebra lives in
//! [`super::spdx`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// SPDX `idstring`, optionally followed by the or-later `+`
static LICENSE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.\-]*\+?$").expect("static regex"));

/// `[DocumentRef-<id>:]LicenseRef-<id>`
static LICENSE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:DocumentRef-([A-Za-z0-9.\-]+):)?LicenseRef-([A-Za-z0-9.\-]+)$")
        .expect("static regex")
});

/// Binary operator of a compound SPDX node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpdxOperator {
    And,
    Or,
}

/// A parsed SPDX license expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpdxExpression {
    /// Listed license identifier (e.g., "MIT", "LGPL-2.1+")
    LicenseId { id: String, or_later: bool },
    /// Custom license reference (e.g., "LicenseRef-acme")
    LicenseRef {
        document_ref: Option<String>,
        license_ref: String,
    },
    /// License with exception (e.g., "GPL-2.0 WITH Classpath-exception-2.0")
    WithException {
        license: Box<SpdxExpression>,
        exception: String,
    },
    /// AND / OR run of two or more operands
    Compound {
        op: SpdxOperator,
        operands: Vec<SpdxExpression>,
    },
}

/// Why an SPDX expression was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Empty,
    InvalidIdentifier,
    UnexpectedToken,
    UnexpectedEnd,
    UnbalancedParenthesis,
    MissingException,
    TooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty expression"),
            Self::InvalidIdentifier => write!(f, "invalid license identifier"),
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::UnbalancedParenthesis => write!(f, "unbalanced parenthesis"),
            Self::MissingException => write!(f, "expected exception identifier after WITH"),
            Self::TooDeep => write!(f, "parentheses nested deeper than {}", MAX_NESTING),
        }
    }
}

/// Malformed SPDX expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at '{fragment}'")]
pub struct LicenseParseError {
    pub kind: ParseErrorKind,
    /// The offending part of the input
    pub fragment: String,
}

impl LicenseParseError {
    fn new(kind: ParseErrorKind, fragment: impl Into<String>) -> Self {
        Self {
            kind,
            fragment: fragment.into(),
        }
    }
}

impl SpdxExpression {
    /// Parse an SPDX expression string
    pub fn parse(input: &str) -> Result<Self, LicenseParseError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(LicenseParseError::new(ParseErrorKind::Empty, input));
        }
        let (expr, rest) = parse_or(&tokens, input, 0)?;
        if let Some(token) = rest.first() {
            let kind = if *token == Token::RParen {
                ParseErrorKind::UnbalancedParenthesis
            } else {
                ParseErrorKind::UnexpectedToken
            };
            return Err(LicenseParseError::new(kind, token.to_string()));
        }
        Ok(expr)
    }

    /// All license identifiers in the expression, exceptions excluded
    pub fn licenses(&self) -> Vec<String> {
        match self {
            Self::LicenseId { .. } | Self::LicenseRef { .. } => vec![self.leaf_id()],
            Self::WithException { license, .. } => license.licenses(),
            Self::Compound { operands, .. } => operands.iter().flat_map(Self::licenses).collect(),
        }
    }

    /// Textual id of a leaf node, `+` and `DocumentRef-` prefix included
    pub(crate) fn leaf_id(&self) -> String {
        match self {
            Self::LicenseId { id, or_later } => {
                if *or_later {
                    format!("{}+", id)
                } else {
                    id.clone()
                }
            }
            Self::LicenseRef {
                document_ref: Some(doc),
                license_ref,
            } => format!("DocumentRef-{}:LicenseRef-{}", doc, license_ref),
            Self::LicenseRef { license_ref, .. } => format!("LicenseRef-{}", license_ref),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for SpdxExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LicenseId { .. } | Self::LicenseRef { .. } => f.write_str(&self.leaf_id()),
            Self::WithException { license, exception } => {
                write!(f, "{} WITH {}", license, exception)
            }
            Self::Compound { op, operands } => {
                let op = match op {
                    SpdxOperator::And => " AND ",
                    SpdxOperator::Or => " OR ",
                };
                let parts: Vec<String> = operands.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(op))
            }
        }
    }
}

// ─── Tokenizer ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(id) => f.write_str(id),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::With => f.write_str("WITH"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, LicenseParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                match word.to_uppercase().as_str() {
                    "AND" => tokens.push(Token::And),
                    "OR" => tokens.push(Token::Or),
                    "WITH" => tokens.push(Token::With),
                    _ => {
                        if !matches_identifier(&word) {
                            return Err(LicenseParseError::new(
                                ParseErrorKind::InvalidIdentifier,
                                word,
                            ));
                        }
                        tokens.push(Token::Identifier(word));
                    }
                }
            }
        }
    }

    Ok(tokens)
}

fn matches_identifier(word: &str) -> bool {
    LICENSE_REF.is_match(word) || LICENSE_ID.is_match(word)
}

/// Whether `word` reads back as a single license token
pub(crate) fn is_license_identifier(word: &str) -> bool {
    !matches!(word.to_uppercase().as_str(), "AND" | "OR" | "WITH") && matches_identifier(word)
}

// ─── Recursive Descent Parser ──────────────────────────────────────
// Precedence: WITH > AND > OR (WITH binds tightest)
//
// Operator runs are collected iteratively; only parentheses recurse, and
// their depth is capped at MAX_NESTING.

/// Deepest parenthesis nesting accepted by the parser
pub const MAX_NESTING: usize = 64;

type Parsed<'a> = Result<(SpdxExpression, &'a [Token]), LicenseParseError>;

fn parse_or<'a>(tokens: &'a [Token], input: &str, depth: usize) -> Parsed<'a> {
    let (first, mut rest) = parse_and(tokens, input, depth)?;
    let mut operands = vec![first];

    while rest.first() == Some(&Token::Or) {
        let (next, r) = parse_and(&rest[1..], input, depth)?;
        operands.push(next);
        rest = r;
    }

    Ok((compound(SpdxOperator::Or, operands), rest))
}

fn parse_and<'a>(tokens: &'a [Token], input: &str, depth: usize) -> Parsed<'a> {
    let (first, mut rest) = parse_with(tokens, input, depth)?;
    let mut operands = vec![first];

    while rest.first() == Some(&Token::And) {
        let (next, r) = parse_with(&rest[1..], input, depth)?;
        operands.push(next);
        rest = r;
    }

    Ok((compound(SpdxOperator::And, operands), rest))
}

fn compound(op: SpdxOperator, mut operands: Vec<SpdxExpression>) -> SpdxExpression {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        SpdxExpression::Compound { op, operands }
    }
}

fn parse_with<'a>(tokens: &'a [Token], input: &str, depth: usize) -> Parsed<'a> {
    let (base, rest) = parse_primary(tokens, input, depth)?;

    if rest.first() != Some(&Token::With) {
        return Ok((base, rest));
    }
    if matches!(base, SpdxExpression::Compound { .. } | SpdxExpression::WithException { .. }) {
        return Err(LicenseParseError::new(
            ParseErrorKind::UnexpectedToken,
            format!("{} WITH", base),
        ));
    }
    match rest.get(1) {
        Some(Token::Identifier(exception)) => Ok((
            SpdxExpression::WithException {
                license: Box::new(base),
                exception: exception.clone(),
            },
            &rest[2..],
        )),
        Some(other) => Err(LicenseParseError::new(
            ParseErrorKind::MissingException,
            format!("WITH {}", other),
        )),
        None => Err(LicenseParseError::new(ParseErrorKind::MissingException, "WITH")),
    }
}

fn parse_primary<'a>(tokens: &'a [Token], input: &str, depth: usize) -> Parsed<'a> {
    let Some(first) = tokens.first() else {
        return Err(LicenseParseError::new(ParseErrorKind::UnexpectedEnd, input.trim()));
    };

    match first {
        Token::LParen => {
            if depth >= MAX_NESTING {
                return Err(LicenseParseError::new(ParseErrorKind::TooDeep, excerpt(tokens)));
            }
            let (expr, rest) = parse_or(&tokens[1..], input, depth + 1)?;
            if rest.first() != Some(&Token::RParen) {
                return Err(LicenseParseError::new(
                    ParseErrorKind::UnbalancedParenthesis,
                    format!("({}", expr),
                ));
            }
            Ok((expr, &rest[1..]))
        }
        Token::Identifier(word) => Ok((leaf(word), &tokens[1..])),
        other => Err(LicenseParseError::new(
            ParseErrorKind::UnexpectedToken,
            other.to_string(),
        )),
    }
}

/// First few tokens from `tokens`, for error fragments
fn excerpt(tokens: &[Token]) -> String {
    let mut parts: Vec<String> = tokens.iter().take(8).map(ToString::to_string).collect();
    if tokens.len() > 8 {
        parts.push("...".to_string());
    }
    parts.join(" ")
}

fn leaf(word: &str) -> SpdxExpression {
    if let Some(caps) = LICENSE_REF.captures(word) {
        return SpdxExpression::LicenseRef {
            document_ref: caps.get(1).map(|m| m.as_str().to_string()),
            license_ref: caps[2].to_string(),
        };
    }
    match word.strip_suffix('+') {
        Some(id) => SpdxExpression::LicenseId {
            id: id.to_string(),
            or_later: true,
        },
        None => SpdxExpression::LicenseId {
            id: word.to_string(),
            or_later: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SpdxExpression {
        SpdxExpression::LicenseId {
            id: s.into(),
            or_later: false,
        }
    }

    #[test]
    fn test_simple() {
        let expr = SpdxExpression::parse("MIT").unwrap();
        assert_eq!(expr, id("MIT"));
        assert_eq!(expr.licenses(), vec!["MIT"]);
    }

    #[test]
    fn test_or_later_suffix() {
        let expr = SpdxExpression::parse("LGPL-2.1+").unwrap();
        assert_eq!(
            expr,
            SpdxExpression::LicenseId {
                id: "LGPL-2.1".into(),
                or_later: true
            }
        );
        assert_eq!(expr.licenses(), vec!["LGPL-2.1+"]);
    }

    #[test]
    fn test_license_ref() {
        let expr = SpdxExpression::parse("DocumentRef-spdx-tool-1.2:LicenseRef-MIT-Style-2").unwrap();
        assert_eq!(
            expr,
            SpdxExpression::LicenseRef {
                document_ref: Some("spdx-tool-1.2".into()),
                license_ref: "MIT-Style-2".into()
            }
        );
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        let expr = SpdxExpression::parse("MIT OR Apache-2.0 AND BSD-3-Clause").unwrap();
        match expr {
            SpdxExpression::Compound { op, operands } => {
                assert_eq!(op, SpdxOperator::Or);
                assert_eq!(operands.len(), 2);
                assert!(matches!(operands[1], SpdxExpression::Compound { op: SpdxOperator::And, .. }));
            }
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_with_exception() {
        let expr = SpdxExpression::parse("GPL-2.0-only WITH Classpath-exception-2.0").unwrap();
        assert!(matches!(expr, SpdxExpression::WithException { .. }));
        assert_eq!(expr.licenses(), vec!["GPL-2.0-only"]);
    }

    #[test]
    fn test_operators_case_insensitive() {
        let expr = SpdxExpression::parse("mit or apache-2.0").unwrap();
        assert_eq!(expr.to_string(), "(mit OR apache-2.0)");
    }

    #[test]
    fn test_complex_nested() {
        let expr = SpdxExpression::parse("(MIT AND BSD-2-Clause) OR Apache-2.0").unwrap();
        assert_eq!(expr.licenses().len(), 3);
    }

    #[test]
    fn test_errors_carry_fragment() {
        let err = SpdxExpression::parse("MIT AND").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);

        let err = SpdxExpression::parse("(MIT OR ISC").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParenthesis);

        let err = SpdxExpression::parse("MIT)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParenthesis);

        let err = SpdxExpression::parse("GPL-2.0 WITH").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingException);

        let err = SpdxExpression::parse("Apache License, Version 2.0").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidIdentifier);
        assert_eq!(err.fragment, "License,");

        let err = SpdxExpression::parse("   ").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Empty);
    }

    #[test]
    fn test_operator_runs_are_collected_flat() {
        let expr = SpdxExpression::parse("A AND B AND C AND D").unwrap();
        match expr {
            SpdxExpression::Compound { op, operands } => {
                assert_eq!(op, SpdxOperator::And);
                assert_eq!(operands.len(), 4);
            }
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_long_operator_run_parses() {
        let input = vec!["MIT"; 20_000].join(" OR ");
        let expr = SpdxExpression::parse(&input).unwrap();
        assert_eq!(expr.licenses().len(), 20_000);
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}MIT{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(SpdxExpression::parse(&ok).is_ok());

        let deep = format!("{}MIT{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = SpdxExpression::parse(&deep).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep);
        assert!(err.fragment.starts_with("( ( ("));

        let deep = format!("{}MIT{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(SpdxExpression::parse(&deep).unwrap_err().kind, ParseErrorKind::TooDeep);
    }
}
