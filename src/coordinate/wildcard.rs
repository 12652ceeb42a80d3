//! Wildcard patterns used by selectors and identity matching.
//!
//! `*` matches any (possibly empty) run of characters; every other character,
//! regex metacharacters included, matches itself. Matching is anchored at
//! both ends and case-sensitive. Surrounding whitespace in the pattern is
//! ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Patterns compiled by [`matches_str`], keyed by the raw pattern
static COMPILED: Lazy<Mutex<HashMap<String, WildcardPattern>>> = Lazy::new(Default::default);

/// The cache is flushed once it holds this many patterns
const COMPILED_CAPACITY: usize = 1024;

/// A compiled wildcard pattern
#[derive(Clone)]
pub struct WildcardPattern {
    raw: String,
    /// `None` for star-free patterns, or if the regex exceeded the engine's
    /// size limits; both match by plain equality
    regex: Option<Regex>,
}

impl WildcardPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        if !raw.contains('*') {
            return Self { raw, regex: None };
        }
        let regex = match Regex::new(&to_regex(&raw)) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Wildcard '{}' not compilable, matching literally: {}", raw, e);
                None
            }
        };
        Self { raw, regex }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a candidate value; an absent candidate is matched as `""`
    pub fn is_match(&self, candidate: Option<&str>) -> bool {
        let candidate = candidate.unwrap_or("");
        match &self.regex {
            Some(re) => re.is_match(candidate),
            None => self.raw.trim() == candidate,
        }
    }
}

/// Match with an optional pattern: no pattern matches anything
pub fn matches(pattern: Option<&WildcardPattern>, candidate: Option<&str>) -> bool {
    pattern.map_or(true, |p| p.is_match(candidate))
}

/// Variant for patterns held as plain strings.
///
/// Star-free patterns compare literally; the rest are compiled once and
/// kept in a process-wide cache.
pub fn matches_str(pattern: Option<&str>, candidate: Option<&str>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    if !pattern.contains('*') {
        return pattern.trim() == candidate.unwrap_or("");
    }
    let Ok(mut compiled) = COMPILED.lock() else {
        return WildcardPattern::new(pattern).is_match(candidate);
    };
    if let Some(p) = compiled.get(pattern) {
        return p.is_match(candidate);
    }
    if compiled.len() >= COMPILED_CAPACITY {
        compiled.clear();
    }
    let p = WildcardPattern::new(pattern);
    let hit = p.is_match(candidate);
    compiled.insert(pattern.to_string(), p);
    hit
}

fn to_regex(pattern: &str) -> String {
    let body: Vec<String> = pattern.trim().split('*').map(regex::escape).collect();
    format!("^(?:{})$", body.join(".*?"))
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for WildcardPattern {}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WildcardPattern").field(&self.raw).finish()
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for WildcardPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

impl Serialize for WildcardPattern {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for WildcardPattern {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_any_run() {
        let p = WildcardPattern::new("foo-*.jar");
        assert!(p.is_match(Some("foo-1.2.3.jar")));
        assert!(p.is_match(Some("foo-.jar")));
        assert!(!p.is_match(Some("bar-1.2.3.jar")));
    }

    #[test]
    fn test_dot_is_literal() {
        let p = WildcardPattern::new("org.example");
        assert!(p.is_match(Some("org.example")));
        assert!(!p.is_match(Some("orgXexample")));
    }

    #[test]
    fn test_other_metacharacters_are_literal() {
        let p = WildcardPattern::new("lib[1](x)+?.so");
        assert!(p.is_match(Some("lib[1](x)+?.so")));
        assert!(!p.is_match(Some("lib1x.so")));
    }

    #[test]
    fn test_anchored_and_case_sensitive() {
        let p = WildcardPattern::new("core");
        assert!(!p.is_match(Some("commons-core")));
        assert!(!p.is_match(Some("Core")));
    }

    #[test]
    fn test_absent_candidate() {
        assert!(matches(None, None));
        assert!(matches(None, Some("anything")));
        assert!(WildcardPattern::new("*").is_match(None));
        assert!(!WildcardPattern::new("foo").is_match(None));
    }

    #[test]
    fn test_pattern_is_trimmed() {
        assert!(matches_str(Some("  junit "), Some("junit")));
    }

    #[test]
    fn test_plain_string_patterns_are_cached() {
        assert!(matches_str(Some("jetty-*-cached"), Some("jetty-util-cached")));
        assert!(!matches_str(Some("jetty-*-cached"), Some("netty-util-cached")));
        assert!(COMPILED.lock().unwrap().contains_key("jetty-*-cached"));

        assert!(matches_str(Some("org.example"), Some("org.example")));
        assert!(!matches_str(Some("org.example"), Some("orgXexample")));
        assert!(!COMPILED.lock().unwrap().contains_key("org.example"));
    }

    #[test]
    fn test_star_free_pattern_skips_regex() {
        let p = WildcardPattern::new("a.b");
        assert!(p.regex.is_none());
        assert!(p.is_match(Some("a.b")));
        assert!(!p.is_match(Some("aXb")));
        assert!(WildcardPattern::new("a*").regex.is_some());
    }
}
