//! Glob matching for atom names, slots and repositories
//!
//! Patterns use `*` (any run) and `?` (any character). Exact and prefix
//! patterns are by far the most common and are checked without a regex.

use crate::{ConfigError, Result};
use regex::Regex;
use std::fmt;

/// Whether `s` contains a glob character
pub fn has_glob(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Match `value` against a glob `pattern`.
///
/// Prefer [`GlobPattern`] when the same pattern is tested repeatedly.
pub fn glob_match(pattern: &str, value: &str) -> bool {
    match GlobPattern::new(pattern) {
        Ok(glob) => glob.matches(value),
        Err(e) => {
            tracing::warn!("{}", e);
            false
        }
    }
}

/// A glob pattern compiled into its cheapest matching form
#[derive(Debug, Clone)]
pub enum GlobPattern {
    /// `*`
    Any,
    /// No wildcard at all
    Exact(String),
    /// A single trailing `*` (the pattern is stored with the star)
    Prefix(String),
    /// Anything else, translated to an anchored regex
    Regex { pattern: String, regex: Regex },
}

impl GlobPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern == "*" {
            return Ok(GlobPattern::Any);
        }
        if !has_glob(pattern) {
            return Ok(GlobPattern::Exact(pattern.to_string()));
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            if !has_glob(prefix) {
                return Ok(GlobPattern::Prefix(pattern.to_string()));
            }
        }

        let regex = Regex::new(&glob_to_regex(pattern)).map_err(|source| {
            ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(GlobPattern::Regex {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern text
    pub fn as_str(&self) -> &str {
        match self {
            GlobPattern::Any => "*",
            GlobPattern::Exact(s) | GlobPattern::Prefix(s) => s,
            GlobPattern::Regex { pattern, .. } => pattern,
        }
    }

    /// Whether the pattern has no wildcard
    pub fn is_literal(&self) -> bool {
        matches!(self, GlobPattern::Exact(_))
    }

    /// Test a value
    pub fn matches(&self, value: &str) -> bool {
        match self {
            GlobPattern::Any => true,
            GlobPattern::Exact(s) => s == value,
            GlobPattern::Prefix(s) => value.starts_with(&s[..s.len() - 1]),
            GlobPattern::Regex { regex, .. } => regex.is_match(value),
        }
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for GlobPattern {}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_fast_paths() {
        assert!(glob_match("foo*", "foobar"));
        assert!(glob_match("foo*bar", "foo-x-bar"));
        assert!(glob_match("foo", "foo"));
        assert!(!glob_match("foo", "foobar"));
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
    }

    #[test]
    fn test_pattern_tiers() {
        assert!(matches!(GlobPattern::new("*").unwrap(), GlobPattern::Any));
        assert!(matches!(GlobPattern::new("dev-lang").unwrap(), GlobPattern::Exact(_)));
        assert!(matches!(GlobPattern::new("dev-*").unwrap(), GlobPattern::Prefix(_)));
        assert!(matches!(GlobPattern::new("*-lang").unwrap(), GlobPattern::Regex { .. }));
        assert!(matches!(GlobPattern::new("py?hon").unwrap(), GlobPattern::Regex { .. }));
        assert!(matches!(GlobPattern::new("a*b*").unwrap(), GlobPattern::Regex { .. }));
    }

    #[test]
    fn test_regex_path() {
        let glob = GlobPattern::new("*-lang").unwrap();
        assert!(glob.matches("dev-lang"));
        assert!(!glob.matches("dev-langs"));

        let glob = GlobPattern::new("py?hon").unwrap();
        assert!(glob.matches("python"));
        assert!(!glob.matches("pyhon"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(glob_match("gtk+*", "gtk+-3"));
        assert!(glob_match("*.so", "libfoo.so"));
        assert!(!glob_match("*.so", "libfooxso"));
        assert!(glob_match("a(b)*c", "a(b)xc"));
    }

    #[test]
    fn test_pattern_roundtrips_text() {
        for p in ["*", "dev-lang", "dev-*", "*-lang"] {
            assert_eq!(GlobPattern::new(p).unwrap().as_str(), p);
        }
        assert!(GlobPattern::new("x").unwrap().is_literal());
        assert!(!GlobPattern::new("x*").unwrap().is_literal());
    }
}
