//! Package visibility resolution
//!
//! Combines mask/unmask rules with a package's KEYWORDS and the host
//! architecture:
//!
//! 1. any mask rule sets the hard mask bit
//! 2. any unmask rule clears it again
//! 3. a stable keyword for the host arch returns right away
//! 4. plain accept-keywords entries for `category/package` may accept it
//! 5. atom-based accept-keywords entries may accept it
//! 6. otherwise the keywords decide between testing, broken and unsupported
//!
//! The hard mask bit is independent of the keyword bits and both can be set.

use crate::{MaskRuleSet, Package};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use tracing::trace;

/// Visibility classification bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskFlags(u8);

impl MaskFlags {
    pub const NOT_MASKED: MaskFlags = MaskFlags(0);
    /// Masked by package.mask and not unmasked
    pub const HARD_MASK: MaskFlags = MaskFlags(1);
    /// Only keyworded `~arch`
    pub const TESTING_MASK: MaskFlags = MaskFlags(2);
    /// No keyword for this arch at all
    pub const UNSUPPORTED_MASK: MaskFlags = MaskFlags(4);
    /// Keyworded `-arch` or `-*`
    pub const BROKEN_MASK: MaskFlags = MaskFlags(8);

    pub fn from_bits(bits: u8) -> Self {
        MaskFlags(bits & 0b1111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub fn contains(&self, other: MaskFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// No bit set
    pub fn is_visible(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MaskFlags {
    type Output = MaskFlags;

    fn bitor(self, rhs: MaskFlags) -> MaskFlags {
        MaskFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MaskFlags {
    fn bitor_assign(&mut self, rhs: MaskFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MaskFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_visible() {
            return f.write_str("visible");
        }
        let names = [
            (MaskFlags::HARD_MASK, "hard"),
            (MaskFlags::TESTING_MASK, "testing"),
            (MaskFlags::UNSUPPORTED_MASK, "unsupported"),
            (MaskFlags::BROKEN_MASK, "broken"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&set.join(","))
    }
}

/// Answers visibility queries against one rule set and architecture
#[derive(Debug, Clone)]
pub struct VisibilityResolver<'a> {
    rules: &'a MaskRuleSet,
    arch: String,
    testing: String,
    broken: String,
}

impl<'a> VisibilityResolver<'a> {
    pub fn new(rules: &'a MaskRuleSet, arch: impl Into<String>) -> Self {
        let arch = arch.into();
        Self {
            rules,
            testing: format!("~{}", arch),
            broken: format!("-{}", arch),
            arch,
        }
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Classify `pkg`, using its `keywords`
    pub fn is_masked(&self, pkg: &Package) -> MaskFlags {
        let mut result = if self.rules.is_masked(pkg) {
            MaskFlags::HARD_MASK
        } else {
            MaskFlags::NOT_MASKED
        };
        if result.contains(MaskFlags::HARD_MASK) && self.rules.is_unmasked(pkg) {
            trace!("{} unmasked", pkg);
            result = MaskFlags::NOT_MASKED;
        }

        let keywords = pkg.keyword_list();
        if keywords.contains(&self.arch.as_str()) {
            return result;
        }

        let cpn = pkg.cpn();
        for rule in self.rules.accept_keywords() {
            if rule.atom == cpn && self.accepts(&rule.allowed, &keywords) {
                trace!("{} accepted by {} {}", pkg, rule.atom, rule.allowed);
                return result;
            }
        }

        for rule in self.rules.accept_keywords_complex() {
            if rule.atom.matches_package(pkg) && self.accepts(&rule.allowed, &keywords) {
                trace!("{} accepted by {} {}", pkg, rule.atom, rule.allowed);
                return result;
            }
        }

        if keywords.contains(&self.testing.as_str()) {
            result |= MaskFlags::TESTING_MASK;
        } else if keywords.contains(&self.broken.as_str()) || keywords.contains(&"-*") {
            result |= MaskFlags::BROKEN_MASK;
        } else {
            result |= MaskFlags::UNSUPPORTED_MASK;
        }
        result
    }

    /// Shorthand for `is_masked(pkg).is_visible()`
    pub fn is_visible(&self, pkg: &Package) -> bool {
        self.is_masked(pkg).is_visible()
    }

    /// Whether an allowed-keywords list accepts a package's keywords
    fn accepts(&self, allowed: &str, keywords: &[&str]) -> bool {
        if allowed.trim().is_empty() {
            return keywords.contains(&self.testing.as_str());
        }

        allowed.split_whitespace().any(|token| match token {
            "**" => true,
            "*" => keywords
                .iter()
                .any(|k| !k.is_empty() && !k.starts_with('~') && !k.starts_with('-')),
            "~*" => keywords.iter().any(|k| k.starts_with('~')),
            literal => keywords.contains(&literal),
        })
    }
}
