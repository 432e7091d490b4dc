//! Package atom parsing and matching
//!
//! Four atom shapes are recognised, tried in this order:
//! - `>=category/package-1.0` (version constrained)
//! - `category/package` (basic)
//! - `category/package:slot/subslot` (slotted)
//! - `>=category/package-1.0:slot/subslot::repo` (versioned with slot and
//!   optional repository)
//!
//! The first shape that matches the whole expression wins. Category, package,
//! slot, subslot and repository may all contain `*`/`?` globs.

use crate::glob::GlobPattern;
use crate::version::{Operator, VersionSpec};
use crate::{ConfigError, Package, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

const OPERATOR: &str = r"(<=|>=|=|~|<|>)";
const CATEGORY: &str = r"([\w+.*?-]+)";
const NAME: &str = r"([\w+.*?-]+)";
const VERSION: &str = r"([0-9*][0-9A-Za-z._+*]*(?:-r[0-9]+)?)";

static VERSION_CONSTRAINED: Lazy<Regex> =
    Lazy::new(|| grammar(&format!("^{OPERATOR}{CATEGORY}/{NAME}-{VERSION}$")));
static BASIC: Lazy<Regex> = Lazy::new(|| grammar(&format!("^{CATEGORY}/{NAME}$")));
static SLOTTED: Lazy<Regex> = Lazy::new(|| grammar(&format!(r"^{CATEGORY}/{NAME}:([^\s:]+)$")));
static REPOSITORY_QUALIFIED: Lazy<Regex> = Lazy::new(|| {
    grammar(&format!(
        r"^{OPERATOR}{CATEGORY}/{NAME}-{VERSION}:([^\s:]*)(?:::?([^\s:]+))?$"
    ))
});
static CPV: Lazy<Regex> = Lazy::new(|| grammar(&format!("^{CATEGORY}/{NAME}-{VERSION}$")));

fn grammar(pattern: &str) -> Regex {
    Regex::new(pattern).expect("atom grammar is a valid regex")
}

/// Raw pieces of an expression, as recognised by one grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AtomShape<'a> {
    VersionConstrained {
        operator: &'a str,
        category: &'a str,
        package: &'a str,
        version: &'a str,
    },
    Basic {
        category: &'a str,
        package: &'a str,
    },
    Slotted {
        category: &'a str,
        package: &'a str,
        slot: &'a str,
    },
    RepositoryQualified {
        operator: &'a str,
        category: &'a str,
        package: &'a str,
        version: &'a str,
        slot: &'a str,
        repo: &'a str,
    },
}

type Grammar = fn(&str) -> Option<AtomShape<'_>>;

/// Grammars in priority order
pub(crate) const GRAMMARS: [Grammar; 4] = [
    parse_version_constrained,
    parse_basic,
    parse_slotted,
    parse_repository_qualified,
];

pub(crate) fn parse_version_constrained(expr: &str) -> Option<AtomShape<'_>> {
    let caps = VERSION_CONSTRAINED.captures(expr)?;
    Some(AtomShape::VersionConstrained {
        operator: caps.get(1)?.as_str(),
        category: caps.get(2)?.as_str(),
        package: caps.get(3)?.as_str(),
        version: caps.get(4)?.as_str(),
    })
}

pub(crate) fn parse_basic(expr: &str) -> Option<AtomShape<'_>> {
    let caps = BASIC.captures(expr)?;
    Some(AtomShape::Basic {
        category: caps.get(1)?.as_str(),
        package: caps.get(2)?.as_str(),
    })
}

pub(crate) fn parse_slotted(expr: &str) -> Option<AtomShape<'_>> {
    let caps = SLOTTED.captures(expr)?;
    Some(AtomShape::Slotted {
        category: caps.get(1)?.as_str(),
        package: caps.get(2)?.as_str(),
        slot: caps.get(3)?.as_str(),
    })
}

pub(crate) fn parse_repository_qualified(expr: &str) -> Option<AtomShape<'_>> {
    let caps = REPOSITORY_QUALIFIED.captures(expr)?;
    Some(AtomShape::RepositoryQualified {
        operator: caps.get(1)?.as_str(),
        category: caps.get(2)?.as_str(),
        package: caps.get(3)?.as_str(),
        version: caps.get(4)?.as_str(),
        slot: caps.get(5)?.as_str(),
        repo: caps.get(6).map_or("", |m| m.as_str()),
    })
}

/// Split `category/package-version` into its three parts
pub(crate) fn split_cpv(cpv: &str) -> Option<(&str, &str, &str)> {
    let caps = CPV.captures(cpv)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str()))
}

/// Slot and optional subslot requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPattern {
    /// Slot glob; an empty slot in the expression becomes `*`
    pub slot: GlobPattern,
    /// Subslot glob; `None` accepts any subslot
    pub subslot: Option<GlobPattern>,
}

impl SlotPattern {
    /// Parse `slot` or `slot/subslot`
    pub fn parse(spec: &str) -> Result<Self> {
        let (slot, subslot) = match spec.split_once('/') {
            Some((slot, subslot)) => (slot, subslot),
            None => (spec, ""),
        };

        let slot = if slot.is_empty() {
            GlobPattern::Any
        } else {
            GlobPattern::new(slot)?
        };
        let subslot = if subslot.is_empty() {
            None
        } else {
            Some(GlobPattern::new(subslot)?)
        };

        Ok(Self { slot, subslot })
    }

    pub fn matches(&self, slot: &str, subslot: &str) -> bool {
        self.slot.matches(slot)
            && self
                .subslot
                .as_ref()
                .map_or(true, |pattern| pattern.matches(subslot))
    }
}

impl fmt::Display for SlotPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slot)?;
        if let Some(ref subslot) = self.subslot {
            write!(f, "/{}", subslot)?;
        }
        Ok(())
    }
}

/// What an atom constrains besides its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomKind {
    /// `category/package`
    Basic,
    /// `OP category/package-VERSION`
    VersionConstrained {
        operator: Operator,
        version: VersionSpec,
    },
    /// `category/package:slot[/subslot]`
    Slotted { slot: SlotPattern },
    /// `OP category/package-VERSION:slot[/subslot][::repo]`
    RepositoryQualified {
        operator: Operator,
        version: VersionSpec,
        slot: SlotPattern,
        repo: Option<GlobPattern>,
    },
}

impl AtomKind {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            AtomKind::Basic => "basic",
            AtomKind::VersionConstrained { .. } => "version-constrained",
            AtomKind::Slotted { .. } => "slotted",
            AtomKind::RepositoryQualified { .. } => "repository-qualified",
        }
    }
}

/// A parsed dependency or mask expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageAtom {
    expression: String,
    category: GlobPattern,
    package: GlobPattern,
    kind: AtomKind,
}

impl PackageAtom {
    /// Parse an expression.
    ///
    /// Returns [`ConfigError::InvalidAtom`] when no grammar matches; callers
    /// loading configuration log that and skip the line.
    pub fn parse(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        let shape = GRAMMARS
            .iter()
            .find_map(|grammar| grammar(expression))
            .ok_or_else(|| ConfigError::InvalidAtom(expression.to_string()))?;
        Self::from_shape(expression, shape)
    }

    fn from_shape(expression: &str, shape: AtomShape<'_>) -> Result<Self> {
        let (category, package, kind) = match shape {
            AtomShape::Basic { category, package } => (category, package, AtomKind::Basic),
            AtomShape::VersionConstrained {
                operator,
                category,
                package,
                version,
            } => (
                category,
                package,
                AtomKind::VersionConstrained {
                    operator: operator.parse()?,
                    version: VersionSpec::parse(version),
                },
            ),
            AtomShape::Slotted {
                category,
                package,
                slot,
            } => (
                category,
                package,
                AtomKind::Slotted {
                    slot: SlotPattern::parse(slot)?,
                },
            ),
            AtomShape::RepositoryQualified {
                operator,
                category,
                package,
                version,
                slot,
                repo,
            } => (
                category,
                package,
                AtomKind::RepositoryQualified {
                    operator: operator.parse()?,
                    version: VersionSpec::parse(version),
                    slot: SlotPattern::parse(slot)?,
                    repo: if repo.is_empty() {
                        None
                    } else {
                        Some(GlobPattern::new(repo)?)
                    },
                },
            ),
        };

        Ok(Self {
            expression: expression.to_string(),
            category: GlobPattern::new(category)?,
            package: GlobPattern::new(package)?,
            kind,
        })
    }

    /// The expression this atom was parsed from
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn kind(&self) -> &AtomKind {
        &self.kind
    }

    pub fn category(&self) -> &GlobPattern {
        &self.category
    }

    pub fn package(&self) -> &GlobPattern {
        &self.package
    }

    /// `category/package` as written (globs included)
    pub fn cpn(&self) -> String {
        format!("{}/{}", self.category, self.package)
    }

    /// Whether the category or package name contains a glob
    pub fn has_glob(&self) -> bool {
        !self.category.is_literal() || !self.package.is_literal()
    }

    pub fn operator(&self) -> Option<Operator> {
        match &self.kind {
            AtomKind::VersionConstrained { operator, .. }
            | AtomKind::RepositoryQualified { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<&VersionSpec> {
        match &self.kind {
            AtomKind::VersionConstrained { version, .. }
            | AtomKind::RepositoryQualified { version, .. } => Some(version),
            _ => None,
        }
    }

    pub fn slot(&self) -> Option<&SlotPattern> {
        match &self.kind {
            AtomKind::Slotted { slot } | AtomKind::RepositoryQualified { slot, .. } => Some(slot),
            _ => None,
        }
    }

    pub fn repo(&self) -> Option<&GlobPattern> {
        match &self.kind {
            AtomKind::RepositoryQualified { repo, .. } => repo.as_ref(),
            _ => None,
        }
    }

    /// Test the version, slot and subslot constraints of this atom.
    ///
    /// The category and package name are not looked at: a basic atom is
    /// always true here. Callers either found this atom by its exact name
    /// (see [`AtomIndex`](crate::AtomIndex)) or use
    /// [`matches_package`](Self::matches_package).
    pub fn matches(&self, pkg: &Package) -> bool {
        match &self.kind {
            AtomKind::Basic => true,
            AtomKind::VersionConstrained { operator, version } => {
                version.matches(*operator, &pkg.version)
            }
            AtomKind::Slotted { slot } => slot.matches(&pkg.slot, &pkg.subslot),
            AtomKind::RepositoryQualified {
                operator,
                version,
                slot,
                ..
            } => version.matches(*operator, &pkg.version) && slot.matches(&pkg.slot, &pkg.subslot),
        }
    }

    /// Test the category and package name globs, then [`matches`](Self::matches)
    pub fn matches_package(&self, pkg: &Package) -> bool {
        self.category.matches(&pkg.category) && self.package.matches(&pkg.name) && self.matches(pkg)
    }

    /// Whether packages from `repo` satisfy the repository qualifier
    pub fn matches_repo(&self, repo: &str) -> bool {
        self.repo().map_or(true, |pattern| pattern.matches(repo))
    }
}

impl FromStr for PackageAtom {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
