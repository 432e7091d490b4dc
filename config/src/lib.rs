//! Portage-style package masking engine
//!
//! This crate answers three questions about packages, following the rules of
//! Gentoo's Portage:
//!
//! - how two version strings compare
//! - whether a package satisfies a dependency atom
//! - whether a package version is visible on the host architecture, given
//!   its KEYWORDS and the administrator's mask configuration
//!
//! # Overview
//!
//! - [`version`]: Version tokenization, normalization and comparison
//! - [`glob`]: `*`/`?` wildcard matching
//! - [`atom`]: Dependency atom parsing and matching
//! - [`index`]: Fast atom lookup by `category/package`
//! - [`package`]: Facts about one package version
//! - [`rules`]: package.mask / package.unmask / package.accept_keywords rules
//! - [`profile`]: Profile tree traversal
//! - [`visibility`]: Visibility resolution
//! - [`store`]: Atomic rule-set replacement
//! - [`settings`]: Engine settings
//! - [`loader`]: Loading a rule set from a configuration root
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use portmask_config::{ConfigLoader, EngineSettings, Package, VisibilityResolver};
//!
//! let settings = EngineSettings::default();
//! let rules = ConfigLoader::new(settings.clone()).load();
//!
//! let pkg = Package::parse_cpv("dev-lang/python-3.12.1")
//!     .unwrap()
//!     .with_slot("3.12")
//!     .with_keywords("~amd64 ~arm64");
//!
//! let resolver = VisibilityResolver::new(&rules, settings.arch.as_str());
//! println!("{}: {}", pkg, resolver.is_masked(&pkg));
//! ```
//!
//! # Matching atoms
//!
//! ```rust
//! use portmask_config::{Package, PackageAtom, VersionSpec};
//! use std::cmp::Ordering;
//!
//! let atom = PackageAtom::parse(">=dev-lang/python-3.10:3.*").unwrap();
//! let pkg = Package::new("dev-lang", "python", "3.11.4").with_slot("3.11");
//! assert!(atom.matches(&pkg));
//!
//! let rc = VersionSpec::parse("1.0_rc1");
//! assert_eq!(rc.compare(&VersionSpec::parse("1.0")), Ordering::Less);
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! <config_root>/etc/portage/
//! ├── make.profile -> ...          # Profile folder (with parent chain)
//! ├── package.mask                 # File or directory
//! ├── package.unmask
//! ├── package.accept_keywords
//! └── package.keywords             # Legacy name for accept_keywords
//! ```

pub mod atom;
pub mod error;
pub mod glob;
pub mod index;
pub mod loader;
pub mod package;
pub mod profile;
pub mod rules;
pub mod settings;
pub mod store;
pub mod version;
pub mod visibility;

// Re-exports for convenience
pub use atom::{AtomKind, PackageAtom, SlotPattern};
pub use error::{ConfigError, Result};
pub use glob::{glob_match, GlobPattern};
pub use index::AtomIndex;
pub use loader::ConfigLoader;
pub use package::Package;
pub use rules::{ComplexKeywordRule, KeywordRule, MaskRuleLoader, MaskRuleSet, RuleStats};
pub use settings::{env_vars, EngineSettings};
pub use store::RuleStore;
pub use version::{Operator, VersionSpec, MAXVX};
pub use visibility::{MaskFlags, VisibilityResolver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AtomIndex, ConfigError, ConfigLoader, EngineSettings, MaskFlags, MaskRuleSet, Operator,
        Package, PackageAtom, Result, RuleStore, VersionSpec, VisibilityResolver,
    };
}
