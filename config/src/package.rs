//! Facts about one concrete package version
//!
//! The surrounding application discovers these however it likes and hands
//! them to atom matching and visibility resolution.

use crate::atom::split_cpv;
use crate::version::VersionSpec;
use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_slot() -> String {
    "0".to_string()
}

/// A package instance under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package category (e.g., "dev-lang")
    pub category: String,
    /// Package name (e.g., "python")
    pub name: String,
    /// Slot, `"0"` unless the ebuild says otherwise
    #[serde(default = "default_slot")]
    pub slot: String,
    /// Subslot, empty when unset
    #[serde(default)]
    pub subslot: String,
    /// Version including revision
    pub version: VersionSpec,
    /// Space separated KEYWORDS (e.g., "amd64 ~arm64 -x86")
    #[serde(default)]
    pub keywords: String,
}

impl Package {
    /// Create a package in slot `0` with no keywords
    pub fn new(category: impl Into<String>, name: impl Into<String>, version: &str) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            slot: default_slot(),
            subslot: String::new(),
            version: VersionSpec::parse(version),
            keywords: String::new(),
        }
    }

    /// Parse `category/name-version[-rN]`
    pub fn parse_cpv(cpv: &str) -> Result<Self> {
        let cpv = cpv.trim();
        let (category, name, version) =
            split_cpv(cpv).ok_or_else(|| ConfigError::InvalidVersion(cpv.to_string()))?;
        Ok(Self::new(category, name, version))
    }

    /// Set the slot; `slot/subslot` sets both
    pub fn with_slot(mut self, slot: &str) -> Self {
        match slot.split_once('/') {
            Some((slot, subslot)) => {
                self.slot = slot.to_string();
                self.subslot = subslot.to_string();
            }
            None => self.slot = slot.to_string(),
        }
        self
    }

    /// Set the subslot
    pub fn with_subslot(mut self, subslot: impl Into<String>) -> Self {
        self.subslot = subslot.into();
        self
    }

    /// Set the keyword string
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// `category/name`
    pub fn cpn(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// `category/name-version`
    pub fn cpv(&self) -> String {
        format!("{}/{}-{}", self.category, self.name, self.version)
    }

    /// Individual keywords
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords.split_whitespace().collect()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cpv(), self.slot)?;
        if !self.subslot.is_empty() {
            write!(f, "/{}", self.subslot)?;
        }
        Ok(())
    }
}
