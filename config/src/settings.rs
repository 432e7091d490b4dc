//! Engine settings
//!
//! Settings come from an optional TOML file, then environment variables, then
//! whatever the caller overrides on top:
//!
//! ```toml
//! arch = "amd64"
//! config_root = "/"
//! profile = "/var/db/repos/gentoo/profiles/default/linux/amd64/23.0"
//! accept_keywords = ["~amd64"]
//! ```

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable names read by [`EngineSettings::apply_env`]
pub mod env_vars {
    /// Configuration root override
    pub const CONFIG_ROOT: &str = "PORTMASK_CONFIG_ROOT";
    /// Host architecture override
    pub const ARCH: &str = "PORTMASK_ARCH";
    /// Portage compatibility variables
    pub const PORTAGE_CONFIGROOT: &str = "PORTAGE_CONFIGROOT";
    pub const PORTAGE_ARCH: &str = "ARCH";
}

/// Where rules come from and which architecture they apply to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Host architecture keyword (e.g., "amd64")
    pub arch: String,
    /// Root under which `etc/portage` is looked up
    pub config_root: PathBuf,
    /// Explicit profile folder; `etc/portage/make.profile` when unset
    pub profile: Option<PathBuf>,
    /// Keywords accepted for every package (ACCEPT_KEYWORDS)
    pub accept_keywords: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            arch: detect_arch(),
            config_root: PathBuf::from("/"),
            profile: None,
            accept_keywords: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(root) =
            non_empty(env_vars::CONFIG_ROOT).or_else(|| non_empty(env_vars::PORTAGE_CONFIGROOT))
        {
            self.config_root = PathBuf::from(root);
        }
        if let Some(arch) = non_empty(env_vars::ARCH).or_else(|| non_empty(env_vars::PORTAGE_ARCH))
        {
            self.arch = arch;
        }
    }

    /// Check the settings for obvious mistakes
    pub fn validate(&self) -> Result<()> {
        let arch = self.arch.as_str();
        if arch.is_empty() {
            return Err(ConfigError::InvalidKeyword(
                "architecture must not be empty".to_string(),
            ));
        }
        if arch.chars().any(char::is_whitespace) || arch.starts_with(['~', '-']) {
            return Err(ConfigError::InvalidKeyword(arch.to_string()));
        }
        for keyword in &self.accept_keywords {
            if keyword.is_empty() || keyword.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidKeyword(keyword.clone()));
            }
        }
        if self.config_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "config_root must not be empty".to_string(),
            ));
        }
        if matches!(&self.profile, Some(profile) if profile.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("profile must not be empty".to_string()));
        }
        Ok(())
    }

    /// `<config_root>/etc/portage`
    pub fn portage_dir(&self) -> PathBuf {
        self.config_root.join("etc/portage")
    }
}

/// Detect the current architecture
fn detect_arch() -> String {
    #[cfg(target_arch = "x86_64")]
    return "amd64".to_string();

    #[cfg(target_arch = "aarch64")]
    return "arm64".to_string();

    #[cfg(target_arch = "x86")]
    return "x86".to_string();

    #[cfg(target_arch = "arm")]
    return "arm".to_string();

    #[cfg(target_arch = "riscv64")]
    return "riscv".to_string();

    #[cfg(target_arch = "powerpc64")]
    return "ppc64".to_string();

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "aarch64",
        target_arch = "x86",
        target_arch = "arm",
        target_arch = "riscv64",
        target_arch = "powerpc64"
    )))]
    return "unknown".to_string();
}
