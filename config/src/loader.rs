//! Configuration loading
//!
//! Turns an [`EngineSettings`] into a [`MaskRuleSet`] by reading, in order:
//!
//! 1. the profile tree (explicit `profile`, else `etc/portage/make.profile`)
//! 2. `etc/portage/package.mask` and `etc/portage/package.unmask`
//! 3. `etc/portage/package.accept_keywords` and the legacy `package.keywords`
//! 4. the global `accept_keywords` list
//!
//! Anything missing contributes no rules.

use crate::{EngineSettings, MaskRuleLoader, MaskRuleSet};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Name of the profile link inside `etc/portage`
pub const MAKE_PROFILE: &str = "make.profile";

/// Loads rule sets for one set of engine settings
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
}

impl ConfigLoader {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The profile folder to load, if any
    ///
    /// A relative `make.profile` symlink target is resolved against
    /// `etc/portage`.
    pub fn profile_path(&self) -> Option<PathBuf> {
        if let Some(profile) = &self.settings.profile {
            return Some(profile.clone());
        }

        let portage_dir = self.settings.portage_dir();
        let link = portage_dir.join(MAKE_PROFILE);
        match fs::read_link(&link) {
            Ok(target) if target.is_absolute() => Some(target),
            Ok(target) => Some(portage_dir.join(target)),
            Err(_) if link.is_dir() => Some(link),
            Err(_) => {
                debug!("No profile at {}", link.display());
                None
            }
        }
    }

    /// Build a rule set from everything the settings point at
    pub fn load(&self) -> MaskRuleSet {
        let mut loader = MaskRuleLoader::new(self.settings.arch.clone());

        if let Some(profile) = self.profile_path() {
            loader.load_profile_folder(&profile);
        }

        let portage_dir = self.settings.portage_dir();
        loader.load_mask_file(&portage_dir.join("package.mask"), false);
        loader.load_mask_file(&portage_dir.join("package.unmask"), true);
        loader.load_accept_keywords_file(&portage_dir.join("package.accept_keywords"));
        loader.load_accept_keywords_file(&portage_dir.join("package.keywords"));
        loader.add_global_accept_keywords(&self.settings.accept_keywords);

        let profiles = loader.visited_profiles().count();
        let rules = loader.finish();
        info!(
            "Loaded {} rules from {} ({} profile folders)",
            rules.stats().total(),
            portage_dir.display(),
            profiles
        );
        rules
    }
}
