//! Profile tree loading
//!
//! A profile folder contributes its own `package.mask`, `package.unmask` and
//! `package.accept_keywords`, then every folder listed in its `parent` file
//! (paths relative to the folder). Each folder is loaded at most once, so
//! cyclic or diamond-shaped parent chains terminate.

use crate::MaskRuleLoader;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the file listing parent profiles
pub const PARENT_FILE: &str = "parent";

impl MaskRuleLoader {
    /// Load a profile folder and, recursively, its parents
    pub fn load_profile_folder(&mut self, path: &Path) {
        let folder = match fs::canonicalize(path) {
            Ok(folder) => folder,
            Err(e) => {
                warn!("Cannot resolve profile {}: {}", path.display(), e);
                return;
            }
        };

        if !self.visited_profiles.insert(folder.clone()) {
            debug!("Profile {} already loaded", folder.display());
            return;
        }

        debug!("Loading profile {}", folder.display());
        self.load_mask_file(&folder.join("package.mask"), false);
        self.load_mask_file(&folder.join("package.unmask"), true);
        self.load_accept_keywords_file(&folder.join("package.accept_keywords"));

        for parent in read_parent_file(&folder) {
            self.load_profile_folder(&parent);
        }
    }

    /// Profile folders loaded so far
    pub fn visited_profiles(&self) -> impl Iterator<Item = &Path> {
        self.visited_profiles.iter().map(PathBuf::as_path)
    }
}

/// Parent folders named by `<folder>/parent`, resolved against `folder`
pub fn read_parent_file(folder: &Path) -> Vec<PathBuf> {
    let path = folder.join(PARENT_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| folder.join(line))
        .collect()
}
