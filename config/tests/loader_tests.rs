//! Tests for loading rules from configuration roots and profile trees

use portmask_config::{
    ConfigLoader, EngineSettings, KeywordRule, MaskRuleLoader, Package, RuleStore,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `content` to `root/relative`, creating parent directories
fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("path has a parent")).expect("Failed to create dir");
    fs::write(&path, content).expect("Failed to write file");
    path
}

fn settings_for(root: &Path) -> EngineSettings {
    EngineSettings {
        arch: "amd64".to_string(),
        config_root: root.to_path_buf(),
        profile: None,
        accept_keywords: Vec::new(),
    }
}

fn pkg(cpv: &str) -> Package {
    Package::parse_cpv(cpv).expect("valid cpv")
}

mod rule_files {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mask_directory_in_name_order() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "package.mask/10-base", "dev-lang/python\n");
        write(temp.path(), "package.mask/20-local", "-dev-lang/python\n>=sys-apps/systemd-255\n");
        write(temp.path(), "package.mask/.hidden", "app-misc/hidden\n");
        write(temp.path(), "package.mask/nested/30-more", "=dev-lang/rust-1.75.0\n");

        let mut loader = MaskRuleLoader::new("amd64");
        loader.load_mask_file(&temp.path().join("package.mask"), false);
        let rules = loader.finish();

        let stats = rules.stats();
        assert_eq!(stats.masks, 0);
        assert_eq!(stats.masks_exact_version, 1);
        assert_eq!(stats.masks_complex, 1);
        assert!(!rules.is_masked(&pkg("app-misc/hidden-1")));
        assert!(rules.is_masked(&pkg("dev-lang/rust-1.75.0")));
        assert!(rules.is_masked(&pkg("sys-apps/systemd-256")));
    }

    #[test]
    fn test_single_file_accept_keywords() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = write(
            temp.path(),
            "package.accept_keywords",
            "# testing\ndev-lang/rust\ndev-lang/go ~amd64 ~arm64\n",
        );

        let mut loader = MaskRuleLoader::new("amd64");
        loader.load_accept_keywords_file(&path);
        let rules = loader.finish();

        assert_eq!(
            rules.accept_keywords().to_vec(),
            vec![
                KeywordRule {
                    atom: "dev-lang/rust".to_string(),
                    allowed: "~amd64".to_string(),
                },
                KeywordRule {
                    atom: "dev-lang/go".to_string(),
                    allowed: "~amd64 ~arm64".to_string(),
                },
            ]
        );
    }
}

mod profiles {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parent_chain() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "base/package.mask", "dev-lang/python\n");
        write(temp.path(), "base/package.accept_keywords", "dev-lang/zig\n");
        write(temp.path(), "desktop/package.unmask", "dev-lang/python\n");
        write(temp.path(), "desktop/parent", "# comment\n../base\n");

        let mut loader = MaskRuleLoader::new("amd64");
        loader.load_profile_folder(&temp.path().join("desktop"));
        assert_eq!(loader.visited_profiles().count(), 2);

        let rules = loader.finish();
        let python = pkg("dev-lang/python-3.12");
        assert!(rules.is_masked(&python));
        assert!(rules.is_unmasked(&python));
        assert_eq!(rules.accept_keywords().len(), 1);
    }

    #[test]
    fn test_cycle_terminates_without_duplicates() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "a/package.mask", ">=cat/a-1\n");
        write(temp.path(), "a/parent", "../b\n");
        write(temp.path(), "b/package.mask", ">=cat/b-1\n");
        write(temp.path(), "b/parent", "../a\n");

        let mut loader = MaskRuleLoader::new("amd64");
        loader.load_profile_folder(&temp.path().join("a"));
        assert_eq!(loader.visited_profiles().count(), 2);

        let rules = loader.finish();
        assert_eq!(rules.stats().masks_complex, 2);
        assert!(rules.is_masked(&pkg("cat/a-1")));
        assert!(rules.is_masked(&pkg("cat/b-2")));
    }

    #[test]
    fn test_diamond_loads_shared_parent_once() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "top/parent", "../left\n../right\n");
        write(temp.path(), "left/parent", "../shared\n");
        write(temp.path(), "right/parent", "../shared/.\n");
        write(temp.path(), "shared/package.mask", ">=cat/shared-2\n");

        let mut loader = MaskRuleLoader::new("amd64");
        loader.load_profile_folder(&temp.path().join("top"));
        assert_eq!(loader.visited_profiles().count(), 4);
        assert_eq!(loader.finish().stats().masks_complex, 1);
    }

    #[test]
    fn test_missing_parent_is_skipped() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "child/package.mask", "cat/child\n");
        write(temp.path(), "child/parent", "../does-not-exist\n");

        let mut loader = MaskRuleLoader::new("amd64");
        loader.load_profile_folder(&temp.path().join("child"));
        assert_eq!(loader.visited_profiles().count(), 1);
        assert!(loader.finish().is_masked(&pkg("cat/child-1")));
    }
}

mod config_loader {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_root_loads_nothing() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let loader = ConfigLoader::new(settings_for(&temp.path().join("nope")));
        assert!(loader.profile_path().is_none());
        assert!(loader.load().is_empty());
    }

    #[test]
    fn test_profile_before_user_files() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "profiles/base/package.mask", "dev-lang/python\ndev-lang/perl\n");
        write(temp.path(), "etc/portage/make.profile/parent", "../../../profiles/base\n");
        write(temp.path(), "etc/portage/package.mask", "-dev-lang/python\n");
        write(temp.path(), "etc/portage/package.unmask", "=dev-lang/perl-5.38\n");

        let rules = ConfigLoader::new(settings_for(temp.path())).load();
        assert!(!rules.is_masked(&pkg("dev-lang/python-3.12")));
        assert!(rules.is_masked(&pkg("dev-lang/perl-5.38")));
        assert!(rules.is_unmasked(&pkg("dev-lang/perl-5.38")));
        assert!(!rules.is_unmasked(&pkg("dev-lang/perl-5.40")));
    }

    #[test]
    fn test_legacy_keywords_and_global_list() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "etc/portage/package.accept_keywords/rust", "dev-lang/rust\n");
        write(temp.path(), "etc/portage/package.keywords", "dev-lang/go ~amd64\n");

        let mut settings = settings_for(temp.path());
        settings.accept_keywords = vec!["~amd64".to_string()];
        let rules = ConfigLoader::new(settings).load();

        let atoms: Vec<&str> = rules
            .accept_keywords()
            .iter()
            .map(|rule| rule.atom.as_str())
            .collect();
        assert_eq!(atoms, vec!["dev-lang/rust", "dev-lang/go"]);

        let complex = rules.accept_keywords_complex();
        assert_eq!(complex.len(), 1);
        assert_eq!(complex[0].atom.expression(), "*/*");
        assert_eq!(complex[0].allowed, "~amd64");
    }

    #[test]
    fn test_explicit_profile_wins() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "etc/portage/make.profile/package.mask", "cat/linked\n");
        write(temp.path(), "custom/package.mask", "cat/custom\n");

        let mut settings = settings_for(temp.path());
        settings.profile = Some(temp.path().join("custom"));
        let loader = ConfigLoader::new(settings);
        assert_eq!(loader.profile_path(), Some(temp.path().join("custom")));

        let rules = loader.load();
        assert!(rules.is_masked(&pkg("cat/custom-1")));
        assert!(!rules.is_masked(&pkg("cat/linked-1")));
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_make_profile_symlink() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "repo/profiles/amd64/package.mask", "cat/from-profile\n");
        fs::create_dir_all(temp.path().join("etc/portage")).expect("Failed to create dir");
        std::os::unix::fs::symlink(
            "../../repo/profiles/amd64",
            temp.path().join("etc/portage/make.profile"),
        )
        .expect("Failed to create symlink");

        let loader = ConfigLoader::new(settings_for(temp.path()));
        assert_eq!(
            loader.profile_path(),
            Some(temp.path().join("etc/portage/../../repo/profiles/amd64"))
        );
        assert!(loader.load().is_masked(&pkg("cat/from-profile-1")));
    }

    #[test]
    fn test_store_reload() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let loader = ConfigLoader::new(settings_for(temp.path()));
        let store = RuleStore::new(loader.load());
        assert!(store.snapshot().is_empty());

        write(temp.path(), "etc/portage/package.mask", "dev-lang/python\n");
        let previous = store.reload(&loader);
        assert!(previous.is_empty());
        assert!(store.snapshot().is_masked(&pkg("dev-lang/python-3.12")));
    }
}
