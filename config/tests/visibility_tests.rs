//! End-to-end visibility scenarios against an on-disk configuration

use portmask_config::{
    ConfigLoader, EngineSettings, MaskFlags, Package, PackageAtom, VersionSpec,
    VisibilityResolver,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("path has a parent")).expect("Failed to create dir");
    fs::write(path, content).expect("Failed to write file");
}

/// A config root with a small profile and some local overrides
fn create_test_root() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path();

    write(root, "profiles/base/package.mask", ">=dev-lang/python-3.13\nsys-apps/broken\n");
    write(root, "profiles/amd64/parent", "../base\n");
    write(root, "profiles/amd64/package.accept_keywords", "dev-util/profile-tool\n");
    write(root, "etc/portage/make.profile/parent", "../../../profiles/amd64\n");

    write(root, "etc/portage/package.unmask", "=dev-lang/python-3.13.0\n");
    write(
        root,
        "etc/portage/package.accept_keywords",
        "dev-lang/rust\n\
         app-misc/anything **\n\
         >=dev-lang/zig-0.12 ~amd64\n\
         dev-libs/*:0 ~*\n",
    );

    temp
}

fn settings_for(root: &Path) -> EngineSettings {
    EngineSettings {
        arch: "amd64".to_string(),
        config_root: root.to_path_buf(),
        profile: None,
        accept_keywords: Vec::new(),
    }
}

fn pkg(cpv: &str, keywords: &str) -> Package {
    Package::parse_cpv(cpv)
        .expect("valid cpv")
        .with_keywords(keywords)
}

#[test]
fn test_scenarios() {
    let temp = create_test_root();
    let rules = ConfigLoader::new(settings_for(temp.path())).load();
    let resolver = VisibilityResolver::new(&rules, "amd64");

    let cases = [
        ("dev-lang/python-3.12.1", "amd64", MaskFlags::NOT_MASKED),
        ("dev-lang/python-3.13.1", "amd64", MaskFlags::HARD_MASK),
        ("dev-lang/python-3.13.0", "amd64", MaskFlags::NOT_MASKED),
        (
            "dev-lang/python-3.14.0_alpha1",
            "~amd64",
            MaskFlags::HARD_MASK | MaskFlags::TESTING_MASK,
        ),
        ("sys-apps/broken-1", "-amd64", MaskFlags::HARD_MASK | MaskFlags::BROKEN_MASK),
        ("dev-lang/rust-1.80.0", "~amd64", MaskFlags::NOT_MASKED),
        ("dev-lang/rust-1.80.0", "~arm64", MaskFlags::UNSUPPORTED_MASK),
        ("app-misc/anything-1", "", MaskFlags::NOT_MASKED),
        ("dev-lang/zig-0.13.0", "~amd64", MaskFlags::NOT_MASKED),
        ("dev-lang/zig-0.11.0", "~amd64", MaskFlags::TESTING_MASK),
        ("dev-libs/libfoo-1", "~riscv", MaskFlags::NOT_MASKED),
        ("dev-util/profile-tool-2", "~amd64", MaskFlags::NOT_MASKED),
        ("dev-util/other-2", "~amd64", MaskFlags::TESTING_MASK),
        ("app-misc/gone-1", "-*", MaskFlags::BROKEN_MASK),
    ];

    let results: Vec<(&str, MaskFlags)> = cases
        .iter()
        .map(|(cpv, keywords, _)| (*cpv, resolver.is_masked(&pkg(cpv, keywords))))
        .collect();
    let expected: Vec<(&str, MaskFlags)> =
        cases.iter().map(|(cpv, _, flags)| (*cpv, *flags)).collect();
    assert_eq!(results, expected);
}

#[test]
fn test_slot_restricted_accept_keywords() {
    let temp = create_test_root();
    let rules = ConfigLoader::new(settings_for(temp.path())).load();
    let resolver = VisibilityResolver::new(&rules, "amd64");

    let slotted = pkg("dev-libs/libfoo-2", "~riscv").with_slot("2");
    assert_eq!(resolver.is_masked(&slotted), MaskFlags::UNSUPPORTED_MASK);
}

#[test]
fn test_global_accept_keywords() {
    let temp = create_test_root();
    let mut settings = settings_for(temp.path());
    settings.accept_keywords = vec!["~amd64".to_string()];
    let rules = ConfigLoader::new(settings).load();
    let resolver = VisibilityResolver::new(&rules, "amd64");

    assert!(resolver.is_visible(&pkg("dev-util/other-2", "~amd64")));
    assert_eq!(
        resolver.is_masked(&pkg("dev-util/other-2", "~x86")),
        MaskFlags::UNSUPPORTED_MASK
    );
    assert_eq!(
        resolver.is_masked(&pkg("dev-lang/python-3.13.5", "~amd64")),
        MaskFlags::HARD_MASK
    );
}

#[test]
fn test_documented_examples() {
    let rc = VersionSpec::parse("1.4.2_rc1-r2");
    let release = VersionSpec::parse("1.4.2-r0");
    assert!(release.match_op("<", &rc));

    let atom = PackageAtom::parse(">=dev-lang/python-3.10:3.10").expect("valid atom");
    let python = Package::new("dev-lang", "python", "3.11.4").with_slot("3.10");
    assert!(atom.matches(&python));
    assert!(atom.matches_package(&python));
}
