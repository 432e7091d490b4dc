//! Mask, unmask and accept-keywords rule collections
//!
//! Rules come from `package.mask`, `package.unmask` and
//! `package.accept_keywords` files (or directories of such files). Each line
//! lands in the cheapest bucket that can represent it:
//!
//! - plain `category/package` lines go into a set
//! - `=category/package-version` lines go into a set of exact versions
//! - everything else is parsed into a [`PackageAtom`] and scanned
//!
//! A [`MaskRuleSet`] is immutable once built. To pick up configuration
//! changes, load a new one and swap it in (see [`RuleStore`](crate::RuleStore)).

use crate::atom::{parse_basic, parse_version_constrained, AtomShape};
use crate::glob::has_glob;
use crate::{Package, PackageAtom};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// A plain `category/package` accept-keywords entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub atom: String,
    /// Space separated keyword tokens (`~amd64`, `*`, `~*`, `**`)
    pub allowed: String,
}

/// An accept-keywords entry whose atom needs full matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexKeywordRule {
    pub atom: PackageAtom,
    pub allowed: String,
}

/// Loaded mask/unmask/accept-keywords rules
#[derive(Debug, Clone, Default)]
pub struct MaskRuleSet {
    masks: HashSet<String>,
    masks_exact_version: HashSet<String>,
    masks_complex: Vec<PackageAtom>,
    unmasks: HashSet<String>,
    unmasks_exact_version: HashSet<String>,
    unmasks_complex: Vec<PackageAtom>,
    accept_keywords: Vec<KeywordRule>,
    accept_keywords_complex: Vec<ComplexKeywordRule>,
}

impl MaskRuleSet {
    /// An empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any mask rule hits `pkg`
    pub fn is_masked(&self, pkg: &Package) -> bool {
        self.masks.contains(&pkg.cpn())
            || self.masks_exact_version.contains(&pkg.cpv())
            || self.masks_complex.iter().any(|atom| atom.matches_package(pkg))
    }

    /// Whether any unmask rule hits `pkg`
    pub fn is_unmasked(&self, pkg: &Package) -> bool {
        self.unmasks.contains(&pkg.cpn())
            || self.unmasks_exact_version.contains(&pkg.cpv())
            || self.unmasks_complex.iter().any(|atom| atom.matches_package(pkg))
    }

    /// Plain accept-keywords entries in load order
    pub fn accept_keywords(&self) -> &[KeywordRule] {
        &self.accept_keywords
    }

    /// Atom-based accept-keywords entries in load order
    pub fn accept_keywords_complex(&self) -> &[ComplexKeywordRule] {
        &self.accept_keywords_complex
    }

    /// Collection sizes
    pub fn stats(&self) -> RuleStats {
        RuleStats {
            masks: self.masks.len(),
            masks_exact_version: self.masks_exact_version.len(),
            masks_complex: self.masks_complex.len(),
            unmasks: self.unmasks.len(),
            unmasks_exact_version: self.unmasks_exact_version.len(),
            unmasks_complex: self.unmasks_complex.len(),
            accept_keywords: self.accept_keywords.len(),
            accept_keywords_complex: self.accept_keywords_complex.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats().total() == 0
    }
}

/// Sizes of each rule collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleStats {
    pub masks: usize,
    pub masks_exact_version: usize,
    pub masks_complex: usize,
    pub unmasks: usize,
    pub unmasks_exact_version: usize,
    pub unmasks_complex: usize,
    pub accept_keywords: usize,
    pub accept_keywords_complex: usize,
}

impl RuleStats {
    pub fn total(&self) -> usize {
        self.masks
            + self.masks_exact_version
            + self.masks_complex
            + self.unmasks
            + self.unmasks_exact_version
            + self.unmasks_complex
            + self.accept_keywords
            + self.accept_keywords_complex
    }
}

impl fmt::Display for RuleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "mask:            {} plain, {} exact, {} complex",
            self.masks, self.masks_exact_version, self.masks_complex
        )?;
        writeln!(
            f,
            "unmask:          {} plain, {} exact, {} complex",
            self.unmasks, self.unmasks_exact_version, self.unmasks_complex
        )?;
        write!(
            f,
            "accept_keywords: {} plain, {} complex",
            self.accept_keywords, self.accept_keywords_complex
        )
    }
}

/// Where a mask line ends up
enum MaskTarget {
    Plain(String),
    ExactVersion(String),
    Complex(PackageAtom),
}

/// Builds a [`MaskRuleSet`] from files and raw text
///
/// Missing or unreadable files contribute nothing; bad lines are logged and
/// skipped.
#[derive(Debug)]
pub struct MaskRuleLoader {
    arch: String,
    rules: MaskRuleSet,
    pub(crate) visited_profiles: HashSet<PathBuf>,
}

impl MaskRuleLoader {
    /// Create a loader for the given host architecture
    ///
    /// The architecture is only used to default bare accept-keywords lines
    /// to `~arch`.
    pub fn new(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            rules: MaskRuleSet::default(),
            visited_profiles: HashSet::new(),
        }
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Load a `package.mask` or `package.unmask` file or directory
    pub fn load_mask_file(&mut self, path: &Path, is_unmask: bool) {
        for (file, content) in read_rule_files(path) {
            debug!("Loading {} rules from {}", mask_kind(is_unmask), file.display());
            self.add_mask_text(&content, is_unmask);
        }
    }

    /// Load a `package.accept_keywords` file or directory
    pub fn load_accept_keywords_file(&mut self, path: &Path) {
        for (file, content) in read_rule_files(path) {
            debug!("Loading accept_keywords rules from {}", file.display());
            self.add_accept_keywords_text(&content);
        }
    }

    /// Add every line of a mask or unmask file
    pub fn add_mask_text(&mut self, content: &str, is_unmask: bool) {
        for line in content.lines() {
            self.add_mask_line(line, is_unmask);
        }
    }

    /// Add one mask or unmask line
    pub fn add_mask_line(&mut self, line: &str, is_unmask: bool) {
        let Some(line) = rule_text(line) else {
            return;
        };

        if let Some(entry) = line.strip_prefix('-') {
            // Only ever drops a plain mask, whichever file the line is in.
            self.remove_plain_mask(entry.trim());
            return;
        }

        let target = match classify_mask(line) {
            Some(target) => target,
            None => return,
        };
        let (plain, exact, complex) = if is_unmask {
            (
                &mut self.rules.unmasks,
                &mut self.rules.unmasks_exact_version,
                &mut self.rules.unmasks_complex,
            )
        } else {
            (
                &mut self.rules.masks,
                &mut self.rules.masks_exact_version,
                &mut self.rules.masks_complex,
            )
        };

        match target {
            MaskTarget::Plain(cpn) => {
                trace!("{} plain: {}", mask_kind(is_unmask), cpn);
                plain.insert(cpn);
            }
            MaskTarget::ExactVersion(cpv) => {
                trace!("{} exact: {}", mask_kind(is_unmask), cpv);
                exact.insert(cpv);
            }
            MaskTarget::Complex(atom) => {
                trace!("{} {}: {}", mask_kind(is_unmask), atom.kind().name(), atom);
                complex.push(atom);
            }
        }
    }

    /// Add every line of an accept-keywords file
    pub fn add_accept_keywords_text(&mut self, content: &str) {
        for line in content.lines() {
            self.add_accept_keywords_line(line);
        }
    }

    /// Add one `atom [keyword...]` line
    ///
    /// A bare atom accepts `~arch` for the loader's architecture.
    pub fn add_accept_keywords_line(&mut self, line: &str) {
        let Some(line) = rule_text(line) else {
            return;
        };

        let (atom, allowed) = match line.split_once(char::is_whitespace) {
            Some((atom, rest)) => (atom, rest.split_whitespace().collect::<Vec<_>>().join(" ")),
            None => (line, format!("~{}", self.arch)),
        };

        if let Some(entry) = atom.strip_prefix('-') {
            self.remove_plain_mask(entry);
            return;
        }

        if !has_glob(atom) && parse_basic(atom).is_some() {
            trace!("accept_keywords plain: {} {}", atom, allowed);
            self.rules.accept_keywords.push(KeywordRule {
                atom: atom.to_string(),
                allowed,
            });
            return;
        }

        match PackageAtom::parse(atom) {
            Ok(atom) => {
                trace!("accept_keywords {}: {} {}", atom.kind().name(), atom, allowed);
                self.rules
                    .accept_keywords_complex
                    .push(ComplexKeywordRule { atom, allowed });
            }
            Err(e) => warn!("Skipping accept_keywords entry: {}", e),
        }
    }

    /// Accept the given keywords for every package (global ACCEPT_KEYWORDS)
    pub fn add_global_accept_keywords(&mut self, keywords: &[String]) {
        if keywords.is_empty() {
            return;
        }
        match PackageAtom::parse("*/*") {
            Ok(atom) => self.rules.accept_keywords_complex.push(ComplexKeywordRule {
                atom,
                allowed: keywords.join(" "),
            }),
            Err(e) => warn!("Skipping global accept_keywords: {}", e),
        }
    }

    fn remove_plain_mask(&mut self, entry: &str) {
        if self.rules.masks.remove(entry) {
            trace!("Removed plain mask {}", entry);
        } else {
            debug!("No plain mask to remove for -{}", entry);
        }
    }

    /// Finish loading
    pub fn finish(self) -> MaskRuleSet {
        self.rules
    }
}

fn mask_kind(is_unmask: bool) -> &'static str {
    if is_unmask {
        "unmask"
    } else {
        "mask"
    }
}

/// Strip comments and whitespace; `None` for lines with no rule.
fn rule_text(line: &str) -> Option<&str> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

fn classify_mask(line: &str) -> Option<MaskTarget> {
    if !has_glob(line) {
        if parse_basic(line).is_some() {
            return Some(MaskTarget::Plain(line.to_string()));
        }
        if let Some(AtomShape::VersionConstrained {
            operator: "=",
            category,
            package,
            version,
        }) = parse_version_constrained(line)
        {
            return Some(MaskTarget::ExactVersion(format!(
                "{}/{}-{}",
                category, package, version
            )));
        }
    }

    match PackageAtom::parse(line) {
        Ok(atom) => Some(MaskTarget::Complex(atom)),
        Err(e) => {
            warn!("Skipping mask entry: {}", e);
            None
        }
    }
}

/// Read `path`, or every regular file below it when it is a directory.
///
/// Directory entries are visited in name order and dotfiles are skipped.
fn read_rule_files(path: &Path) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    collect_rule_files(path, &mut files);
    files
}

fn collect_rule_files(path: &Path, files: &mut Vec<(PathBuf, String)>) {
    if path.is_dir() {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read directory {}: {}", path.display(), e);
                return;
            }
        };

        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|child| {
                child
                    .file_name()
                    .map_or(false, |name| !name.to_string_lossy().starts_with('.'))
            })
            .collect();
        children.sort();

        for child in children {
            collect_rule_files(&child, files);
        }
    } else if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => files.push((path.to_path_buf(), content)),
            Err(e) => warn!("Cannot read {}: {}", path.display(), e),
        }
    } else {
        trace!("No rules at {}", path.display());
    }
}
