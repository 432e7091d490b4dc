//! Atom lookup index
//!
//! Atoms with a literal `category/package` are found by key; atoms with a
//! glob in either part are kept aside and scanned linearly.

use crate::{Package, PackageAtom, Result};
use indexmap::IndexMap;

/// Atoms tagged with caller-chosen identifiers
#[derive(Debug, Clone)]
pub struct AtomIndex<T> {
    literal: IndexMap<String, Vec<(T, PackageAtom)>>,
    globbed: Vec<(T, PackageAtom)>,
}

impl<T> Default for AtomIndex<T> {
    fn default() -> Self {
        Self {
            literal: IndexMap::new(),
            globbed: Vec::new(),
        }
    }
}

impl<T: Clone> AtomIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `expression` and file it under `id`.
    ///
    /// An unparseable expression is returned as an error and not stored.
    pub fn append_atom(&mut self, id: T, expression: &str) -> Result<()> {
        let atom = PackageAtom::parse(expression)?;
        self.insert(id, atom);
        Ok(())
    }

    /// File an already parsed atom under `id`
    pub fn insert(&mut self, id: T, atom: PackageAtom) {
        if atom.has_glob() {
            self.globbed.push((id, atom));
        } else {
            self.literal.entry(atom.cpn()).or_default().push((id, atom));
        }
    }

    /// Identifiers of every atom matching `pkg`, literal entries first
    pub fn find_matches(&self, pkg: &Package) -> Vec<T> {
        let mut found = Vec::new();

        if let Some(candidates) = self.literal.get(&pkg.cpn()) {
            found.extend(
                candidates
                    .iter()
                    .filter(|(_, atom)| atom.matches(pkg))
                    .map(|(id, _)| id.clone()),
            );
        }

        found.extend(
            self.globbed
                .iter()
                .filter(|(_, atom)| {
                    atom.category().matches(&pkg.category)
                        && atom.package().matches(&pkg.name)
                        && atom.matches(pkg)
                })
                .map(|(id, _)| id.clone()),
        );

        found
    }

    /// Total number of atoms
    pub fn len(&self) -> usize {
        self.literal.values().map(Vec::len).sum::<usize>() + self.globbed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literal.is_empty() && self.globbed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;

    fn index(entries: &[(u32, &str)]) -> AtomIndex<u32> {
        let mut index = AtomIndex::new();
        for (id, expr) in entries {
            index.append_atom(*id, expr).unwrap();
        }
        index
    }

    #[test]
    fn test_literal_lookup() {
        let index = index(&[
            (1, "dev-lang/python"),
            (2, ">=dev-lang/python-3.12"),
            (3, "dev-lang/rust"),
        ]);
        assert_eq!(index.len(), 3);

        let pkg = Package::new("dev-lang", "python", "3.11.4");
        assert_eq!(index.find_matches(&pkg), vec![1]);

        let pkg = Package::new("dev-lang", "python", "3.12.1");
        assert_eq!(index.find_matches(&pkg), vec![1, 2]);
    }

    #[test]
    fn test_glob_scan() {
        let index = index(&[
            (1, "*/python"),
            (2, "dev-lang/py*:3.1?"),
            (3, "dev-lang/python"),
            (4, "sys-*/*"),
        ]);

        let pkg = Package::new("dev-lang", "python", "3.12.1").with_slot("3.12");
        assert_eq!(index.find_matches(&pkg), vec![3, 1, 2]);

        let pkg = Package::new("sys-apps", "portage", "3.0.60");
        assert_eq!(index.find_matches(&pkg), vec![4]);
    }

    #[test]
    fn test_no_match() {
        let index = index(&[(1, "dev-lang/python")]);
        assert!(index
            .find_matches(&Package::new("dev-lang", "perl", "5.38"))
            .is_empty());
    }

    #[test]
    fn test_invalid_expression_is_rejected() {
        let mut index = AtomIndex::new();
        assert!(matches!(
            index.append_atom("x", "not an atom"),
            Err(ConfigError::InvalidAtom(_))
        ));
        assert!(index.is_empty());
    }
}
