//! # Fragment: one source unit's slice of the index.
//!
//! A [`Fragment`] is produced once by a loader and never mutated afterwards.
//! On submission the registry wraps it in an `Arc` and shares it with the
//! consumer and with snapshots.
//!
//! ## Rules
//! - `group_name` identifies the producing source unit; a later fragment with
//!   the same name replaces the earlier one.
//! - `(subject_key, implementor_ref)` is unique within a fragment.
//! - Empty fragments are legal; they carry no information.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::entry::Entry;
use crate::error::RegistryError;

/// Immutable mapping from a group name to its ordered entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    group_name: String,
    entries: Vec<Entry>,
}

impl Fragment {
    /// Creates a fragment. Structural validation happens at submission.
    pub fn new(group_name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            group_name: group_name.into(),
            entries,
        }
    }

    /// Returns the producing group's name.
    #[inline]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Returns entries in their original order.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns distinct subject keys in order of first appearance.
    pub fn subjects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.subject_key.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Iterates over the entries filed under `subject`.
    pub fn entries_for<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |e| e.subject_key == subject)
    }

    /// Checks the structural shape of the fragment.
    ///
    /// Rejects:
    /// - an empty `group_name`;
    /// - entries with an empty `subject_key` or `implementor_ref`;
    /// - with `strict`, a repeated `(subject_key, implementor_ref)` pair.
    ///
    /// Labels are display metadata and are not inspected.
    pub fn validate(&self, strict: bool) -> Result<(), RegistryError> {
        if self.group_name.is_empty() {
            return Err(RegistryError::malformed("", "empty group name"));
        }

        let mut keys = HashSet::with_capacity(if strict { self.entries.len() } else { 0 });
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.subject_key.is_empty() {
                return Err(RegistryError::malformed(
                    &self.group_name,
                    format!("entry {i}: empty subject key"),
                ));
            }
            if entry.implementor_ref.is_empty() {
                return Err(RegistryError::malformed(
                    &self.group_name,
                    format!("entry {i}: empty implementor ref"),
                ));
            }
            if strict && !keys.insert(entry.key()) {
                return Err(RegistryError::malformed(
                    &self.group_name,
                    format!(
                        "entry {i}: duplicate ({}, {})",
                        entry.subject_key, entry.implementor_ref
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(label: &str, r: &str) -> Entry {
        Entry::new("Copy", label, r)
    }

    #[test]
    fn test_subjects_keep_first_appearance_order() {
        let f = Fragment::new(
            "pkgA",
            vec![
                Entry::new("Send", "A", "pkgA::A"),
                copy("A", "pkgA::A"),
                Entry::new("Send", "B", "pkgA::B"),
            ],
        );
        assert_eq!(f.subjects(), vec!["Send", "Copy"]);
        assert_eq!(f.entries_for("Send").count(), 2);
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let err = Fragment::new("", vec![]).validate(true).unwrap_err();
        assert_eq!(err.as_label(), "malformed_fragment");
    }

    #[test]
    fn test_empty_fragment_is_legal() {
        assert!(Fragment::new("pkgA", vec![]).validate(true).is_ok());
    }

    #[test]
    fn test_duplicate_key_depends_on_strictness() {
        let f = Fragment::new(
            "pkgA",
            vec![copy("DType", "pkgA::DType"), copy("DType2", "pkgA::DType")],
        );
        assert!(f.validate(true).is_err());
        assert!(f.validate(false).is_ok());
    }

    #[test]
    fn test_same_ref_under_different_subjects_is_fine() {
        let f = Fragment::new(
            "pkgA",
            vec![
                copy("DType", "pkgA::DType"),
                Entry::new("Clone", "DType", "pkgA::DType"),
            ],
        );
        assert!(f.validate(true).is_ok());
    }

    #[test]
    fn test_empty_ref_is_rejected() {
        let f = Fragment::new("pkgA", vec![copy("DType", "")]);
        match f.validate(false) {
            Err(RegistryError::MalformedFragment { group, reason }) => {
                assert_eq!(group, "pkgA");
                assert!(reason.contains("implementor ref"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
