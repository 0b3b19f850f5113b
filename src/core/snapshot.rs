//! # Point-in-time copy of the registry's group map.
//!
//! A [`Snapshot`] owns its own map; fragments are shared through `Arc` but are
//! immutable, so nothing done to a snapshot can reach back into the registry.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::fragments::{Entry, Fragment};

/// Copy of `group_name → Fragment` taken at call time, ordered by group name.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    groups: BTreeMap<String, Arc<Fragment>>,
}

impl Snapshot {
    pub(crate) fn from_map(groups: BTreeMap<String, Arc<Fragment>>) -> Self {
        Self { groups }
    }

    #[inline]
    pub fn get(&self, group: &str) -> Option<&Arc<Fragment>> {
        self.groups.get(group)
    }

    #[inline]
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Group names, sorted.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Fragments in group-name order.
    pub fn fragments(&self) -> impl Iterator<Item = &Arc<Fragment>> {
        self.groups.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total entries across all groups, before deduplication.
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(|f| f.len()).sum()
    }

    /// All subject keys present in any group, sorted.
    pub fn subjects(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .groups
            .values()
            .flat_map(|f| f.entries().iter().map(|e| e.subject_key.as_str()))
            .collect();
        set.into_iter().collect()
    }

    /// Merged implementors of `subject` across all groups.
    ///
    /// One entry per `implementor_ref`; groups are visited in name order and
    /// the first occurrence wins, so the result does not depend on the order
    /// fragments were submitted in. Sorted by label, then ref.
    pub fn implementors_of(&self, subject: &str) -> Vec<Entry> {
        let mut seen = HashSet::new();
        let mut out: Vec<Entry> = self
            .groups
            .values()
            .flat_map(|f| f.entries_for(subject))
            .filter(|e| seen.insert(e.implementor_ref.as_str()))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.implementor_label
                .cmp(&b.implementor_label)
                .then_with(|| a.implementor_ref.cmp(&b.implementor_ref))
        });
        out
    }

    /// Releases the underlying map.
    pub fn into_map(self) -> BTreeMap<String, Arc<Fragment>> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(fragments: Vec<Fragment>) -> Snapshot {
        Snapshot::from_map(
            fragments
                .into_iter()
                .map(|f| (f.group_name().to_string(), Arc::new(f)))
                .collect(),
        )
    }

    #[test]
    fn test_implementors_deduplicate_by_ref() {
        let s = snap(vec![
            Fragment::builder("b")
                .subject("Copy")
                .implementor("Alias", "core::X")
                .build(),
            Fragment::builder("a")
                .subject("Copy")
                .implementor("X", "core::X")
                .implementor("Y", "a::Y")
                .build(),
        ]);

        let found = s.implementors_of("Copy");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].implementor_label, "X");
        assert_eq!(found[1].implementor_label, "Y");
        assert_eq!(s.entry_count(), 3);
    }

    #[test]
    fn test_into_map_is_detached() {
        let s = snap(vec![Fragment::new("a", vec![])]);
        let mut map = s.clone().into_map();
        map.clear();
        assert!(s.contains("a"));
    }

    #[test]
    fn test_subjects_sorted_and_unique() {
        let s = snap(vec![
            Fragment::builder("a").subject("Send").implementor("A", "a::A").build(),
            Fragment::builder("b").subject("Copy").implementor("B", "b::B").build(),
            Fragment::builder("c").subject("Send").implementor("C", "c::C").build(),
        ]);
        assert_eq!(s.subjects(), vec!["Copy", "Send"]);
    }
}
