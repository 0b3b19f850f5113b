//! # ImplementorIndex: merged "who implements X?" index.
//!
//! Keeps the latest fragment per group and an inverted index
//! `subject → implementor_ref → group → label`. A fragment for a known group
//! first withdraws that group's previous contribution, so replays and
//! resubmissions are idempotent.
//!
//! ## Deduplication
//! One result per `(subject_key, implementor_ref)`. When several groups carry
//! the same pair, the label of the lexicographically smallest group name is
//! used, which makes the result independent of arrival order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::Consume;
use crate::core::Snapshot;
use crate::fragments::{Entry, Fragment};

/// `implementor_ref → group → label`
type Implementors = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Default)]
struct IndexState {
    by_group: BTreeMap<String, Arc<Fragment>>,
    by_subject: BTreeMap<String, Implementors>,
}

impl IndexState {
    fn withdraw(&mut self, fragment: &Fragment) {
        let group = fragment.group_name();
        for entry in fragment.entries() {
            let Some(implementors) = self.by_subject.get_mut(&entry.subject_key) else {
                continue;
            };
            if let Some(groups) = implementors.get_mut(&entry.implementor_ref) {
                groups.remove(group);
                if groups.is_empty() {
                    implementors.remove(&entry.implementor_ref);
                }
            }
            if implementors.is_empty() {
                self.by_subject.remove(&entry.subject_key);
            }
        }
    }

    fn contribute(&mut self, fragment: &Fragment) {
        let group = fragment.group_name();
        for entry in fragment.entries() {
            self.by_subject
                .entry(entry.subject_key.clone())
                .or_default()
                .entry(entry.implementor_ref.clone())
                .or_default()
                .entry(group.to_string())
                .or_insert_with(|| entry.implementor_label.clone());
        }
    }
}

/// Consumer that maintains a merged implementor index.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use implindex::{Consume, Fragment, ImplementorIndex, Registry, RegistryConfig};
///
/// let registry = Registry::new(RegistryConfig::default());
/// registry
///     .submit(Fragment::builder("pkgA").subject("Copy").implementor("DType", "pkgA::DType").build())
///     .unwrap();
///
/// let index = Arc::new(ImplementorIndex::new());
/// let consumer: Arc<dyn Consume> = index.clone();
/// registry.attach(&consumer).unwrap();
///
/// let found = index.implementors_of("Copy");
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].implementor_label, "DType");
/// ```
#[derive(Default)]
pub struct ImplementorIndex {
    state: RwLock<IndexState>,
    received: AtomicU64,
}

impl ImplementorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns deduplicated implementors of `subject`, sorted by label then ref.
    pub fn implementors_of(&self, subject: &str) -> Vec<Entry> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let Some(implementors) = state.by_subject.get(subject) else {
            return Vec::new();
        };

        let mut out: Vec<Entry> = implementors
            .iter()
            .filter_map(|(r, groups)| {
                let (_, label) = groups.iter().next()?;
                Some(Entry::new(subject, label.clone(), r.clone()))
            })
            .collect();
        out.sort_by(|a, b| {
            a.implementor_label
                .cmp(&b.implementor_label)
                .then_with(|| a.implementor_ref.cmp(&b.implementor_ref))
        });
        out
    }

    /// Returns every subject key with at least one implementor, sorted.
    pub fn subjects(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_subject.keys().cloned().collect()
    }

    /// Returns the group names currently indexed, sorted.
    pub fn groups(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_group.keys().cloned().collect()
    }

    /// Copies the indexed fragments into a [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot::from_map(state.by_group.clone())
    }

    /// Total number of `on_fragment` calls, replays included.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

impl Consume for ImplementorIndex {
    fn on_fragment(&self, fragment: &Arc<Fragment>) {
        self.received.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = state
            .by_group
            .insert(fragment.group_name().to_string(), Arc::clone(fragment))
        {
            state.withdraw(&prev);
        }
        state.contribute(fragment);
    }

    fn name(&self) -> &'static str {
        "implementor-index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(group: &str, items: &[(&str, &str, &str)]) -> Arc<Fragment> {
        Arc::new(Fragment::new(
            group,
            items
                .iter()
                .map(|(s, l, r)| Entry::new(*s, *l, *r))
                .collect(),
        ))
    }

    #[test]
    fn test_merges_groups_by_subject() {
        let index = ImplementorIndex::new();
        index.on_fragment(&frag("pkgA", &[("Copy", "DType", "pkgA::DType")]));
        index.on_fragment(&frag("pkgB", &[("Copy", "Offloading", "pkgB::Offloading")]));

        let labels: Vec<_> = index
            .implementors_of("Copy")
            .into_iter()
            .map(|e| e.implementor_label)
            .collect();
        assert_eq!(labels, vec!["DType", "Offloading"]);
        assert_eq!(index.groups(), vec!["pkgA", "pkgB"]);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let index = ImplementorIndex::new();
        let f = frag("pkgA", &[("Copy", "DType", "pkgA::DType")]);
        index.on_fragment(&f);
        index.on_fragment(&f);

        assert_eq!(index.implementors_of("Copy").len(), 1);
        assert_eq!(index.received(), 2);
    }

    #[test]
    fn test_resubmission_withdraws_previous_entries() {
        let index = ImplementorIndex::new();
        index.on_fragment(&frag(
            "pkgA",
            &[("Copy", "DType", "pkgA::DType"), ("Send", "DType", "pkgA::DType")],
        ));
        index.on_fragment(&frag("pkgA", &[("Copy", "Shape", "pkgA::Shape")]));

        assert!(index.implementors_of("Send").is_empty());
        assert_eq!(index.subjects(), vec!["Copy"]);
        let copy = index.implementors_of("Copy");
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[0].implementor_ref, "pkgA::Shape");
    }

    #[test]
    fn test_duplicate_pair_across_groups_is_deduplicated() {
        let index = ImplementorIndex::new();
        index.on_fragment(&frag("zeta", &[("Copy", "Reexported", "core::X")]));
        index.on_fragment(&frag("alpha", &[("Copy", "X", "core::X")]));

        let copy = index.implementors_of("Copy");
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[0].implementor_label, "X");
    }

    #[test]
    fn test_unknown_subject_is_empty() {
        assert!(ImplementorIndex::new().implementors_of("Copy").is_empty());
    }
}
