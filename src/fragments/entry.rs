use serde::{Deserialize, Serialize};

/// One (capability, implementor) relationship record.
///
/// Serializes to the wire shape
/// `{ "subjectKey": .., "implementorLabel": .., "implementorRef": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Capability the implementor belongs to (e.g. `Copy`).
    pub subject_key: String,
    /// Human-readable identity of the concrete type.
    pub implementor_label: String,
    /// Locator unique within the owning group (e.g. `pkgA::DType`).
    pub implementor_ref: String,
}

/// Deduplication key of an [`Entry`]: `(subject_key, implementor_ref)`.
pub type EntryKey<'a> = (&'a str, &'a str);

impl Entry {
    /// Creates a new entry.
    pub fn new(
        subject_key: impl Into<String>,
        implementor_label: impl Into<String>,
        implementor_ref: impl Into<String>,
    ) -> Self {
        Self {
            subject_key: subject_key.into(),
            implementor_label: implementor_label.into(),
            implementor_ref: implementor_ref.into(),
        }
    }

    /// Returns the deduplication key.
    #[inline]
    pub fn key(&self) -> EntryKey<'_> {
        (&self.subject_key, &self.implementor_ref)
    }
}
