use super::{Entry, Fragment};

/// Builder for [`Fragment`] with a fluent API.
///
/// Entries added under [`FragmentBuilder::subject`] share the current subject key.
///
/// # Example
/// ```
/// use implindex::Fragment;
///
/// let f = Fragment::builder("pkgA")
///     .subject("Copy")
///     .implementor("DType", "pkgA::DType")
///     .implementor("Shape", "pkgA::Shape")
///     .build();
///
/// assert_eq!(f.group_name(), "pkgA");
/// assert_eq!(f.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct FragmentBuilder {
    group_name: String,
    subject: String,
    entries: Vec<Entry>,
}

impl FragmentBuilder {
    /// Creates a new builder for the given group.
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            subject: String::new(),
            entries: Vec::new(),
        }
    }

    /// Sets the subject key for subsequent [`implementor`](Self::implementor) calls.
    pub fn subject(mut self, subject_key: impl Into<String>) -> Self {
        self.subject = subject_key.into();
        self
    }

    /// Adds an implementor of the current subject.
    pub fn implementor(
        mut self,
        implementor_label: impl Into<String>,
        implementor_ref: impl Into<String>,
    ) -> Self {
        self.entries.push(Entry::new(
            self.subject.clone(),
            implementor_label,
            implementor_ref,
        ));
        self
    }

    /// Adds a fully specified entry.
    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> Fragment {
        Fragment::new(self.group_name, self.entries)
    }
}

impl Fragment {
    /// Creates a builder for constructing a Fragment with fluent API.
    pub fn builder(group_name: impl Into<String>) -> FragmentBuilder {
        FragmentBuilder::new(group_name)
    }
}
