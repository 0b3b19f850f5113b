//! Error types used by the implementor registry.
//!
//! [`RegistryError`] covers everything a caller of the registry can observe:
//! rejected fragments, wiring bugs (a second consumer), and undecodable
//! source files. Variants provide `as_label`/`as_message` helpers for
//! logs and event payloads.

use thiserror::Error;

/// # Errors produced by the registry and the wire decoders.
///
/// None of these leave partial state behind: a rejected call never mutates
/// the registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The fragment does not have the required structural shape.
    #[error("malformed fragment {group:?}: {reason}")]
    MalformedFragment {
        /// Group name as submitted (may be empty).
        group: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A consumer is already attached; the registry accepts exactly one.
    #[error("consumer already attached: {existing}")]
    AlreadyAttached {
        /// Name of the consumer that owns the delivery stream.
        existing: &'static str,
    },

    /// A rustdoc implementors file could not be decoded.
    #[error("invalid implementors source: {reason}")]
    InvalidSource {
        /// Decoder diagnostic.
        reason: String,
    },

    /// `hook::submit` was called before `hook::install`.
    #[cfg(feature = "global-hook")]
    #[error("global registry hook not installed")]
    HookNotInstalled,

    /// `hook::install` was called twice.
    #[cfg(feature = "global-hook")]
    #[error("global registry hook already installed")]
    HookAlreadyInstalled,
}

impl RegistryError {
    pub(crate) fn malformed(group: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::MalformedFragment {
            group: group.into(),
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use implindex::RegistryError;
    ///
    /// let err = RegistryError::AlreadyAttached { existing: "search" };
    /// assert_eq!(err.as_label(), "already_attached");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::MalformedFragment { .. } => "malformed_fragment",
            RegistryError::AlreadyAttached { .. } => "already_attached",
            RegistryError::InvalidSource { .. } => "invalid_source",
            #[cfg(feature = "global-hook")]
            RegistryError::HookNotInstalled => "hook_not_installed",
            #[cfg(feature = "global-hook")]
            RegistryError::HookAlreadyInstalled => "hook_already_installed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::MalformedFragment { group, reason } => {
                format!("group={group:?}: {reason}")
            }
            RegistryError::AlreadyAttached { existing } => {
                format!("consumer {existing:?} already owns delivery")
            }
            RegistryError::InvalidSource { reason } => format!("source: {reason}"),
            #[cfg(feature = "global-hook")]
            RegistryError::HookNotInstalled => "no registry installed".to_string(),
            #[cfg(feature = "global-hook")]
            RegistryError::HookAlreadyInstalled => "registry already installed".to_string(),
        }
    }

    /// True for errors caused by the submitted data rather than wiring.
    ///
    /// # Example
    /// ```
    /// use implindex::RegistryError;
    ///
    /// let err = RegistryError::MalformedFragment { group: String::new(), reason: "empty".into() };
    /// assert!(err.is_data_error());
    /// assert!(!RegistryError::AlreadyAttached { existing: "x" }.is_data_error());
    /// ```
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            RegistryError::MalformedFragment { .. } | RegistryError::InvalidSource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(
            RegistryError::malformed("pkgA", "x").as_label(),
            "malformed_fragment"
        );
        assert_eq!(
            RegistryError::InvalidSource { reason: "x".into() }.as_label(),
            "invalid_source"
        );
    }

    #[test]
    fn test_display_includes_group() {
        let err = RegistryError::malformed("pkgA", "empty subject key");
        assert_eq!(
            err.to_string(),
            "malformed fragment \"pkgA\": empty subject key"
        );
    }
}
