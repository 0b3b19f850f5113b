//! Canonical JSON fragment shape.
//!
//! # Example
//! ```
//! use implindex::Fragment;
//!
//! let f: Fragment = r#"{
//!     "groupName": "pkgA",
//!     "entries": [
//!         { "subjectKey": "Copy", "implementorLabel": "DType", "implementorRef": "pkgA::DType" }
//!     ]
//! }"#
//! .parse()
//! .unwrap();
//!
//! assert_eq!(f.group_name(), "pkgA");
//! assert_eq!(f.entries()[0].implementor_ref, "pkgA::DType");
//! ```

use std::str::FromStr;

use serde_json::Value;

use crate::error::RegistryError;
use crate::fragments::Fragment;

impl Fragment {
    /// Decodes one fragment object.
    ///
    /// # Errors
    /// [`RegistryError::MalformedFragment`] for invalid JSON, a missing
    /// `groupName`, or an `entries` value that is not an array of entries.
    pub fn from_json(input: &str) -> Result<Self, RegistryError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| RegistryError::malformed("", e.to_string()))?;
        fragment_from_value(value)
    }

    /// Encodes the fragment in the canonical wire shape.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        serde_json::to_string(self)
            .map_err(|e| RegistryError::malformed(self.group_name(), e.to_string()))
    }
}

impl FromStr for Fragment {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fragment::from_json(s)
    }
}

/// Decodes either a single fragment object or an array of them.
///
/// # Errors
/// The first fragment that fails to decode aborts the whole batch.
pub fn fragments_from_json(input: &str) -> Result<Vec<Fragment>, RegistryError> {
    let value: Value =
        serde_json::from_str(input).map_err(|e| RegistryError::malformed("", e.to_string()))?;
    match value {
        Value::Array(items) => items.into_iter().map(fragment_from_value).collect(),
        other => Ok(vec![fragment_from_value(other)?]),
    }
}

fn fragment_from_value(value: Value) -> Result<Fragment, RegistryError> {
    let group = value
        .get("groupName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    serde_json::from_value(value).map_err(|e| RegistryError::malformed(group, e.to_string()))
}
