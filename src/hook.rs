//! # Process-wide registry entry point.
//!
//! For loaders that cannot be handed a [`Submitter`](crate::Submitter), one
//! registry can be installed globally. Installation happens once per process;
//! fragments submitted before installation are refused, not queued.
//!
//! ```
//! use implindex::{Fragment, Registry, RegistryConfig, hook};
//!
//! let registry = Registry::new(RegistryConfig::default());
//! hook::install(registry.clone()).unwrap();
//!
//! hook::submit(Fragment::new("pkgA", vec![])).unwrap();
//! assert!(registry.snapshot().contains("pkgA"));
//! ```

use std::sync::{Arc, OnceLock};

use crate::core::Registry;
use crate::error::RegistryError;
use crate::fragments::Fragment;

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Installs `registry` as the process-wide registry.
///
/// # Errors
/// [`RegistryError::HookAlreadyInstalled`] if a registry was installed before.
pub fn install(registry: Arc<Registry>) -> Result<(), RegistryError> {
    GLOBAL
        .set(registry)
        .map_err(|_| RegistryError::HookAlreadyInstalled)
}

/// The installed registry, if any.
pub fn installed() -> Option<&'static Arc<Registry>> {
    GLOBAL.get()
}

/// Submits `fragment` to the installed registry.
///
/// # Errors
/// [`RegistryError::HookNotInstalled`] before [`install`]; otherwise whatever
/// [`Registry::submit`] returns.
pub fn submit(fragment: impl Into<Arc<Fragment>>) -> Result<(), RegistryError> {
    GLOBAL
        .get()
        .ok_or(RegistryError::HookNotInstalled)?
        .submit(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RegistryConfig;

    // Single test: the hook is process-global and tests share the process.
    #[test]
    fn test_install_once_then_submit() {
        assert!(installed().is_none());
        assert_eq!(
            submit(Fragment::new("early", vec![])),
            Err(RegistryError::HookNotInstalled)
        );

        let registry = Registry::new(RegistryConfig::default());
        install(Arc::clone(&registry)).unwrap();
        assert_eq!(
            install(Registry::new(RegistryConfig::default())),
            Err(RegistryError::HookAlreadyInstalled)
        );

        submit(Fragment::new("pkgA", vec![])).unwrap();
        assert_eq!(registry.groups(), vec!["pkgA".to_string()]);
        assert!(!registry.snapshot().contains("early"));
    }
}
