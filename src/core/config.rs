//! # Registry configuration.
//!
//! Provides [`RegistryConfig`], the settings a [`Registry`](crate::Registry) is built with.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → treated as 1 (a broadcast channel needs room for one event)
//! - `subscriber_queue_capacity = 0` → treated as 1

/// Configuration for a registry instance.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `strict_entries`: reject fragments repeating a `(subject_key, implementor_ref)` pair
/// - `subscriber_queue_capacity`: queue size for subscribers that keep the default
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Enforce uniqueness of `(subject_key, implementor_ref)` within a fragment.
    ///
    /// - `true`: a repeated pair makes the fragment malformed
    /// - `false`: the fragment is accepted as-is; merged views keep the first occurrence
    pub strict_entries: bool,

    /// Default per-subscriber queue capacity.
    ///
    /// Used for subscribers whose `queue_capacity()` is not overridden.
    pub subscriber_queue_capacity: usize,
}

impl RegistryConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the default subscriber queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn subscriber_queue_clamped(&self) -> usize {
        self.subscriber_queue_capacity.max(1)
    }
}

impl Default for RegistryConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `strict_entries = true`
    /// - `subscriber_queue_capacity = 1024`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            strict_entries: true,
            subscriber_queue_capacity: 1024,
        }
    }
}
