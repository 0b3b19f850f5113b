//! # Consumer contract.
//!
//! ## Rules
//! - `on_fragment` is called synchronously from the thread that is draining
//!   the registry's outbox; keep it short.
//! - Deliveries to one consumer never overlap and arrive in submission order.
//! - A replayed or resubmitted group must be handled idempotently: key any
//!   internal index by `(group_name, subject_key, implementor_ref)`.
//! - Calling [`Registry::submit`](crate::Registry::submit) from inside
//!   `on_fragment` is allowed; the nested fragment is delivered after the
//!   current call returns.
//! - Panics are caught and published as `EventKind::ConsumerPanicked`.

use std::sync::Arc;

use crate::fragments::Fragment;

/// Receiver of fragments accepted by the registry.
///
/// The registry holds only a weak reference; the owner keeps the consumer alive.
pub trait Consume: Send + Sync + 'static {
    /// Receives one fragment.
    fn on_fragment(&self, fragment: &Arc<Fragment>);

    /// Returns the consumer name used in events and errors.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
