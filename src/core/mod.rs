//! Registry core: storage, hand-off and wiring.
//!
//! The public API from this module is [`Registry`] (with its [`Submitter`]
//! handle and [`RegistryBuilder`]), [`RegistryConfig`] and [`Snapshot`].
//!
//! Internal modules:
//! - [`handoff`]: the Buffering → Live state machine and delivery outbox;
//! - [`registry`]: locking, validation, delivery and event publishing;
//! - [`snapshot`]: detached copies of the group map and merged lookups;
//! - [`builder`]: construction with event subscribers.

mod builder;
mod config;
mod handoff;
mod registry;
mod snapshot;

pub use builder::RegistryBuilder;
pub use config::RegistryConfig;
pub use registry::{Registry, Submitter};
pub use snapshot::Snapshot;
