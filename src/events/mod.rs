//! Registry events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to everything the registry does.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry` (submit/attach/delivery), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: the registry's subscriber listener, which fans out to
//!   `SubscriberSet`, and anything that calls [`Registry::events`](crate::Registry::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
