//! # Registry event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery for
//! observing registry events published on the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Registry ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet
//!                                                                   │
//!                                                      ┌────────────┼────────────┐
//!                                                      ▼            ▼            ▼
//!                                                  LogWriter     Metrics      Custom
//! ```
//!
//! Subscribers observe; they never receive fragments. The single component
//! that receives fragments is the [`Consume`](crate::Consume) implementor.
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use implindex::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct Rejections;
//!
//! #[async_trait]
//! impl Subscribe for Rejections {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::FragmentRejected {
//!             // alert the page owner
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "rejections" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub(crate) use set::panic_message;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
