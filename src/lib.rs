//! # implindex
//!
//! **implindex** aggregates "who implements what" index fragments that arrive
//! in arbitrary order from independently loaded sources, and hands them to a
//! single consumer that may attach late.
//!
//! Every loader contributes one [`Fragment`] per group (typically a crate);
//! fragments that arrive before the consumer are queued and replayed in
//! submission order when it attaches, later ones are delivered directly.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Loader A   │   │   Loader B   │   │ rustdoc .js  │
//!     │  (Submitter) │   │  (Submitter) │   │  (wire)      │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ submit           ▼ submit           ▼ submit_all
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry                                                         │
//! │  - by_group (last fragment per group wins)                        │
//! │  - Handoff (Buffering ──attach──► Live, pending queue, outbox)    │
//! │  - Bus (broadcast events)                                         │
//! └──────┬───────────────────────────────────────────────────┬────────┘
//!        ▼ on_fragment (one drainer at a time)               │ publish
//!     ┌──────────────────┐                                   ▼
//!     │ Consume          │                   ┌──────────────────────────┐
//!     │ (ImplementorIndex│                   │  Bus (broadcast channel) │
//!     │  or custom)      │                   └────────────┬─────────────┘
//!     └──────────────────┘                                ▼
//!                                              subscriber listener
//!                                                         ▼
//!                                                  SubscriberSet
//!                                               ┌─────────┼─────────┐
//!                                               ▼         ▼         ▼
//!                                            worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Buffering:  submit(f) ──► by_group[f.group] = f ──► pending.push(f) ──► FragmentQueued
//! attach(c):  pending ──► outbox (atomically) ──► Live ──► ConsumerAttached
//!             drainer: outbox.pop() ──► c.on_fragment(f) ──► FragmentDelivered
//! Live:       submit(f) ──► by_group[f.group] = f ──► outbox.push(f) ──► drainer
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Registry**      | Accept, replace and hand off fragments.                      | [`Registry`], [`Submitter`], [`Snapshot`] |
//! | **Consumers**     | Receive every accepted fragment exactly once per submission. | [`Consume`], [`ImplementorIndex`]         |
//! | **Fragments**     | Per-group implementor records.                               | [`Fragment`], [`Entry`], [`FragmentBuilder`] |
//! | **Wire**          | Decode JSON fragments and rustdoc implementors files.        | [`wire`]                                  |
//! | **Subscriber API**| Observe registry activity (logging, metrics).                | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed errors for rejected calls.                             | [`RegistryError`]                         |
//! | **Configuration** | Bus sizing and validation strictness.                        | [`RegistryConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//! - `global-hook`: exposes [`hook`], a process-wide registry entry point.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use implindex::{Consume, Fragment, ImplementorIndex, Registry, RegistryConfig};
//!
//! let registry = Registry::new(RegistryConfig::default());
//! let loader = registry.submitter();
//!
//! // Fragments may arrive before the consumer exists.
//! loader
//!     .submit(
//!         Fragment::builder("pkgB")
//!             .subject("Copy")
//!             .implementor("Offloading", "pkgB::Offloading")
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let index = Arc::new(ImplementorIndex::new());
//! let consumer: Arc<dyn Consume> = index.clone();
//! registry.attach(&consumer).unwrap();
//!
//! loader
//!     .submit(
//!         Fragment::builder("pkgA")
//!             .subject("Copy")
//!             .implementor("DType", "pkgA::DType")
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let labels: Vec<_> = index
//!     .implementors_of("Copy")
//!     .into_iter()
//!     .map(|e| e.implementor_label)
//!     .collect();
//! assert_eq!(labels, ["DType", "Offloading"]);
//! ```
mod consumers;
mod core;
mod error;
mod events;
mod fragments;
mod subscribers;

pub mod wire;

// ---- Public re-exports ----

pub use consumers::{Consume, ImplementorIndex};
pub use crate::core::{Registry, RegistryBuilder, RegistryConfig, Snapshot, Submitter};
pub use error::RegistryError;
pub use events::{Bus, Event, EventKind};
pub use fragments::{Entry, EntryKey, Fragment, FragmentBuilder};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

// Optional: process-wide registry for loaders without a handle.
// Enable with: `--features global-hook`
#[cfg(feature = "global-hook")]
pub mod hook;
