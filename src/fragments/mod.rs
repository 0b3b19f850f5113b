//! # Index data: entries and fragments.
//!
//! This module provides the pure-data side of the index:
//! - [`Entry`] - one (subject, implementor) relationship
//! - [`Fragment`] - one source unit's immutable contribution
//! - [`FragmentBuilder`] - fluent construction for loaders
//!
//! Nothing here has behavior beyond construction, lookup and structural
//! validation; aggregation lives in [`Registry`](crate::Registry).

mod builder;
mod entry;
mod fragment;

pub use builder::FragmentBuilder;
pub use entry::{Entry, EntryKey};
pub use fragment::Fragment;
