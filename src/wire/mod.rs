//! # Wire decoding of fragments.
//!
//! Two input shapes are understood:
//! - [`json`]: the canonical fragment object
//!   `{ "groupName": .., "entries": [ { "subjectKey", "implementorLabel", "implementorRef" } ] }`
//!   (or an array of them);
//! - [`rustdoc`]: the `trait.impl/**/trait.*.js` implementors file emitted by
//!   rustdoc, one fragment per crate.
//!
//! Decoders only produce [`Fragment`](crate::Fragment)s; structural
//! validation still happens in [`Registry::submit`](crate::Registry::submit).

pub mod json;
pub mod rustdoc;

pub use json::fragments_from_json;
pub use rustdoc::fragments_from_rustdoc;
