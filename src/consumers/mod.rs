//! # Fragment consumers.
//!
//! A consumer is the single late-attaching component (search engine, page
//! renderer) that receives every fragment the registry accepts.
//!
//! ## Architecture
//! ```text
//! Registry::attach(&consumer)
//!     ├─► drain pending (submission order) ──► consumer.on_fragment()
//!     └─► Live: Registry::submit ─────────────► consumer.on_fragment()
//! ```
//!
//! ## Contents
//! - [`Consume`] - the consumer contract
//! - [`ImplementorIndex`] - built-in consumer maintaining a merged,
//!   deduplicated implementor index

mod consume;
mod index;

pub use consume::Consume;
pub use index::ImplementorIndex;
