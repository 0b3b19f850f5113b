//! # Registry events emitted by submission, hand-off and subscribers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Submission events**: a fragment was queued, delivered, replaced or rejected
//! - **Hand-off events**: consumer attached, second attach rejected, consumer gone or panicked
//! - **Subscriber events**: an observer overflowed its queue or panicked
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! `FragmentQueued`, `FragmentReplaced` and `ConsumerAttached` are published
//! under the registry's state lock, so their `seq` order matches the order
//! of the operations. Rejection and delivery events (`FragmentRejected`,
//! `FragmentDelivered`, `ConsumerDropped`, `ConsumerPanicked`) are published
//! outside the lock and may interleave with other callers' events.
//!
//! ## Example
//! ```rust
//! use implindex::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::FragmentRejected)
//!     .with_group("pkgA")
//!     .with_reason("empty subject key");
//!
//! assert_eq!(ev.kind, EventKind::FragmentRejected);
//! assert_eq!(ev.group.as_deref(), Some("pkgA"));
//! assert_eq!(ev.reason.as_deref(), Some("empty subject key"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of registry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Submission events ===
    /// Fragment accepted while buffering (no consumer yet).
    ///
    /// Sets:
    /// - `group`: group name
    /// - `entries`: number of entries in the fragment
    /// - `count`: pending queue length after enqueue
    FragmentQueued,

    /// Fragment handed to the consumer's `on_fragment`.
    ///
    /// Sets:
    /// - `group`: group name
    /// - `consumer`: consumer name
    /// - `entries`: number of entries in the fragment
    FragmentDelivered,

    /// A fragment with the same group name was already registered and has been replaced.
    ///
    /// Sets:
    /// - `group`: group name
    /// - `entries`: number of entries in the new fragment
    FragmentReplaced,

    /// Fragment failed structural validation; registry state unchanged.
    ///
    /// Sets:
    /// - `group`: group name as submitted (may be empty)
    /// - `reason`: validation message
    FragmentRejected,

    // === Hand-off events ===
    /// Consumer attached; the registry is now live.
    ///
    /// Sets:
    /// - `consumer`: consumer name
    /// - `count`: number of queued fragments drained to it
    ConsumerAttached,

    /// A second `attach` was refused.
    ///
    /// Sets:
    /// - `consumer`: name of the refused consumer
    /// - `reason`: name of the consumer that stays attached
    AttachRejected,

    /// The attached consumer was dropped by its owner; the fragment was not delivered.
    ///
    /// Sets:
    /// - `group`: group name of the undelivered fragment
    /// - `consumer`: consumer name
    ConsumerDropped,

    /// The consumer panicked inside `on_fragment`; delivery continues with the next fragment.
    ///
    /// Sets:
    /// - `group`: group name of the fragment being delivered
    /// - `consumer`: consumer name
    /// - `reason`: panic message
    ConsumerPanicked,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `consumer`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `consumer`: subscriber name
    /// - `reason`: `full` or `closed`
    SubscriberOverflow,
}

/// Registry event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Group name of the fragment concerned, if any.
    pub group: Option<Arc<str>>,
    /// Consumer or subscriber name, if any.
    pub consumer: Option<Arc<str>>,
    /// Human-readable reason (validation errors, panic info, overflow cause).
    pub reason: Option<Arc<str>>,
    /// Entry count of the fragment concerned.
    pub entries: Option<u32>,
    /// Kind-specific counter (queue length, drained fragments).
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            group: None,
            consumer: None,
            reason: None,
            entries: None,
            count: None,
        }
    }

    /// Attaches a group name.
    #[inline]
    pub fn with_group(mut self, group: impl Into<Arc<str>>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attaches a consumer or subscriber name.
    #[inline]
    pub fn with_consumer(mut self, consumer: impl Into<Arc<str>>) -> Self {
        self.consumer = Some(consumer.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an entry count (saturating at `u32::MAX`).
    #[inline]
    pub fn with_entries(mut self, n: usize) -> Self {
        self.entries = Some(saturate(n));
        self
    }

    /// Attaches a kind-specific counter (saturating at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(saturate(n));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_consumer(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_consumer(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
