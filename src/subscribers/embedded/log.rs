//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [queued] group="pkgA" entries=1 pending=1
//! [replaced] group="pkgA" entries=3
//! [attached] consumer="implementor-index" drained=2
//! [delivered] group="pkgB" consumer="implementor-index" entries=1
//! [rejected] group="" reason="empty group name"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let group = e.group.as_deref().unwrap_or("");
        let consumer = e.consumer.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");
        let entries = e.entries.unwrap_or(0);
        let count = e.count.unwrap_or(0);

        match e.kind {
            EventKind::FragmentQueued => {
                println!("[queued] group={group:?} entries={entries} pending={count}");
            }
            EventKind::FragmentDelivered => {
                println!("[delivered] group={group:?} consumer={consumer:?} entries={entries}");
            }
            EventKind::FragmentReplaced => {
                println!("[replaced] group={group:?} entries={entries}");
            }
            EventKind::FragmentRejected => {
                println!("[rejected] group={group:?} reason={reason:?}");
            }
            EventKind::ConsumerAttached => {
                println!("[attached] consumer={consumer:?} drained={count}");
            }
            EventKind::AttachRejected => {
                println!("[attach-rejected] consumer={consumer:?} existing={reason:?}");
            }
            EventKind::ConsumerDropped => {
                println!("[consumer-dropped] group={group:?} consumer={consumer:?}");
            }
            EventKind::ConsumerPanicked => {
                println!("[consumer-panicked] group={group:?} consumer={consumer:?} info={reason}");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={consumer} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={consumer} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
