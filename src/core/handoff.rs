//! # Hand-off state machine between loaders and the consumer.
//!
//! ```text
//!            submit ──► pending.push_back
//!   ┌───────────────┐
//!   │   Buffering   │
//!   └───────┬───────┘
//!           │ attach (once): pending ──► outbox, keep order
//!           ▼
//!   ┌───────────────┐
//!   │     Live      │  submit ──► outbox.push_back
//!   └───────────────┘  (terminal)
//! ```
//!
//! ## Rules
//! - The machine is pure state; the caller holds the lock around every call.
//! - `attach` moves the whole pending queue into the outbox in one step, so
//!   any submit ordered after it lands behind the drained fragments.
//! - Exactly one caller drains the outbox at a time (`claim_drain`); others
//!   only enqueue. This keeps per-consumer delivery ordered and non-overlapping.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use crate::consumers::Consume;
use crate::fragments::Fragment;

/// Where an admitted fragment went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Buffered; `pending` is the queue length afterwards.
    Queued { pending: usize },
    /// Placed in the outbox for the attached consumer.
    Forwarded,
}

enum Phase {
    Buffering {
        pending: VecDeque<Arc<Fragment>>,
    },
    Live {
        consumer: Weak<dyn Consume>,
        name: &'static str,
    },
}

/// One unit of work for the drainer.
pub(crate) struct Delivery {
    pub fragment: Arc<Fragment>,
    pub consumer: Weak<dyn Consume>,
    pub name: &'static str,
}

pub(crate) struct Handoff {
    phase: Phase,
    outbox: VecDeque<Arc<Fragment>>,
    draining: bool,
}

impl Handoff {
    pub fn new() -> Self {
        Self {
            phase: Phase::Buffering {
                pending: VecDeque::new(),
            },
            outbox: VecDeque::new(),
            draining: false,
        }
    }

    /// Accepts a validated fragment.
    pub fn admit(&mut self, fragment: Arc<Fragment>) -> Admission {
        match &mut self.phase {
            Phase::Buffering { pending } => {
                pending.push_back(fragment);
                Admission::Queued {
                    pending: pending.len(),
                }
            }
            Phase::Live { .. } => {
                self.outbox.push_back(fragment);
                Admission::Forwarded
            }
        }
    }

    /// Buffering → Live. Returns the number of fragments moved to the outbox,
    /// or the name of the consumer already attached.
    pub fn attach(
        &mut self,
        consumer: Weak<dyn Consume>,
        name: &'static str,
    ) -> Result<usize, &'static str> {
        match &mut self.phase {
            Phase::Live { name: existing, .. } => Err(*existing),
            Phase::Buffering { pending } => {
                let drained = std::mem::take(pending);
                let count = drained.len();
                self.outbox.extend(drained);
                self.phase = Phase::Live { consumer, name };
                Ok(count)
            }
        }
    }

    /// Claims the drainer role if work is waiting and nobody else holds it.
    pub fn claim_drain(&mut self) -> bool {
        if self.draining || self.outbox.is_empty() {
            return false;
        }
        self.draining = true;
        true
    }

    /// Pops the next delivery; releases the drainer role when the outbox is empty.
    pub fn next_delivery(&mut self) -> Option<Delivery> {
        let Phase::Live { consumer, name } = &self.phase else {
            self.draining = false;
            return None;
        };
        match self.outbox.pop_front() {
            Some(fragment) => Some(Delivery {
                fragment,
                consumer: Weak::clone(consumer),
                name: *name,
            }),
            None => {
                self.draining = false;
                None
            }
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Live { .. })
    }

    pub fn pending_len(&self) -> usize {
        match &self.phase {
            Phase::Buffering { pending } => pending.len(),
            Phase::Live { .. } => 0,
        }
    }

    pub fn consumer_name(&self) -> Option<&'static str> {
        match &self.phase {
            Phase::Live { name, .. } => Some(*name),
            Phase::Buffering { .. } => None,
        }
    }
}
