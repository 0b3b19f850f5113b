//! # Registry: page-lifetime aggregator of index fragments.
//!
//! The registry accepts fragments from any number of loaders, keeps the most
//! recent fragment per group, and hands every accepted fragment to the single
//! consumer once it attaches.
//!
//! ## Architecture
//! ```text
//! Loader ──► submit(fragment)
//!              ├─► validate ──✗──► FragmentRejected, Err(MalformedFragment)
//!              ├─► by_group.insert (last write wins) ──► FragmentReplaced?
//!              └─► Handoff::admit
//!                    ├─ Buffering ──► pending queue ──► FragmentQueued
//!                    └─ Live      ──► outbox ──► drainer ──► consumer.on_fragment()
//!                                                        └──► FragmentDelivered
//!
//! Consumer ──► attach(&consumer)
//!              └─► Handoff::attach: pending ──► outbox (one step, under lock)
//!                    └─► drainer delivers in submission order ──► ConsumerAttached
//! ```
//!
//! ## Rules
//! - All state lives behind one mutex; operations are ordered by lock acquisition.
//! - The consumer is called **without** the lock held, by exactly one drainer
//!   at a time, so deliveries never overlap and re-entrant `submit` is safe.
//! - A rejected call leaves the registry unchanged.
//! - The registry keeps only a weak reference to the consumer.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::RegistryConfig;
use super::handoff::{Admission, Delivery, Handoff};
use super::snapshot::Snapshot;
use crate::consumers::Consume;
use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind};
use crate::fragments::Fragment;
use crate::subscribers::{SubscriberSet, panic_message};

struct State {
    by_group: BTreeMap<String, Arc<Fragment>>,
    handoff: Handoff,
}

/// Shared aggregator of fragments with a late-binding consumer.
pub struct Registry {
    cfg: RegistryConfig,
    state: Mutex<State>,
    bus: Bus,
    listener_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Registry {
    /// Creates a registry without subscribers.
    ///
    /// Does not need a tokio runtime; use [`Registry::builder`] to attach
    /// event subscribers.
    pub fn new(cfg: RegistryConfig) -> Arc<Self> {
        Arc::new(Self::new_internal(cfg))
    }

    pub(crate) fn new_internal(cfg: RegistryConfig) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            state: Mutex::new(State {
                by_group: BTreeMap::new(),
                handoff: Handoff::new(),
            }),
            bus,
            listener_token: CancellationToken::new(),
            listener: Mutex::new(None),
        }
    }

    /// Submits a fragment.
    ///
    /// Replaces any fragment previously registered under the same group name.
    /// While buffering the fragment is queued; once live it is delivered to the
    /// consumer before this call returns (unless another caller is already
    /// delivering, in which case that caller delivers it next).
    ///
    /// # Errors
    /// [`RegistryError::MalformedFragment`] if the fragment fails structural
    /// validation; the registry is left unchanged.
    pub fn submit(&self, fragment: impl Into<Arc<Fragment>>) -> Result<(), RegistryError> {
        let fragment = fragment.into();
        if let Err(err) = fragment.validate(self.cfg.strict_entries) {
            self.bus.publish(
                Event::new(EventKind::FragmentRejected)
                    .with_group(fragment.group_name())
                    .with_reason(rejection_reason(&err)),
            );
            return Err(err);
        }

        let group = fragment.group_name();
        let claimed = {
            let mut state = self.lock();
            let replaced = state
                .by_group
                .insert(group.to_string(), Arc::clone(&fragment))
                .is_some();
            if replaced {
                self.bus.publish(
                    Event::new(EventKind::FragmentReplaced)
                        .with_group(group)
                        .with_entries(fragment.len()),
                );
            }

            match state.handoff.admit(Arc::clone(&fragment)) {
                Admission::Queued { pending } => self.bus.publish(
                    Event::new(EventKind::FragmentQueued)
                        .with_group(group)
                        .with_entries(fragment.len())
                        .with_count(pending),
                ),
                Admission::Forwarded => {}
            }
            state.handoff.claim_drain()
        };

        if claimed {
            self.drain();
        }
        Ok(())
    }

    /// Submits fragments one by one, e.g. the output of
    /// [`fragments_from_rustdoc`](crate::wire::fragments_from_rustdoc).
    ///
    /// Returns the number accepted. Stops at the first rejected fragment;
    /// fragments before it stay submitted.
    pub fn submit_all<I>(&self, fragments: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Fragment>>,
    {
        let mut accepted = 0;
        for fragment in fragments {
            self.submit(fragment)?;
            accepted += 1;
        }
        Ok(accepted)
    }

    /// Attaches the consumer and switches the registry to live delivery.
    ///
    /// Every fragment queued so far is delivered, in submission order, before
    /// any fragment submitted after this call.
    ///
    /// # Errors
    /// [`RegistryError::AlreadyAttached`] on any call after the first
    /// successful one; the attached consumer keeps receiving fragments.
    pub fn attach(&self, consumer: &Arc<dyn Consume>) -> Result<(), RegistryError> {
        let name = consumer.name();
        let claimed = {
            let mut state = self.lock();
            match state.handoff.attach(Arc::downgrade(consumer), name) {
                Ok(drained) => self.bus.publish(
                    Event::new(EventKind::ConsumerAttached)
                        .with_consumer(name)
                        .with_count(drained),
                ),
                Err(existing) => {
                    self.bus.publish(
                        Event::new(EventKind::AttachRejected)
                            .with_consumer(name)
                            .with_reason(existing),
                    );
                    return Err(RegistryError::AlreadyAttached { existing });
                }
            }
            state.handoff.claim_drain()
        };

        if claimed {
            self.drain();
        }
        Ok(())
    }

    /// Returns a copy of the current `group_name → Fragment` map.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_map(self.lock().by_group.clone())
    }

    /// Returns the current fragment for `group`.
    pub fn get(&self, group: &str) -> Option<Arc<Fragment>> {
        self.lock().by_group.get(group).cloned()
    }

    /// Returns sorted list of registered group names.
    pub fn groups(&self) -> Vec<String> {
        self.lock().by_group.keys().cloned().collect()
    }

    /// Returns the expected groups that have not been submitted yet, in input order.
    ///
    /// The registry has no notion of expected fragments; callers that know
    /// which source units should load can use this to detect gaps.
    pub fn missing_groups<'a>(&self, expected: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let state = self.lock();
        expected
            .into_iter()
            .filter(|g| !state.by_group.contains_key(*g))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().by_group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().by_group.is_empty()
    }

    /// True once a consumer has attached.
    pub fn is_live(&self) -> bool {
        self.lock().handoff.is_live()
    }

    /// Number of fragments waiting for a consumer (always 0 once live).
    pub fn pending_len(&self) -> usize {
        self.lock().handoff.pending_len()
    }

    /// Name of the attached consumer, if any.
    pub fn consumer_name(&self) -> Option<&'static str> {
        self.lock().handoff.consumer_name()
    }

    /// Creates a new receiver for registry events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns a submit-only handle for loaders.
    pub fn submitter(self: &Arc<Self>) -> Submitter {
        Submitter {
            registry: Arc::clone(self),
        }
    }

    /// Stops the subscriber listener and waits for subscriber workers to
    /// finish the events already queued to them.
    ///
    /// Fragment state stays readable; submit/attach keep working without
    /// subscribers.
    pub async fn shutdown(&self) {
        self.listener_token.cancel();
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Forwards bus events to the subscriber set until cancelled.
    ///
    /// Call once during build.
    pub(crate) fn spawn_listener(&self, set: SubscriberSet) {
        let mut rx = self.bus.subscribe();
        let token = self.listener_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(ev),
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "registry event listener lagged");
                        }
                    },
                    _ = token.cancelled() => break,
                }
            }
            set.shutdown().await;
        });

        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers outbox items until empty. Only the caller that won `claim_drain` gets here.
    fn drain(&self) {
        loop {
            let next = self.lock().handoff.next_delivery();
            let Some(delivery) = next else { break };
            self.deliver(delivery);
        }
    }

    fn deliver(&self, delivery: Delivery) {
        let Delivery {
            fragment,
            consumer,
            name,
        } = delivery;
        let group = fragment.group_name();

        let Some(consumer) = consumer.upgrade() else {
            tracing::debug!(group, consumer = name, "consumer dropped; fragment kept in registry");
            self.bus.publish(
                Event::new(EventKind::ConsumerDropped)
                    .with_group(group)
                    .with_consumer(name),
            );
            return;
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| consumer.on_fragment(&fragment))) {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::FragmentDelivered)
                    .with_group(group)
                    .with_consumer(name)
                    .with_entries(fragment.len()),
            ),
            Err(panic_err) => self.bus.publish(
                Event::new(EventKind::ConsumerPanicked)
                    .with_group(group)
                    .with_consumer(name)
                    .with_reason(panic_message(&*panic_err)),
            ),
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.listener_token.cancel();
    }
}

fn rejection_reason(err: &RegistryError) -> String {
    match err {
        RegistryError::MalformedFragment { reason, .. } => reason.clone(),
        other => other.as_message(),
    }
}

/// Submit-only handle given to fragment loaders.
///
/// Cheap to clone. Loaders holding a `Submitter` cannot attach a consumer or
/// read registry state.
#[derive(Clone)]
pub struct Submitter {
    registry: Arc<Registry>,
}

impl Submitter {
    /// See [`Registry::submit`].
    pub fn submit(&self, fragment: impl Into<Arc<Fragment>>) -> Result<(), RegistryError> {
        self.registry.submit(fragment)
    }

    /// See [`Registry::submit_all`].
    pub fn submit_all<I>(&self, fragments: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Fragment>>,
    {
        self.registry.submit_all(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::Entry;
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Consume for Recorder {
        fn on_fragment(&self, fragment: &Arc<Fragment>) {
            if fragment.group_name() == "explode" {
                panic!("cannot index {}", fragment.group_name());
            }
            self.seen
                .lock()
                .unwrap()
                .push(fragment.group_name().to_string());
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn copy_of(group: &str, label: &str) -> Fragment {
        Fragment::new(
            group,
            vec![Entry::new("Copy", label, format!("{group}::{label}"))],
        )
    }

    fn attach_recorder(registry: &Registry) -> (Arc<Recorder>, Arc<dyn Consume>) {
        let rec = Arc::new(Recorder::default());
        let consumer: Arc<dyn Consume> = rec.clone();
        registry.attach(&consumer).unwrap();
        (rec, consumer)
    }

    fn drain_kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[test]
    fn test_pkg_a_pkg_b_scenario() {
        let registry = Registry::new(RegistryConfig::default());
        registry.submit(copy_of("pkgA", "DType")).unwrap();
        registry.submit(copy_of("pkgB", "Offloading")).unwrap();
        assert_eq!(registry.pending_len(), 2);

        let (rec, _consumer) = attach_recorder(&registry);

        assert_eq!(rec.seen(), vec!["pkgA", "pkgB"]);
        let snap = registry.snapshot();
        assert_eq!(snap.groups().collect::<Vec<_>>(), vec!["pkgA", "pkgB"]);
        assert_eq!(registry.pending_len(), 0);
        assert!(registry.is_live());
    }

    #[test]
    fn test_delivery_order_is_submission_order() {
        let orders = [
            ["f1", "f2", "f3"],
            ["f3", "f1", "f2"],
            ["f2", "f3", "f1"],
        ];
        let mut final_groups = Vec::new();

        for order in orders {
            let registry = Registry::new(RegistryConfig::default());
            for g in order {
                registry.submit(copy_of(g, "T")).unwrap();
            }
            let (rec, _consumer) = attach_recorder(&registry);

            assert_eq!(rec.seen(), order.to_vec());
            final_groups.push(registry.groups());
        }
        assert!(final_groups.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_exactly_once_then_live() {
        let registry = Registry::new(RegistryConfig::default());
        for i in 0..10 {
            registry.submit(copy_of(&format!("g{i}"), "T")).unwrap();
        }
        let (rec, _consumer) = attach_recorder(&registry);
        assert_eq!(rec.seen().len(), 10);

        registry.submit(copy_of("late", "T")).unwrap();
        let seen = rec.seen();
        assert_eq!(seen.len(), 11);
        assert_eq!(seen.last().map(String::as_str), Some("late"));
    }

    #[test]
    fn test_same_group_replaces() {
        let registry = Registry::new(RegistryConfig::default());
        registry.submit(copy_of("pkgA", "Old")).unwrap();
        registry.submit(copy_of("pkgA", "New")).unwrap();

        let snap = registry.snapshot();
        assert_eq!(snap.len(), 1);
        let current = snap.get("pkgA").unwrap();
        assert_eq!(current.entries()[0].implementor_label, "New");
        assert!(
            snap.implementors_of("Copy")
                .iter()
                .all(|e| e.implementor_label != "Old")
        );
    }

    #[test]
    fn test_submit_right_before_attach_is_drained() {
        let registry = Registry::new(RegistryConfig::default());
        registry.submit(copy_of("edge", "T")).unwrap();
        let (rec, _consumer) = attach_recorder(&registry);
        assert_eq!(rec.seen(), vec!["edge"]);
    }

    #[test]
    fn test_double_attach_rejected() {
        let registry = Registry::new(RegistryConfig::default());
        let (first, _c1) = attach_recorder(&registry);

        let second: Arc<dyn Consume> = Arc::new(Recorder::default());
        let err = registry.attach(&second).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyAttached { existing: "recorder" });

        registry.submit(copy_of("after", "T")).unwrap();
        assert_eq!(first.seen(), vec!["after"]);
        assert_eq!(registry.consumer_name(), Some("recorder"));
    }

    #[test]
    fn test_malformed_leaves_state_unchanged() {
        let registry = Registry::new(RegistryConfig::default());
        let mut rx = registry.events();

        let err = registry.submit(Fragment::new("", vec![])).unwrap_err();
        assert_eq!(err.as_label(), "malformed_fragment");
        let err = registry
            .submit(Fragment::new(
                "pkgA",
                vec![
                    Entry::new("Copy", "A", "pkgA::A"),
                    Entry::new("Copy", "A again", "pkgA::A"),
                ],
            ))
            .unwrap_err();
        assert!(err.is_data_error());

        assert!(registry.is_empty());
        assert_eq!(registry.pending_len(), 0);
        assert_eq!(
            drain_kinds(&mut rx),
            vec![EventKind::FragmentRejected, EventKind::FragmentRejected]
        );
    }

    #[test]
    fn test_lenient_mode_accepts_repeated_pairs() {
        let registry = Registry::new(RegistryConfig {
            strict_entries: false,
            ..RegistryConfig::default()
        });
        registry
            .submit(Fragment::new(
                "pkgA",
                vec![
                    Entry::new("Copy", "A", "pkgA::A"),
                    Entry::new("Copy", "A again", "pkgA::A"),
                ],
            ))
            .unwrap();
        assert_eq!(registry.snapshot().implementors_of("Copy").len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = Registry::new(RegistryConfig::default());
        registry.submit(copy_of("pkgA", "T")).unwrap();

        let mut map = registry.snapshot().into_map();
        map.clear();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_events_follow_handoff() {
        let registry = Registry::new(RegistryConfig::default());
        let mut rx = registry.events();

        registry.submit(copy_of("pkgA", "T")).unwrap();
        registry.submit(copy_of("pkgA", "U")).unwrap();
        let (_rec, _consumer) = attach_recorder(&registry);
        registry.submit(copy_of("pkgB", "T")).unwrap();

        assert_eq!(
            drain_kinds(&mut rx),
            vec![
                EventKind::FragmentQueued,
                EventKind::FragmentReplaced,
                EventKind::FragmentQueued,
                EventKind::ConsumerAttached,
                EventKind::FragmentDelivered,
                EventKind::FragmentDelivered,
                EventKind::FragmentDelivered,
            ]
        );
    }

    #[test]
    fn test_queued_seq_follows_lock_order() {
        let registry = Registry::new(RegistryConfig::default());
        let mut rx = registry.events();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let submitter = registry.submitter();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        submitter.submit(copy_of(&format!("t{t}-{i}"), "T")).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut queued = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::FragmentQueued {
                queued.push((ev.seq, ev.count.unwrap()));
            }
        }
        queued.sort_by_key(|(seq, _)| *seq);
        let pending: Vec<u32> = queued.into_iter().map(|(_, n)| n).collect();
        assert_eq!(pending, (1..=100).collect::<Vec<u32>>());
    }

    struct Echo {
        registry: OnceLock<Arc<Registry>>,
        seen: Mutex<Vec<String>>,
    }

    impl Consume for Echo {
        fn on_fragment(&self, fragment: &Arc<Fragment>) {
            let group = fragment.group_name().to_string();
            self.seen.lock().unwrap().push(group.clone());
            if group == "a" {
                if let Some(registry) = self.registry.get() {
                    registry.submit(copy_of("nested", "T")).unwrap();
                }
            }
        }
        fn name(&self) -> &'static str {
            "echo"
        }
    }

    #[test]
    fn test_reentrant_submit_is_delivered_after_current() {
        let registry = Registry::new(RegistryConfig::default());
        registry.submit(copy_of("a", "T")).unwrap();
        registry.submit(copy_of("b", "T")).unwrap();

        let echo = Arc::new(Echo {
            registry: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        });
        let _ = echo.registry.set(Arc::clone(&registry));
        let consumer: Arc<dyn Consume> = echo.clone();
        registry.attach(&consumer).unwrap();

        assert_eq!(*echo.seen.lock().unwrap(), vec!["a", "b", "nested"]);
        assert!(registry.get("nested").is_some());
    }

    #[test]
    fn test_consumer_panic_does_not_stop_delivery() {
        let registry = Registry::new(RegistryConfig::default());
        let mut rx = registry.events();
        registry.submit(copy_of("explode", "T")).unwrap();
        registry.submit(copy_of("fine", "T")).unwrap();

        let (rec, _consumer) = attach_recorder(&registry);
        assert_eq!(rec.seen(), vec!["fine"]);

        let panicked: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::ConsumerPanicked)
            .collect();
        assert_eq!(panicked.len(), 1);
        assert_eq!(panicked[0].reason.as_deref(), Some("cannot index explode"));

        registry.submit(copy_of("later", "T")).unwrap();
        assert_eq!(rec.seen(), vec!["fine", "later"]);
    }

    #[test]
    fn test_dropped_consumer_keeps_fragment_reachable() {
        let registry = Registry::new(RegistryConfig::default());
        let (rec, consumer) = attach_recorder(&registry);
        drop(consumer);
        drop(rec);

        let mut rx = registry.events();
        registry.submit(copy_of("orphan", "T")).unwrap();

        assert!(registry.get("orphan").is_some());
        assert_eq!(drain_kinds(&mut rx), vec![EventKind::ConsumerDropped]);
        assert!(registry.is_live());
    }

    #[test]
    fn test_missing_groups() {
        let registry = Registry::new(RegistryConfig::default());
        registry.submit(copy_of("pkgA", "T")).unwrap();
        assert_eq!(
            registry.missing_groups(["pkgA", "pkgB", "pkgC"]),
            vec!["pkgB", "pkgC"]
        );
    }

    #[test]
    fn test_parallel_submitters_deliver_each_fragment_once() {
        let registry = Registry::new(RegistryConfig::default());
        let rec = Arc::new(Recorder::default());
        let consumer: Arc<dyn Consume> = rec.clone();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let submitter = registry.submitter();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        submitter.submit(copy_of(&format!("t{t}-{i}"), "T")).unwrap();
                    }
                })
            })
            .collect();
        registry.attach(&consumer).unwrap();
        for h in handles {
            h.join().unwrap();
        }

        let mut seen = rec.seen();
        assert_eq!(seen.len(), 200);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 200);

        for t in 0..4 {
            let prefix = format!("t{t}-");
            let per_thread: Vec<usize> = rec
                .seen()
                .iter()
                .filter_map(|g| g.strip_prefix(&prefix)?.parse().ok())
                .collect();
            assert!(per_thread.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_submit_all_stops_at_first_rejection() {
        let registry = Registry::new(RegistryConfig::default());
        let batch = vec![
            copy_of("pkgA", "DType"),
            Fragment::new("", vec![]),
            copy_of("pkgB", "Offloading"),
        ];
        let err = registry.submit_all(batch).unwrap_err();
        assert_eq!(err.as_label(), "malformed_fragment");
        assert_eq!(registry.groups(), vec!["pkgA".to_string()]);

        let accepted = registry
            .submitter()
            .submit_all([copy_of("pkgB", "Offloading"), copy_of("pkgC", "X")])
            .unwrap();
        assert_eq!(accepted, 2);
        assert_eq!(registry.len(), 3);
    }
}
