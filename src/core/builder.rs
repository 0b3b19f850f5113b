use std::sync::Arc;

use super::{config::RegistryConfig, registry::Registry};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Registry`] with event subscribers.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use implindex::{Registry, RegistryConfig, Subscribe};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
/// let registry = Registry::builder(RegistryConfig::default())
///     .with_subscribers(subs)
///     .build();
/// assert!(!registry.is_live());
/// registry.shutdown().await;
/// # }
/// ```
pub struct RegistryBuilder {
    cfg: RegistryConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RegistryBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RegistryConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive registry events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the registry.
    ///
    /// With at least one subscriber this spawns the subscriber workers and the
    /// bus listener, so it must run inside a tokio runtime. Without
    /// subscribers no task is spawned.
    pub fn build(self) -> Arc<Registry> {
        let registry = Registry::new_internal(self.cfg);

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(
                self.subscribers,
                registry.bus().clone(),
                registry.config().subscriber_queue_clamped(),
            );
            registry.spawn_listener(set);
        }
        Arc::new(registry)
    }
}

impl Registry {
    /// Creates a builder for a registry with subscribers.
    pub fn builder(cfg: RegistryConfig) -> RegistryBuilder {
        RegistryBuilder::new(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumers::{Consume, ImplementorIndex};
    use crate::events::{Event, EventKind};
    use crate::fragments::Fragment;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Kinds(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Kinds {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "kinds"
        }
    }

    #[tokio::test]
    async fn test_subscriber_observes_handoff_in_order() {
        let kinds = Arc::new(Kinds::default());
        let registry = Registry::builder(RegistryConfig::default())
            .with_subscriber(kinds.clone())
            .build();

        registry.submit(Fragment::new("pkgA", vec![])).unwrap();
        let index: Arc<dyn Consume> = Arc::new(ImplementorIndex::new());
        registry.attach(&index).unwrap();
        registry.shutdown().await;

        assert_eq!(
            *kinds.0.lock().unwrap(),
            vec![
                EventKind::FragmentQueued,
                EventKind::ConsumerAttached,
                EventKind::FragmentDelivered,
            ]
        );
    }

    #[test]
    fn test_build_without_subscribers_needs_no_runtime() {
        let registry = RegistryBuilder::new(RegistryConfig::default()).build();
        assert!(registry.is_empty());
    }
}
