//! # Custom Subscriber Example
//!
//! Shows how to implement a custom event subscriber to track registry metrics.
//!
//! The example counts:
//! - Fragments queued before the consumer attached
//! - Fragments delivered to the consumer
//! - Replacements and rejections
//!
//! ## Run
//! ```bash
//! cargo run --example subscriber
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use implindex::{Consume, Fragment, ImplementorIndex, Registry, RegistryConfig};

struct MetricsSubscriber {
    queued: AtomicU64,
    delivered: AtomicU64,
    replaced: AtomicU64,
    rejected: AtomicU64,
}

impl MetricsSubscriber {
    fn new() -> Self {
        Self {
            queued: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            replaced: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }
    fn print_stats(&self) {
        println!();
        println!("Metrics:");
        println!(" ├─► Queued:    {}", self.queued.load(Ordering::Relaxed));
        println!(" ├─► Delivered: {}", self.delivered.load(Ordering::Relaxed));
        println!(" ├─► Replaced:  {}", self.replaced.load(Ordering::Relaxed));
        println!(" └─► Rejected:  {}", self.rejected.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl implindex::Subscribe for MetricsSubscriber {
    async fn on_event(&self, ev: &implindex::Event) {
        let counter = match ev.kind {
            implindex::EventKind::FragmentQueued => &self.queued,
            implindex::EventKind::FragmentDelivered => &self.delivered,
            implindex::EventKind::FragmentReplaced => &self.replaced,
            implindex::EventKind::FragmentRejected => &self.rejected,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
    fn name(&self) -> &'static str {
        "metrics"
    }
    fn queue_capacity(&self) -> Option<usize> {
        Some(1024)
    }
}

fn copy_impl(group: &str, ty: &str) -> Fragment {
    Fragment::builder(group)
        .subject("Copy")
        .implementor(ty, format!("{group}::{ty}"))
        .build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let metrics = Arc::new(MetricsSubscriber::new());

    let registry = Registry::builder(RegistryConfig::default())
        .with_subscriber(Arc::clone(&metrics) as Arc<dyn implindex::Subscribe>)
        .build();
    let loader = registry.submitter();

    loader.submit(copy_impl("pkgA", "DType"))?;
    loader.submit(copy_impl("pkgB", "Offloading"))?;
    loader.submit(copy_impl("pkgA", "ModelDType"))?;
    if let Err(e) = loader.submit(Fragment::new("", vec![])) {
        println!("rejected: {e}");
    }

    let index = Arc::new(ImplementorIndex::new());
    let consumer: Arc<dyn Consume> = index.clone();
    registry.attach(&consumer)?;

    loader.submit(copy_impl("pkgC", "BnbQuantType"))?;

    for entry in index.implementors_of("Copy") {
        println!("Copy <- {} ({})", entry.implementor_label, entry.implementor_ref);
    }

    registry.shutdown().await;
    metrics.print_stats();
    Ok(())
}
