//! # Rustdoc Implementors File Example
//!
//! Decodes a `trait.impl/**/trait.*.js` file written by rustdoc and prints the
//! merged implementor list, with the built-in `LogWriter` showing registry
//! activity when the `logging` feature is on.
//!
//! ## Run
//! ```bash
//! cargo run --example rustdoc_file --features logging -- target/doc/trait.impl/core/marker/trait.Copy.js
//! ```

use std::sync::Arc;

use anyhow::Context;
use implindex::{Consume, ImplementorIndex, Registry, RegistryConfig, wire};

const SAMPLE: &str = r#"(function() {
    var implementors = Object.fromEntries([["pkgA",[["impl <a class=\"trait\" href=\"core/marker/trait.Copy.html\" title=\"trait core::marker::Copy\">Copy</a> for <a class=\"enum\" href=\"pkgA/enum.DType.html\" title=\"enum pkgA::DType\">DType</a>"]]],["pkgB",[["impl <a class=\"trait\" href=\"core/marker/trait.Copy.html\" title=\"trait core::marker::Copy\">Copy</a> for <a class=\"struct\" href=\"pkgB/struct.Offloading.html\" title=\"struct pkgB::Offloading\">Offloading</a>"]]]]);
    if (window.register_implementors) {
        window.register_implementors(implementors);
    } else {
        window.pending_implementors = implementors;
    }
})()"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let source = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => SAMPLE.to_string(),
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn implindex::Subscribe>> = vec![Arc::new(implindex::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn implindex::Subscribe>> = Vec::new();

    let registry = Registry::builder(RegistryConfig::default())
        .with_subscribers(subs)
        .build();

    let fragments = wire::fragments_from_rustdoc(&source)?;
    let accepted = registry.submit_all(fragments)?;

    let index = Arc::new(ImplementorIndex::new());
    let consumer: Arc<dyn Consume> = index.clone();
    registry.attach(&consumer)?;

    println!("{accepted} crate(s) indexed");
    for subject in index.subjects() {
        for entry in index.implementors_of(&subject) {
            println!("{subject} <- {} ({})", entry.implementor_label, entry.implementor_ref);
        }
    }

    registry.shutdown().await;
    Ok(())
}
