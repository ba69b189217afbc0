#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Domain model for the Rackmap source of truth.
//!
//! Layout: `document.rs` (object-shaped JSON documents and the deep merge),
//! `context.rs` (`ConfigContext` and its scope assignments), `target.rs`
//! (devices and the trait they implement to receive context data),
//! `entities.rs` (the organisational entities scope assignments point at),
//! `resolver.rs` (the weighted merge fold and the store-facing seam).

pub mod context;
pub mod document;
pub mod entities;
pub mod error;
pub mod resolver;
pub mod target;

pub use context::{ConfigContext, DEFAULT_CONTEXT_WEIGHT, MAX_CONTEXT_WEIGHT, ScopeSet};
pub use document::{ContextData, deep_merge};
pub use entities::{Entity, EntityKind};
pub use error::ModelError;
pub use resolver::{
    ContextSource, ContextTarget, render_for_target, rendered_context, resolve_target_context,
};
pub use target::{Device, TargetScope};
