//! Storage layer: per-detection context entries in a shared key-value collection.

mod adapter;
mod collection;
mod error;

pub use adapter::ContextStore;
pub use collection::{Collection, MemoryCollection};
pub use error::StoreError;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpCollection;

/// Collection the widget's entries live in.
pub const DEFAULT_COLLECTION: &str = "detection_context";
