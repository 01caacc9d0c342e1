//! Widget runtime: the detection orchestrator, its render slots, host
//! collaborators, and the detection-changed event hub.

mod error;
pub mod events;
pub mod host;
mod orchestrator;
pub mod slot;

pub use error::WidgetError;
pub use events::{DetectionEvents, Subscription};
pub use host::{HostApi, HostError, MemoryHost};
pub use orchestrator::{
    Orchestrator, ProcessOutcome, TranslateAction, TranslationOutcome, should_process,
};
pub use slot::{MemorySlot, Slot, Slots};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpHost;
