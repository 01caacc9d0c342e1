//! Core types for the detection context widget: detection records, stored
//! context entries and their keys, and sanitised panel rendering.

pub mod detection;
pub mod entry;
pub mod language;
pub mod render;

pub use detection::{AutomatedTriage, Comment, CommentAuthor, Detection, detection_id_from_event};
pub use entry::{ContextEntry, TranslationTarget, object_key, sanitize_composite_id};
pub use language::{DEFAULT_LANGUAGE, language_from_locale};
