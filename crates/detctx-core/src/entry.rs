//! Context entries and the deterministic object keys they are stored under.
//!
//! An entry's storage key is a pure function of its composite id and type:
//! the composite id with every character outside `[A-Za-z0-9_.-]` removed,
//! then `_` and the type. Two entries with the same `(compositeId, type)`
//! share a key and the later write wins, which is how "does a translation
//! already exist" is answered by key lookup alone.

use serde::{Deserialize, Serialize};

/// Type prefix reserved for stored translations (`translation_<lang>`).
pub const TRANSLATION_TYPE_PREFIX: &str = "translation_";

/// A title/content record stored in the shared collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Storage key the entry was read from. Not part of the stored record.
    #[serde(skip)]
    pub object_key: String,
    #[serde(rename = "compositeId", default)]
    pub composite_id: String,
    #[serde(default)]
    pub title: String,
    /// Pre-sanitised HTML.
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub entry_type: String,
}

impl ContextEntry {
    pub fn new(composite_id: &str, entry_type: &str, title: &str, content: &str) -> Self {
        Self {
            object_key: object_key(composite_id, entry_type),
            composite_id: composite_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            entry_type: entry_type.to_string(),
        }
    }
}

/// Strip every character that is unsafe in a storage key.
pub fn sanitize_composite_id(composite_id: &str) -> String {
    composite_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

/// Storage key for the entry of `entry_type` attached to `composite_id`.
pub fn object_key(composite_id: &str, entry_type: &str) -> String {
    format!("{}_{}", sanitize_composite_id(composite_id), entry_type)
}

/// The stored entry a translation job will write for one detection and language.
///
/// Serialises to the `{compositeId, title, type, objectKey}` shape the
/// translation job expects alongside its language and HTML input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationTarget {
    #[serde(rename = "compositeId")]
    pub composite_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(rename = "objectKey")]
    pub object_key: String,
}

impl TranslationTarget {
    pub fn for_detection(detection_id: &str, language: &str) -> Self {
        let entry_type = format!("{TRANSLATION_TYPE_PREFIX}{language}");
        Self {
            composite_id: detection_id.to_string(),
            title: format!("Detection translation ({language})"),
            object_key: object_key(detection_id, &entry_type),
            entry_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strips_unsafe_characters() {
        assert_eq!(
            object_key("cid:ind:abc/123", "translation_es"),
            "cidindabc123_translation_es"
        );
    }

    #[test]
    fn key_keeps_word_dash_and_dot() {
        assert_eq!(object_key("a-b.c_d", "note"), "a-b.c_d_note");
    }

    #[test]
    fn key_drops_non_ascii_letters() {
        assert_eq!(sanitize_composite_id("dé tection"), "dtection");
    }

    #[test]
    fn key_is_sanitized_id_plus_type() {
        for (id, ty) in [
            ("test-detection-id", "translation_es"),
            ("cid:ind:1 2 3", "note"),
            ("", "translation_en"),
            ("<script>", "x"),
        ] {
            let key = object_key(id, ty);
            assert_eq!(key, format!("{}_{}", sanitize_composite_id(id), ty));
            assert_eq!(key, object_key(id, ty));
        }
    }

    #[test]
    fn translation_target_labels() {
        let target = TranslationTarget::for_detection("test-detection-id", "es");
        assert_eq!(target.title, "Detection translation (es)");
        assert_eq!(target.entry_type, "translation_es");
        assert_eq!(target.object_key, "test-detection-id_translation_es");
        assert_eq!(target.composite_id, "test-detection-id");
    }

    #[test]
    fn translation_target_wire_shape() {
        let target = TranslationTarget::for_detection("id:1", "fr");
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["compositeId"], "id:1");
        assert_eq!(json["type"], "translation_fr");
        assert_eq!(json["objectKey"], "id1_translation_fr");
    }

    #[test]
    fn entry_record_omits_object_key() {
        let entry = ContextEntry::new("id-1", "note", "Note", "<p>text</p>");
        assert_eq!(entry.object_key, "id-1_note");
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("object_key").is_none());
        assert_eq!(json["type"], "note");
        assert_eq!(json["compositeId"], "id-1");
    }
}
