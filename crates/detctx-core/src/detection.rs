//! Host-owned detection records as consumed by the widget.
//!
//! The host platform owns these; the widget only reads the handful of
//! attributes it renders and translates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A detection (alert) as returned by the host's detection lookup.
///
/// Every attribute is optional: detections without an overwatch note or an
/// automated triage are common.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub description: Option<String>,
    pub overwatch_note: Option<String>,
    pub overwatch_note_timestamp: Option<String>,
    pub automated_triage: Option<AutomatedTriage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomatedTriage {
    pub triage_explanation: Option<String>,
}

impl Detection {
    pub fn triage_explanation(&self) -> Option<&str> {
        self.automated_triage
            .as_ref()
            .and_then(|t| t.triage_explanation.as_deref())
    }
}

/// A case comment attached to a detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub created_by: CommentAuthor,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentAuthor {
    #[serde(default)]
    pub display_name: String,
}

/// Extract the focused detection id from a host "data" event payload.
///
/// The host sends either `{"detectionId": ..}` or the full
/// `{"detection": {"composite_id": ..}}` shape. Empty ids count as absent.
pub fn detection_id_from_event(payload: &Value) -> Option<String> {
    payload
        .get("detectionId")
        .and_then(Value::as_str)
        .or_else(|| {
            payload
                .get("detection")
                .and_then(|d| d.get("composite_id"))
                .and_then(Value::as_str)
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
