//! Host detection API consumed by the orchestrator.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use detctx_core::{Comment, Detection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("detection not found: {0}")]
    DetectionNotFound(String),

    #[error("host unavailable: {0}")]
    Unavailable(String),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Detection lookups owned by the host platform.
#[async_trait]
pub trait HostApi: Send + Sync {
    async fn get_detection_by_id(&self, detection_id: &str) -> Result<Detection, HostError>;

    /// Case comments on the detection, oldest first. No cases means no comments.
    async fn get_detection_comments(&self, detection_id: &str) -> Result<Vec<Comment>, HostError>;
}

/// In-memory host with fixed detections and comments.
#[derive(Default)]
pub struct MemoryHost {
    detections: Mutex<HashMap<String, Detection>>,
    comments: Mutex<HashMap<String, Vec<Comment>>>,
    unavailable: AtomicBool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detection(self, detection_id: &str, detection: Detection) -> Self {
        self.detections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(detection_id.to_string(), detection);
        self
    }

    pub fn with_comments(self, detection_id: &str, comments: Vec<Comment>) -> Self {
        self.comments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(detection_id.to_string(), comments);
        self
    }

    /// Make every lookup fail with [`HostError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), HostError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("host offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl HostApi for MemoryHost {
    async fn get_detection_by_id(&self, detection_id: &str) -> Result<Detection, HostError> {
        self.check_available()?;
        self.detections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(detection_id)
            .cloned()
            .ok_or_else(|| HostError::DetectionNotFound(detection_id.to_string()))
    }

    async fn get_detection_comments(&self, detection_id: &str) -> Result<Vec<Comment>, HostError> {
        self.check_available()?;
        Ok(self
            .comments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(detection_id)
            .cloned()
            .unwrap_or_default())
    }
}
