//! Render targets. The orchestrator only ever replaces a slot's content.

use std::sync::{Arc, Mutex};

pub trait Slot: Send + Sync {
    fn set_content(&self, html: &str);
}

/// The two targets the widget renders into.
#[derive(Clone)]
pub struct Slots {
    pub translation: Arc<dyn Slot>,
    pub context: Arc<dyn Slot>,
}

/// Slot that keeps every render, newest last.
#[derive(Default)]
pub struct MemorySlot {
    renders: Mutex<Vec<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content; empty before the first render.
    pub fn content(&self) -> String {
        self.renders().last().cloned().unwrap_or_default()
    }

    pub fn renders(&self) -> Vec<String> {
        self.renders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Slot for MemorySlot {
    fn set_content(&self, html: &str) {
        self.renders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(html.to_string());
    }
}
