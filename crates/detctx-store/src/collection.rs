//! The key-value collection seam and an in-memory implementation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use detctx_core::ContextEntry;

use crate::StoreError;

/// A named key-value collection of context entries, owned by the host.
///
/// Writes are last-writer-wins; there are no versions or transactions.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Keys of every object whose `compositeId` equals `composite_id`.
    async fn search(&self, composite_id: &str) -> Result<Vec<String>, StoreError>;

    async fn read(&self, key: &str) -> Result<ContextEntry, StoreError>;

    async fn write(&self, key: &str, entry: &ContextEntry) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryState {
    objects: BTreeMap<String, ContextEntry>,
    failing_reads: HashSet<String>,
    unavailable: bool,
    searches: Vec<String>,
}

/// In-memory collection.
///
/// Besides plain storage it can be told to fail whole operations or single
/// reads, and it records every search so callers can see which detections
/// were looked up.
#[derive(Default)]
pub struct MemoryCollection {
    state: Mutex<MemoryState>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with entries, each stored under its own `object_key`.
    pub fn with_entries(entries: impl IntoIterator<Item = ContextEntry>) -> Self {
        let collection = Self::new();
        {
            let mut state = collection.lock();
            for entry in entries {
                state.objects.insert(entry.object_key.clone(), entry);
            }
        }
        collection
    }

    /// Insert without going through the async API.
    pub fn insert(&self, key: &str, entry: ContextEntry) {
        self.lock().objects.insert(key.to_string(), entry);
    }

    pub fn get(&self, key: &str) -> Option<ContextEntry> {
        self.lock().objects.get(key).cloned()
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make reads of `key` fail while other keys keep working.
    pub fn fail_reads_of(&self, key: &str) {
        self.lock().failing_reads.insert(key.to_string());
    }

    /// Composite ids searched so far, oldest first.
    pub fn searches(&self) -> Vec<String> {
        self.lock().searches.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(state: &MemoryState) -> Result<(), StoreError> {
        if state.unavailable {
            return Err(StoreError::Unavailable("collection offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn search(&self, composite_id: &str) -> Result<Vec<String>, StoreError> {
        let mut state = self.lock();
        state.searches.push(composite_id.to_string());
        Self::check_available(&state)?;
        Ok(state
            .objects
            .iter()
            .filter(|(_, entry)| entry.composite_id == composite_id)
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn read(&self, key: &str) -> Result<ContextEntry, StoreError> {
        let state = self.lock();
        Self::check_available(&state)?;
        if state.failing_reads.contains(key) {
            return Err(StoreError::Unavailable(format!("read of {key} failed")));
        }
        state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, entry: &ContextEntry) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_available(&state)?;
        state.objects.insert(key.to_string(), entry.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_available(&state)?;
        state.objects.remove(key);
        Ok(())
    }
}
