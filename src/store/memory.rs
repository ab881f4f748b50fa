//! In-process counter store.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CounterState, CounterStore};
use crate::error::Result;

/// An in-memory counter store backed by a concurrent map.
///
/// Suitable for single-process deployments and tests; state does not
/// survive restarts.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, CounterState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is tracking any keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CounterState>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn set(&self, key: &str, state: CounterState) -> Result<()> {
        self.entries.insert(key.to_string(), state);
        Ok(())
    }
}
