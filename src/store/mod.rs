//! Counter store abstraction.
//!
//! The limiter engine consumes per-key counter state through this narrow
//! read/write contract. The store is externally owned, long-lived, and
//! safe for concurrent use; expiry or eviction of stale entries is a store
//! policy, never the engine's concern.

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted per-key counter state.
///
/// Created lazily on the first request for a key and overwritten on every
/// grant or window refresh thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// When the current window started. Only ever moves forward.
    pub window_started_at: DateTime<Utc>,
    /// Admissions left in the current window.
    pub remaining_credits: u64,
}

/// Read/write contract for per-key counter state.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Fetch the state for a key, or `None` if the key has never been seen.
    async fn get(&self, key: &str) -> Result<Option<CounterState>>;

    /// Unconditionally overwrite the state for a key.
    async fn set(&self, key: &str, state: CounterState) -> Result<()>;
}
