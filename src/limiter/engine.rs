//! Fixed-window limiter engine.
//!
//! The core admission algorithm: a fixed-window counter with lazy refresh.
//! Each decision reads the key's counter state, decides, and writes the
//! updated state back, holding a per-key lock for the whole sequence so
//! that concurrent requests for the same key cannot both spend the last
//! credit.

use std::sync::Arc;

use chrono::{Duration as TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::quota::Quota;
use crate::error::Result;
use crate::store::{CounterState, CounterStore};

/// The fixed-window counter engine.
///
/// Holds a long-lived, externally owned store handle and a map of per-key
/// locks. Safe to share across tasks; different keys never contend.
pub struct LimiterEngine {
    store: Arc<dyn CounterStore>,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LimiterEngine {
    /// Create an engine on top of the given counter store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            key_locks: DashMap::new(),
        }
    }

    /// Decide whether one admission for `key` may proceed under `quota`.
    ///
    /// State machine per key:
    /// - no state yet: initialize a fresh window with the full allowance
    ///   and allow, without consuming a credit;
    /// - within the window with credits left: consume one and allow;
    /// - within the window with no credits left: deny, writing nothing;
    /// - window elapsed (inclusive bound): hard-reset to a fresh window
    ///   with the full allowance and allow.
    ///
    /// Known behavior: if the resolved quota changes while a window is
    /// open, the stored credits keep their old ceiling until the window
    /// expires; the new quota takes effect at the next reset.
    ///
    /// A store failure is returned as an error: the decision is
    /// indeterminate, neither an allow nor a deny.
    pub async fn allowed(&self, key: &str, quota: Quota) -> Result<bool> {
        let lock = self.key_lock(key);
        let guard = lock.lock().await;
        let decision = self.decide(key, quota).await;
        drop(guard);

        // Evict the lock entry once no other request is waiting on it, so
        // the lock table does not grow with every identity ever seen. Two
        // strong references means ours plus the map's.
        self.key_locks
            .remove_if(key, |_, l| Arc::strong_count(l) <= 2);

        decision
    }

    async fn decide(&self, key: &str, quota: Quota) -> Result<bool> {
        let state = self.store.get(key).await?;
        let now = Utc::now();

        trace!(key = %key, state = ?state, "Checking admission");

        let Some(state) = state else {
            debug!(key = %key, credits = quota.credits, "Starting first window");
            self.store
                .set(
                    key,
                    CounterState {
                        window_started_at: now,
                        remaining_credits: quota.credits,
                    },
                )
                .await?;
            return Ok(true);
        };

        let elapsed = now.signed_duration_since(state.window_started_at);
        let window = TimeDelta::from_std(quota.window).unwrap_or(TimeDelta::MAX);

        if elapsed < window {
            if state.remaining_credits == 0 {
                debug!(key = %key, "Quota exhausted");
                return Ok(false);
            }

            self.store
                .set(
                    key,
                    CounterState {
                        window_started_at: state.window_started_at,
                        remaining_credits: state.remaining_credits - 1,
                    },
                )
                .await?;
            Ok(true)
        } else {
            debug!(key = %key, credits = quota.credits, "Window elapsed, resetting");
            self.store
                .set(
                    key,
                    CounterState {
                        window_started_at: now,
                        remaining_credits: quota.credits,
                    },
                )
                .await?;
            Ok(true)
        }
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}
