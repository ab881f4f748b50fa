//! Redis-backed counter store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use super::{CounterState, CounterStore};
use crate::error::{Result, TollgateError};

/// A counter store backed by Redis.
///
/// State is stored as JSON under the derived key. Every operation is
/// bounded by the configured timeout; a timeout surfaces as a store error,
/// never as an implicit decision.
pub struct RedisStore {
    conn: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisStore {
    /// Connect to Redis at `url`.
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TollgateError::Config(format!("invalid redis url: {}", e)))?;

        let conn = tokio::time::timeout(op_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| TollgateError::Config("redis connection timed out".to_string()))?
            .map_err(|e| TollgateError::Config(format!("redis connection failed: {}", e)))?;

        info!(url = %url, "Connected to Redis counter store");

        Ok(Self { conn, op_timeout })
    }

    /// Wrap an existing connection, mainly for tests.
    pub fn with_connection(conn: MultiplexedConnection, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<CounterState>> {
        let mut conn = self.conn.clone();

        let value: Option<String> = tokio::time::timeout(self.op_timeout, conn.get(key))
            .await
            .map_err(|_| TollgateError::StoreRead("redis GET timed out".to_string()))?
            .map_err(|e| TollgateError::StoreRead(e.to_string()))?;

        match value {
            None => Ok(None),
            Some(raw) => {
                let state: CounterState = serde_json::from_str(&raw)
                    .map_err(|e| TollgateError::StoreRead(format!("corrupt state: {}", e)))?;
                Ok(Some(state))
            }
        }
    }

    async fn set(&self, key: &str, state: CounterState) -> Result<()> {
        let mut conn = self.conn.clone();

        let raw = serde_json::to_string(&state)
            .map_err(|e| TollgateError::StoreWrite(e.to_string()))?;

        tokio::time::timeout(self.op_timeout, conn.set::<_, _, ()>(key, raw))
            .await
            .map_err(|_| TollgateError::StoreWrite("redis SET timed out".to_string()))?
            .map_err(|e| TollgateError::StoreWrite(e.to_string()))?;

        Ok(())
    }
}
