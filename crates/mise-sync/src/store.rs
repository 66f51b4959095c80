//! # Durable Store
//!
//! Key-value persistence consumed by the engine: one key for the full
//! queue snapshot, one for the last successful sync timestamp. Writes are
//! atomic at the granularity of a single call; no multi-key transaction is
//! assumed because the queue is serialized as one snapshot value.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EngineResult;
use mise_store::Database;

/// Store key holding the full JSON snapshot of the action queue.
pub const QUEUE_SNAPSHOT_KEY: &str = "sync.queue";

/// Store key holding the RFC3339 timestamp of the last successful pass.
pub const LAST_SYNC_KEY: &str = "sync.last_sync";

// =============================================================================
// Store Trait
// =============================================================================

/// Durable key-value persistence surviving process restarts.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> EngineResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> EngineResult<()>;
}

// =============================================================================
// SQLite Implementation
// =============================================================================

/// Durable store backed by the mise-store state repository.
pub struct SqliteDurableStore {
    db: Database,
}

impl SqliteDurableStore {
    /// Wraps an open database handle.
    pub fn new(db: Database) -> Self {
        SqliteDurableStore { db }
    }
}

#[async_trait]
impl DurableStore for SqliteDurableStore {
    async fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.db.state().get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        Ok(self.db.state().set(key, value).await?)
    }
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory store for tests and ephemeral hosts.
///
/// State does not survive the process; everything else behaves like the
/// SQLite store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(QUEUE_SNAPSHOT_KEY).await.unwrap(), None);

        store.set(QUEUE_SNAPSHOT_KEY, "[]").await.unwrap();
        assert_eq!(
            store.get(QUEUE_SNAPSHOT_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let db = Database::new(mise_store::StoreConfig::in_memory())
            .await
            .unwrap();
        let store = SqliteDurableStore::new(db);

        store.set(LAST_SYNC_KEY, "2026-03-01T12:00:00Z").await.unwrap();
        assert_eq!(
            store.get(LAST_SYNC_KEY).await.unwrap().as_deref(),
            Some("2026-03-01T12:00:00Z")
        );
    }
}
