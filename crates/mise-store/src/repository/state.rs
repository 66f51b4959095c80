//! # Sync State Repository
//!
//! Key-value persistence for sync engine state.
//!
//! ## The Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Snapshot Persistence                                 │
//! │                                                                         │
//! │  Every queue mutation                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  serialize full queue ──► set("sync.queue", <json>)                    │
//! │                                                                         │
//! │  One key, one write, one transaction. No multi-key coordination is     │
//! │  needed: a restart reloads the exact pending set from the last         │
//! │  successful write.                                                     │
//! │                                                                         │
//! │  KEYS IN USE:                                                          │
//! │  • sync.queue      - full JSON snapshot of the action queue            │
//! │  • sync.last_sync  - RFC3339 timestamp of the last successful pass     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;

/// Repository for sync state operations.
#[derive(Debug, Clone)]
pub struct StateRepository {
    pool: SqlitePool,
}

impl StateRepository {
    /// Creates a new StateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StateRepository { pool }
    }

    /// Reads the value stored under `key`, if any.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM sync_state WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// Single-statement UPSERT: atomic at the granularity of one write call.
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();

        debug!(key = %key, bytes = value.len(), "Writing sync state");

        sqlx::query(
            r#"
            INSERT INTO sync_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes the value stored under `key`.
    ///
    /// ## Returns
    /// `true` if a row was deleted.
    pub async fn delete(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sync_state WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all stored keys.
    ///
    /// For diagnostics and health checks.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM sync_state ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("key")).collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, StoreConfig};

    async fn repo() -> StateRepository {
        let db = Database::new(StoreConfig::in_memory()).await.unwrap();
        db.state()
    }

    #[tokio::test]
    async fn test_get_missing_key_returns_none() {
        let repo = repo().await;
        assert_eq!(repo.get("sync.queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let repo = repo().await;
        repo.set("sync.queue", "[]").await.unwrap();
        assert_eq!(repo.get("sync.queue").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_value() {
        let repo = repo().await;
        repo.set("sync.last_sync", "2026-01-01T00:00:00Z")
            .await
            .unwrap();
        repo.set("sync.last_sync", "2026-02-01T00:00:00Z")
            .await
            .unwrap();

        assert_eq!(
            repo.get("sync.last_sync").await.unwrap().as_deref(),
            Some("2026-02-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        repo.set("sync.queue", "[]").await.unwrap();

        assert!(repo.delete("sync.queue").await.unwrap());
        assert!(!repo.delete("sync.queue").await.unwrap());
        assert_eq!(repo.get("sync.queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let repo = repo().await;
        repo.set("sync.queue", "[]").await.unwrap();
        repo.set("sync.last_sync", "x").await.unwrap();

        assert_eq!(
            repo.keys().await.unwrap(),
            vec!["sync.last_sync".to_string(), "sync.queue".to_string()]
        );
    }
}
