//! # Action Queue
//!
//! The ordered, persisted collection of pending operations at the core of
//! the engine.
//!
//! ## Ordering & Persistence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Action Queue                                     │
//! │                                                                         │
//! │  enqueue(medium)                                                        │
//! │      │        insert before the first strictly lower priority           │
//! │      ▼        (stable: equal priorities keep insertion order)           │
//! │  ┌──────────┬──────────┬──────────┬──────────┬──────────┐              │
//! │  │ critical │ high     │ medium   │ medium ★ │ low      │              │
//! │  │ w=1      │ w=2      │ w=3      │ w=3 NEW  │ w=4      │              │
//! │  └──────────┴──────────┴──────────┴──────────┴──────────┘              │
//! │      │                                                                  │
//! │      ▼  after EVERY mutation                                            │
//! │  serialize whole queue ──► DurableStore.set("sync.queue", json)         │
//! │                                                                         │
//! │  A restart reloads the exact pending set. Actions caught mid-Syncing    │
//! │  by a crash degrade to Pending on load - a half-delivered call is       │
//! │  retried, never dropped (at-least-once delivery).                       │
//! │                                                                         │
//! │  A failed persist is logged, surfaced through status, and tolerated:    │
//! │  the queue keeps operating in memory.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::{debug, warn};

use mise_core::{ActionStatus, OfflineAction};

use crate::error::EngineResult;
use crate::store::{DurableStore, QUEUE_SNAPSHOT_KEY};

// =============================================================================
// Action Queue
// =============================================================================

/// Priority-ordered, persisted queue of offline actions.
pub struct ActionQueue {
    /// Queued actions, maintained in processing order.
    actions: Vec<OfflineAction>,

    /// Snapshot persistence.
    store: Arc<dyn DurableStore>,

    /// Most recent snapshot-write failure, cleared on the next success.
    last_persist_error: Option<String>,
}

impl ActionQueue {
    /// Creates an empty queue over the given store.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        ActionQueue {
            actions: Vec::new(),
            store,
            last_persist_error: None,
        }
    }

    /// Replaces in-memory state wholesale from the last persisted snapshot.
    ///
    /// Actions persisted mid-`Syncing` (a crash during a pass) degrade to
    /// `Pending` so the next pass retries them.
    ///
    /// An unreachable store is tolerated (the queue starts empty and the
    /// degradation is surfaced via [`Self::last_persist_error`]); a corrupt
    /// snapshot is returned as an error so the host can decide.
    pub async fn load(&mut self) -> EngineResult<()> {
        let snapshot = match self.store.get(QUEUE_SNAPSHOT_KEY).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Could not read queue snapshot, starting empty");
                self.last_persist_error = Some(e.to_string());
                return Ok(());
            }
        };

        let Some(json) = snapshot else {
            debug!("No queue snapshot found, starting empty");
            return Ok(());
        };

        let mut actions: Vec<OfflineAction> = serde_json::from_str(&json)?;
        for action in &mut actions {
            if action.status == ActionStatus::Syncing {
                action.status = ActionStatus::Pending;
            }
        }

        debug!(count = actions.len(), "Loaded queue snapshot");
        self.actions = actions;
        Ok(())
    }

    /// Inserts an action, maintaining priority order.
    ///
    /// Stable insert: the action lands before the first existing entry with
    /// strictly lower priority, so equal priorities preserve insertion
    /// order.
    pub async fn insert(&mut self, action: OfflineAction) {
        let weight = action.metadata.priority.weight();
        let position = self
            .actions
            .iter()
            .position(|existing| existing.metadata.priority.weight() > weight)
            .unwrap_or(self.actions.len());

        debug!(
            id = %action.id,
            kind = action.kind.label(),
            priority = ?action.metadata.priority,
            position,
            "Inserting action"
        );

        self.actions.insert(position, action);
        self.persist().await;
    }

    /// Mutates the action with the given id and persists the queue.
    ///
    /// ## Returns
    /// A clone of the action after mutation, or `None` if the id is
    /// unknown.
    pub async fn apply<F>(&mut self, id: &str, mutate: F) -> Option<OfflineAction>
    where
        F: FnOnce(&mut OfflineAction),
    {
        let action = self.actions.iter_mut().find(|a| a.id == id)?;
        mutate(action);
        let updated = action.clone();
        self.persist().await;
        Some(updated)
    }

    /// Removes the action with the given id.
    pub async fn remove(&mut self, id: &str) -> Option<OfflineAction> {
        let position = self.actions.iter().position(|a| a.id == id)?;
        let removed = self.actions.remove(position);
        self.persist().await;
        Some(removed)
    }

    /// Removes all `Failed` actions (explicit user clear).
    pub async fn clear_failed(&mut self) -> Vec<OfflineAction> {
        let (failed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.actions)
            .into_iter()
            .partition(|a| a.status == ActionStatus::Failed);

        self.actions = kept;
        if !failed.is_empty() {
            self.persist().await;
        }
        failed
    }

    /// Returns the action with the given id.
    pub fn get(&self, id: &str) -> Option<&OfflineAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Ids of up to `limit` pending actions, in processing order.
    ///
    /// The queue is already priority-ordered, so this is a filtered prefix.
    pub fn pending_batch(&self, limit: usize) -> Vec<String> {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending)
            .take(limit)
            .map(|a| a.id.clone())
            .collect()
    }

    /// Number of actions with the given status.
    pub fn count(&self, status: ActionStatus) -> usize {
        self.actions.iter().filter(|a| a.status == status).count()
    }

    /// Clones of all actions with the given status, in queue order.
    pub fn with_status(&self, status: ActionStatus) -> Vec<OfflineAction> {
        self.actions
            .iter()
            .filter(|a| a.status == status)
            .cloned()
            .collect()
    }

    /// Iterates all queued actions in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &OfflineAction> {
        self.actions.iter()
    }

    /// Total number of queued actions (any status).
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no actions are queued.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Most recent snapshot-write failure, if the store is degraded.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Serializes the whole queue to the durable store.
    ///
    /// Tolerant: a failure is logged and recorded for status, and the queue
    /// keeps operating in memory. The unpersisted mutation may be lost on a
    /// crash before the next successful write.
    async fn persist(&mut self) {
        let json = match serde_json::to_string(&self.actions) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Could not serialize queue snapshot");
                self.last_persist_error = Some(e.to_string());
                return;
            }
        };

        match self.store.set(QUEUE_SNAPSHOT_KEY, &json).await {
            Ok(()) => {
                self.last_persist_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Could not persist queue snapshot");
                self.last_persist_error = Some(e.to_string());
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use mise_core::{
        ActionKind, ActionMetadata, ActionPriority, AdjustmentReason, ConflictPolicy,
    };

    fn action(sku: &str, priority: ActionPriority) -> OfflineAction {
        OfflineAction::new(
            ActionKind::StockAdjustment {
                sku: sku.into(),
                delta_milli: -1000,
                reason: AdjustmentReason::Waste,
            },
            ActionMetadata {
                user_id: "user-1".into(),
                device_id: "device-1".into(),
                priority,
                retry_count: 0,
                max_retries: 3,
                conflict_policy: ConflictPolicy::ServerWins,
            },
        )
    }

    fn skus(queue: &ActionQueue) -> Vec<String> {
        queue
            .iter()
            .map(|a| a.kind.entity_id().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_priority_order_with_stable_ties() {
        let mut queue = ActionQueue::new(Arc::new(MemoryStore::new()));

        queue.insert(action("low-1", ActionPriority::Low)).await;
        queue.insert(action("med-1", ActionPriority::Medium)).await;
        queue.insert(action("crit-1", ActionPriority::Critical)).await;
        queue.insert(action("med-2", ActionPriority::Medium)).await;
        queue.insert(action("high-1", ActionPriority::High)).await;

        assert_eq!(
            skus(&queue),
            vec!["crit-1", "high-1", "med-1", "med-2", "low-1"]
        );
    }

    #[tokio::test]
    async fn test_scenario_low_critical_medium() {
        // Enqueue [low, critical, medium] -> queue order [critical, medium, low]
        let mut queue = ActionQueue::new(Arc::new(MemoryStore::new()));

        queue.insert(action("a", ActionPriority::Low)).await;
        queue.insert(action("b", ActionPriority::Critical)).await;
        queue.insert(action("c", ActionPriority::Medium)).await;

        assert_eq!(skus(&queue), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_restart_reload_reproduces_queue() {
        let store = Arc::new(MemoryStore::new());

        let mut queue = ActionQueue::new(store.clone());
        queue.insert(action("a", ActionPriority::Medium)).await;
        queue.insert(action("b", ActionPriority::High)).await;
        queue.insert(action("c", ActionPriority::Low)).await;

        let failed_id = queue.iter().next().unwrap().id.clone();
        queue
            .apply(&failed_id, |a| {
                a.status = ActionStatus::Failed;
            })
            .await
            .unwrap();

        let syncing_id = queue.iter().nth(1).unwrap().id.clone();
        queue
            .apply(&syncing_id, |a| a.mark_syncing())
            .await
            .unwrap();

        // "Restart": fresh queue over the same store.
        let mut reloaded = ActionQueue::new(store);
        reloaded.load().await.unwrap();

        assert_eq!(reloaded.len(), 3);
        assert_eq!(skus(&reloaded), skus(&queue));
        assert_eq!(reloaded.count(ActionStatus::Failed), 1);
        // Mid-syncing actions degrade to pending.
        assert_eq!(reloaded.count(ActionStatus::Syncing), 0);
        assert_eq!(reloaded.get(&syncing_id).unwrap().status, ActionStatus::Pending);
    }

    #[tokio::test]
    async fn test_load_without_snapshot_starts_empty() {
        let mut queue = ActionQueue::new(Arc::new(MemoryStore::new()));
        queue.load().await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_pending_batch_skips_non_pending() {
        let mut queue = ActionQueue::new(Arc::new(MemoryStore::new()));
        queue.insert(action("a", ActionPriority::Critical)).await;
        queue.insert(action("b", ActionPriority::Medium)).await;
        queue.insert(action("c", ActionPriority::Low)).await;

        let a_id = queue.iter().next().unwrap().id.clone();
        queue.apply(&a_id, |a| a.mark_conflict()).await.unwrap();

        let batch = queue.pending_batch(10);
        assert_eq!(batch.len(), 2);
        assert!(!batch.contains(&a_id));

        assert_eq!(queue.pending_batch(1).len(), 1);
    }

    #[tokio::test]
    async fn test_clear_failed_removes_only_failed() {
        let mut queue = ActionQueue::new(Arc::new(MemoryStore::new()));
        queue.insert(action("a", ActionPriority::Medium)).await;
        queue.insert(action("b", ActionPriority::Medium)).await;
        queue.insert(action("c", ActionPriority::Medium)).await;

        let ids: Vec<String> = queue.iter().map(|a| a.id.clone()).collect();
        for id in &ids[..2] {
            queue
                .apply(id, |a| {
                    a.status = ActionStatus::Failed;
                })
                .await
                .unwrap();
        }

        let cleared = queue.clear_failed().await;
        assert_eq!(cleared.len(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.count(ActionStatus::Failed), 0);
    }

    /// Store whose writes always fail, for degraded-persistence tests.
    struct FailingStore;

    #[async_trait]
    impl DurableStore for FailingStore {
        async fn get(&self, _key: &str) -> EngineResult<Option<String>> {
            Err(SyncError::Persistence("disk unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> EngineResult<()> {
            Err(SyncError::Persistence("disk unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_persist_failure_is_tolerated_and_surfaced() {
        let mut queue = ActionQueue::new(Arc::new(FailingStore));

        queue.insert(action("a", ActionPriority::Medium)).await;

        // The mutation survives in memory and the degradation is visible.
        assert_eq!(queue.len(), 1);
        assert!(queue.last_persist_error().is_some());
    }

    #[tokio::test]
    async fn test_load_with_unreachable_store_starts_empty() {
        let mut queue = ActionQueue::new(Arc::new(FailingStore));
        queue.load().await.unwrap();

        assert!(queue.is_empty());
        assert!(queue.last_persist_error().is_some());
    }
}
