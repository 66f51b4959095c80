//! # Status Reporter
//!
//! Derived sync status and the subscription mechanism that pushes it to the
//! UI layer.
//!
//! The reporter holds no independent state: [`SyncStatus`] is recomputed on
//! demand by scanning the live queue, and every queue mutation triggers a
//! synchronous notification to all subscribers with the fresh result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use mise_core::ActionStatus;

use crate::queue::ActionQueue;

// =============================================================================
// Sync Status
// =============================================================================

/// Observable engine status, recomputed on demand. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    /// Current connectivity state.
    pub is_online: bool,

    /// When the last sync pass finished.
    pub last_sync_time: Option<DateTime<Utc>>,

    /// Actions waiting for delivery (including any currently in flight).
    pub pending_actions: usize,

    /// Actions whose retries are exhausted.
    pub failed_actions: usize,

    /// Actions awaiting conflict resolution.
    pub conflict_actions: usize,

    /// Whether a sync pass is running right now.
    pub sync_in_progress: bool,

    /// Heuristic time to drain the queue: pending count × a fixed
    /// per-action duration. `None` when nothing is pending.
    pub estimated_completion_ms: Option<u64>,

    /// Most recent snapshot-write failure, when persistence is degraded.
    pub last_persist_error: Option<String>,
}

impl SyncStatus {
    /// Computes status from the live queue and engine state.
    pub fn compute(
        queue: &ActionQueue,
        is_online: bool,
        last_sync_time: Option<DateTime<Utc>>,
        sync_in_progress: bool,
        per_action_estimate_ms: u64,
    ) -> Self {
        let pending =
            queue.count(ActionStatus::Pending) + queue.count(ActionStatus::Syncing);

        SyncStatus {
            is_online,
            last_sync_time,
            pending_actions: pending,
            failed_actions: queue.count(ActionStatus::Failed),
            conflict_actions: queue.count(ActionStatus::Conflict),
            sync_in_progress,
            estimated_completion_ms: if pending == 0 {
                None
            } else {
                Some(pending as u64 * per_action_estimate_ms)
            },
            last_persist_error: queue.last_persist_error().map(str::to_string),
        }
    }
}

// =============================================================================
// Listener Registry
// =============================================================================

/// Callback invoked with the freshly computed status on every mutation.
pub type StatusListener = Box<dyn Fn(&SyncStatus) + Send + Sync>;

/// Registry of status listeners.
///
/// Listeners are invoked synchronously, in subscription order, while the
/// registry lock is held - callbacks must not subscribe or unsubscribe
/// from within the notification.
#[derive(Default)]
pub struct StatusReporter {
    listeners: Mutex<Vec<(u64, StatusListener)>>,
    next_id: AtomicU64,
}

impl StatusReporter {
    /// Creates an empty registry.
    pub fn new() -> Self {
        StatusReporter::default()
    }

    /// Registers a listener and returns a disposable subscription.
    ///
    /// Dropping the [`Subscription`] (or calling
    /// [`Subscription::unsubscribe`]) removes the listener.
    pub fn subscribe(self: &Arc<Self>, listener: StatusListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap().push((id, listener));

        Subscription {
            reporter: Arc::downgrade(self),
            id,
        }
    }

    /// Removes a listener by id.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Invokes every listener with `status`.
    pub fn notify(&self, status: &SyncStatus) {
        let listeners = self.listeners.lock().unwrap();
        trace!(listeners = listeners.len(), "Notifying status listeners");
        for (_, listener) in listeners.iter() {
            listener(status);
        }
    }

    /// Drops all listeners (engine teardown).
    pub fn clear(&self) {
        self.listeners.lock().unwrap().clear();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

// =============================================================================
// Subscription Handle
// =============================================================================

/// Disposable handle to a registered status listener.
pub struct Subscription {
    reporter: Weak<StatusReporter>,
    id: u64,
}

impl Subscription {
    /// Removes the listener now instead of at drop time.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reporter) = self.reporter.upgrade() {
            reporter.unsubscribe(self.id);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use mise_core::{
        ActionKind, ActionMetadata, ActionPriority, AdjustmentReason, ConflictPolicy,
        OfflineAction,
    };
    use std::sync::atomic::AtomicUsize;

    fn sample_action() -> OfflineAction {
        OfflineAction::new(
            ActionKind::StockAdjustment {
                sku: "FLOUR-01".into(),
                delta_milli: -100,
                reason: AdjustmentReason::Waste,
            },
            ActionMetadata {
                user_id: String::new(),
                device_id: "device-1".into(),
                priority: ActionPriority::Medium,
                retry_count: 0,
                max_retries: 3,
                conflict_policy: ConflictPolicy::ServerWins,
            },
        )
    }

    #[tokio::test]
    async fn test_compute_counts_and_estimate() {
        let mut queue = ActionQueue::new(Arc::new(MemoryStore::new()));
        queue.insert(sample_action()).await;
        queue.insert(sample_action()).await;

        let failed_id = queue.iter().next().unwrap().id.clone();
        queue
            .apply(&failed_id, |a| {
                a.status = ActionStatus::Failed;
            })
            .await;

        let status = SyncStatus::compute(&queue, true, None, false, 2000);
        assert!(status.is_online);
        assert_eq!(status.pending_actions, 1);
        assert_eq!(status.failed_actions, 1);
        assert_eq!(status.conflict_actions, 0);
        assert_eq!(status.estimated_completion_ms, Some(2000));

        let empty = ActionQueue::new(Arc::new(MemoryStore::new()));
        let status = SyncStatus::compute(&empty, false, None, false, 2000);
        assert_eq!(status.estimated_completion_ms, None);
    }

    fn status_fixture() -> SyncStatus {
        SyncStatus {
            is_online: true,
            last_sync_time: None,
            pending_actions: 0,
            failed_actions: 0,
            conflict_actions: 0,
            sync_in_progress: false,
            estimated_completion_ms: None,
            last_persist_error: None,
        }
    }

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let reporter = Arc::new(StatusReporter::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        let subscription = reporter.subscribe(Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        reporter.notify(&status_fixture());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        reporter.notify(&status_fixture());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.listener_count(), 0);
    }

    #[test]
    fn test_dropping_subscription_removes_listener() {
        let reporter = Arc::new(StatusReporter::new());

        {
            let _subscription = reporter.subscribe(Box::new(|_| {}));
            assert_eq!(reporter.listener_count(), 1);
        }

        assert_eq!(reporter.listener_count(), 0);
    }
}
