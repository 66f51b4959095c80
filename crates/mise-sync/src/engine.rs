//! # Sync Engine
//!
//! Main orchestrator: drains the action queue in priority batches against
//! the remote gateway, routes outcomes to completion, retry, or conflict,
//! and keeps subscribers informed.
//!
//! ## Engine Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncEngine Architecture                          │
//! │                                                                         │
//! │  TRIGGERS                                                               │
//! │  • enqueue (when online and no pass is running)                         │
//! │  • periodic interval tick (while online)                                │
//! │  • connectivity regained (offline → online edge)                        │
//! │       │                                                                 │
//! │       ▼        AtomicBool guard: at most ONE pass at a time;            │
//! │  ┌─────────┐   concurrent triggers are dropped no-ops                   │
//! │  │  pass   │                                                            │
//! │  └────┬────┘                                                            │
//! │       │   take up to batch_size Pending actions, priority order         │
//! │       ▼                                                                 │
//! │  for each action STRICTLY SEQUENTIALLY:                                 │
//! │    mark Syncing ──► gateway op (with timeout) ──┬── ok ──► Completed,   │
//! │                                                 │          removed      │
//! │                                                 ├── conflict ──►        │
//! │                                                 │   ConflictResolver    │
//! │                                                 └── failure ──► retry   │
//! │                                                     counter, Pending    │
//! │                                                     or Failed           │
//! │                                                                         │
//! │  Every transition: persist snapshot + notify status subscribers.        │
//! │  The pass ends by recording last_sync_time and returning a SyncResult. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cross-action `dependencies` are NOT consulted when batching - the field
//! travels as data only (see DESIGN.md).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use mise_core::validation::validate_action;
use mise_core::{
    ActionKind, ActionMetadata, ActionPriority, ActionStatus, ConflictPolicy,
    ConflictResolution, OfflineAction, ResolutionChoice,
};

use crate::audit::{AuditEvent, AuditEventKind, AuditSink, NoOpAuditSink};
use crate::config::SyncConfig;
use crate::conflict::ConflictResolver;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{EngineResult, SyncError};
use crate::gateway::{GatewayError, GatewayResult, RemoteGateway};
use crate::queue::ActionQueue;
use crate::status::{StatusReporter, SyncStatus, Subscription};
use crate::store::{DurableStore, LAST_SYNC_KEY};

// =============================================================================
// Enqueue Options
// =============================================================================

/// Per-action options supplied at enqueue time.
#[derive(Debug, Clone)]
pub struct EnqueueOptions {
    /// Id of the user performing the operation. Empty when unattributed.
    pub user_id: String,

    /// Processing priority.
    pub priority: ActionPriority,

    /// Retry limit override; the engine default applies when `None`.
    pub max_retries: Option<u32>,

    /// Strategy applied if the gateway reports a conflict.
    pub conflict_policy: ConflictPolicy,

    /// Ids of actions this one logically depends on (carried, not enforced).
    pub dependencies: Vec<String>,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        EnqueueOptions {
            user_id: String::new(),
            priority: ActionPriority::default(),
            max_retries: None,
            conflict_policy: ConflictPolicy::default(),
            dependencies: Vec::new(),
        }
    }
}

// =============================================================================
// Sync Result
// =============================================================================

/// Summary of one sync pass. Returned to the caller, never persisted.
///
/// Partial failure is not an error: the pass reports what happened and the
/// queue carries the rest.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// True when every processed action was delivered.
    pub success: bool,

    /// Actions delivered and removed from the queue.
    pub synced: usize,

    /// Actions that failed delivery this pass (retryable or exhausted).
    pub failed: usize,

    /// Conflicts produced by this pass.
    pub conflicts: Vec<ConflictResolution>,

    /// Per-action error messages.
    pub errors: Vec<String>,

    /// Wall-clock duration of the pass.
    pub duration: Duration,
}

impl SyncResult {
    /// Result for a pass that never ran (offline, or one already active).
    fn skipped(reason: &str) -> Self {
        SyncResult {
            success: false,
            synced: 0,
            failed: 0,
            conflicts: Vec::new(),
            errors: vec![reason.to_string()],
            duration: Duration::ZERO,
        }
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// The offline action sync engine.
///
/// Cheap to clone (all state behind an `Arc`); collaborators are injected
/// so hosts wire in real implementations and tests substitute fakes. All
/// queue mutation and sync logic runs in one cooperative domain: a gateway
/// call is a suspension point, never a parallel thread.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: SyncConfig,
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<dyn DurableStore>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    audit: Arc<dyn AuditSink>,

    /// The queue, owned exclusively by the engine.
    queue: Mutex<ActionQueue>,

    /// Open conflicts awaiting resolution.
    resolver: Mutex<ConflictResolver>,

    /// Status listeners.
    reporter: Arc<StatusReporter>,

    /// Single-pass guard: at most one sync pass at a time.
    sync_in_progress: AtomicBool,

    /// When the last pass finished.
    last_sync: StdMutex<Option<DateTime<Utc>>>,

    /// Shutdown channel for the background driver, present while running.
    driver_shutdown: StdMutex<Option<mpsc::Sender<()>>>,
}

impl SyncEngine {
    /// Creates an engine over the given collaborators.
    ///
    /// Validates the configuration; persisted state is not loaded until
    /// [`Self::load`] or [`Self::start`].
    pub fn new(
        config: SyncConfig,
        gateway: Arc<dyn RemoteGateway>,
        store: Arc<dyn DurableStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        audit: Arc<dyn AuditSink>,
    ) -> EngineResult<Self> {
        config.validate()?;

        Ok(SyncEngine {
            inner: Arc::new(EngineInner {
                queue: Mutex::new(ActionQueue::new(store.clone())),
                resolver: Mutex::new(ConflictResolver::new()),
                reporter: Arc::new(StatusReporter::new()),
                sync_in_progress: AtomicBool::new(false),
                last_sync: StdMutex::new(None),
                driver_shutdown: StdMutex::new(None),
                config,
                gateway,
                store,
                connectivity,
                audit,
            }),
        })
    }

    /// Returns a builder for step-by-step construction.
    pub fn builder(config: SyncConfig) -> SyncEngineBuilder {
        SyncEngineBuilder::new(config)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restores persisted state: the queue snapshot and last-sync timestamp.
    ///
    /// Actions persisted mid-`Syncing` degrade to `Pending`.
    pub async fn load(&self) -> EngineResult<()> {
        {
            let mut queue = self.inner.queue.lock().await;
            queue.load().await?;
        }

        match self.inner.store.get(LAST_SYNC_KEY).await {
            Ok(Some(ts)) => match DateTime::parse_from_rfc3339(&ts) {
                Ok(parsed) => {
                    *self.inner.last_sync.lock().unwrap() = Some(parsed.with_timezone(&Utc));
                }
                Err(e) => warn!(error = %e, "Ignoring unparseable last-sync timestamp"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read last-sync timestamp"),
        }

        self.notify_status().await;
        Ok(())
    }

    /// Loads persisted state and spawns the background driver.
    ///
    /// The driver runs periodic sync passes while online and reacts to the
    /// reconnection event from the connectivity monitor. Call
    /// [`Self::destroy`] to stop it.
    pub async fn start(&self) -> EngineResult<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        {
            let mut guard = self.inner.driver_shutdown.lock().unwrap();
            if guard.is_some() {
                return Err(SyncError::AlreadyStarted);
            }
            *guard = Some(shutdown_tx);
        }

        if let Err(e) = self.load().await {
            self.inner.driver_shutdown.lock().unwrap().take();
            return Err(e);
        }

        // Subscribe before spawning so a reconnection between start() and
        // the driver's first poll is not missed.
        let online_rx = self.inner.connectivity.subscribe();

        let engine = self.clone();
        tokio::spawn(Self::driver(engine, online_rx, shutdown_rx));

        info!(
            device_id = %self.inner.config.device.id,
            interval_secs = self.inner.config.engine.sync_interval_secs,
            "Sync engine started"
        );
        Ok(())
    }

    /// Stops the background driver and releases all status subscribers.
    pub async fn destroy(&self) {
        let shutdown_tx = self.inner.driver_shutdown.lock().unwrap().take();
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(()).await;
        }

        self.inner.reporter.clear();
        info!("Sync engine destroyed");
    }

    /// Background driver loop: periodic ticks and reconnection events.
    async fn driver(
        engine: SyncEngine,
        mut online_rx: tokio::sync::watch::Receiver<bool>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let period = Duration::from_secs(engine.inner.config.engine.sync_interval_secs);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut was_online = *online_rx.borrow();
        let mut monitor_alive = true;

        debug!("Sync driver started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if engine.inner.connectivity.is_online() {
                        let result = engine.sync_to_server().await;
                        debug!(
                            synced = result.synced,
                            failed = result.failed,
                            "Periodic sync pass finished"
                        );
                    }
                }

                changed = online_rx.changed(), if monitor_alive => {
                    match changed {
                        Ok(()) => {
                            let now_online = *online_rx.borrow_and_update();
                            if now_online && !was_online {
                                info!("Connectivity regained, triggering sync pass");
                                let _ = engine.sync_to_server().await;
                            }
                            was_online = now_online;
                        }
                        Err(_) => {
                            warn!("Connectivity monitor dropped, periodic sync only");
                            monitor_alive = false;
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        debug!("Sync driver stopped");
    }

    // =========================================================================
    // Enqueue
    // =========================================================================

    /// Queues a state-changing operation for delivery.
    ///
    /// The action is inserted in priority order and persisted; if currently
    /// online and no pass is running, a sync pass is triggered immediately.
    ///
    /// Never fails for network reasons: any gateway outcome is absorbed
    /// into action status. The only refusal is a malformed payload.
    ///
    /// ## Returns
    /// The new action's id.
    pub async fn enqueue(
        &self,
        kind: ActionKind,
        options: EnqueueOptions,
    ) -> EngineResult<String> {
        validate_action(&kind)?;

        let metadata = ActionMetadata {
            user_id: options.user_id,
            device_id: self.inner.config.device.id.clone(),
            priority: options.priority,
            retry_count: 0,
            max_retries: options
                .max_retries
                .unwrap_or(self.inner.config.engine.default_max_retries),
            conflict_policy: options.conflict_policy,
        };

        let action = OfflineAction::new(kind, metadata).with_dependencies(options.dependencies);
        let id = action.id.clone();
        let snapshot = action.clone();

        {
            let mut queue = self.inner.queue.lock().await;
            queue.insert(action).await;
        }

        self.audit(AuditEventKind::ActionEnqueued, &snapshot);
        self.notify_status().await;

        if self.inner.connectivity.is_online()
            && !self.inner.sync_in_progress.load(Ordering::SeqCst)
        {
            let _ = self.sync_to_server().await;
        }

        Ok(id)
    }

    // =========================================================================
    // Sync Passes
    // =========================================================================

    /// Runs one sync pass over up to `batch_size` pending actions.
    ///
    /// Returns a summary instead of raising on partial failure. Skipped
    /// entirely (with `success == false` and an explanatory message) when
    /// offline or when a pass is already running.
    pub async fn sync_to_server(&self) -> SyncResult {
        self.run_pass(self.inner.config.engine.batch_size).await
    }

    /// Same algorithm as [`Self::sync_to_server`] with the batch limit
    /// raised to cover the entire queue.
    pub async fn force_sync_all(&self) -> SyncResult {
        self.run_pass(usize::MAX).await
    }

    async fn run_pass(&self, limit: usize) -> SyncResult {
        if !self.inner.connectivity.is_online() {
            debug!("Offline, skipping sync pass");
            return SyncResult::skipped("offline");
        }

        // Single-pass guard: concurrent triggers are dropped, not queued.
        if self
            .inner
            .sync_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Sync pass already running, skipping trigger");
            return SyncResult::skipped("a sync pass is already running");
        }

        self.notify_status().await;

        let result = self.process_batch(limit).await;

        let finished = Utc::now();
        *self.inner.last_sync.lock().unwrap() = Some(finished);
        if let Err(e) = self
            .inner
            .store
            .set(LAST_SYNC_KEY, &finished.to_rfc3339())
            .await
        {
            warn!(error = %e, "Could not persist last-sync timestamp");
        }

        self.inner.sync_in_progress.store(false, Ordering::SeqCst);
        self.notify_status().await;

        result
    }

    /// Processes one priority-ordered batch strictly sequentially.
    async fn process_batch(&self, limit: usize) -> SyncResult {
        let started = std::time::Instant::now();
        let op_timeout = Duration::from_secs(self.inner.config.engine.op_timeout_secs);

        let batch: Vec<String> = {
            let queue = self.inner.queue.lock().await;
            queue.pending_batch(limit)
        };

        if batch.is_empty() {
            debug!("No pending actions");
        } else {
            info!(count = batch.len(), "Starting sync pass");
        }

        let mut synced = 0;
        let mut failed = 0;
        let mut conflicts = Vec::new();
        let mut errors = Vec::new();

        for id in batch {
            let action = {
                let mut queue = self.inner.queue.lock().await;
                queue.apply(&id, |a| a.mark_syncing()).await
            };
            // Removed behind our back (e.g., a concurrent clear); skip.
            let Some(action) = action else { continue };
            self.notify_status().await;

            // A call that outlives the timeout counts as a retryable
            // failure instead of stalling the rest of the batch.
            let outcome = match tokio::time::timeout(op_timeout, self.dispatch(&action.kind)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(GatewayError::Unavailable(format!(
                    "operation timed out after {}s",
                    self.inner.config.engine.op_timeout_secs
                ))),
            };

            match outcome {
                Ok(()) => {
                    let removed = {
                        let mut queue = self.inner.queue.lock().await;
                        queue.apply(&id, |a| a.mark_completed()).await;
                        queue.remove(&id).await
                    };
                    if let Some(completed) = removed {
                        debug!(id = %id, kind = completed.kind.label(), "Action synced");
                        self.audit(AuditEventKind::ActionSynced, &completed);
                    }
                    synced += 1;
                }

                Err(GatewayError::Conflict {
                    conflict_type,
                    server_data,
                }) => {
                    let conflicted = {
                        let mut queue = self.inner.queue.lock().await;
                        queue.apply(&id, |a| a.mark_conflict()).await
                    };
                    if let Some(conflicted) = conflicted {
                        let resolution = {
                            let mut resolver = self.inner.resolver.lock().await;
                            resolver.record(&conflicted, conflict_type, server_data)
                        };
                        self.audit(AuditEventKind::ConflictDetected, &conflicted);
                        conflicts.push(resolution);
                    }
                }

                Err(gateway_error) => {
                    let message = gateway_error.to_string();
                    let updated = {
                        let mut queue = self.inner.queue.lock().await;
                        queue
                            .apply(&id, |a| {
                                a.record_failure(&message);
                            })
                            .await
                    };
                    if let Some(updated) = updated {
                        if updated.status == ActionStatus::Failed {
                            warn!(
                                id = %id,
                                retries = updated.metadata.retry_count,
                                error = %message,
                                "Retries exhausted, action failed"
                            );
                            self.audit(AuditEventKind::ActionFailed, &updated);
                        } else {
                            debug!(
                                id = %id,
                                retry = updated.metadata.retry_count,
                                error = %message,
                                "Delivery failed, will retry"
                            );
                        }
                    }
                    failed += 1;
                    errors.push(format!("{}: {}", id, message));
                }
            }

            self.notify_status().await;
        }

        SyncResult {
            success: failed == 0,
            synced,
            failed,
            conflicts,
            errors,
            duration: started.elapsed(),
        }
    }

    /// Invokes the gateway operation matching the action kind.
    async fn dispatch(&self, kind: &ActionKind) -> GatewayResult {
        let gateway = &self.inner.gateway;
        match kind {
            ActionKind::StockUpdate {
                sku,
                quantity_milli,
            } => gateway.update_stock(sku, *quantity_milli).await,

            ActionKind::StockAdjustment {
                sku,
                delta_milli,
                reason,
            } => gateway.adjust_stock(sku, *delta_milli, *reason).await,

            ActionKind::RecipeCreate { recipe } => gateway.create_recipe(recipe).await,

            ActionKind::RecipeUpdate { recipe } => gateway.update_recipe(recipe).await,

            ActionKind::RecipeDelete { recipe_id } => gateway.delete_recipe(recipe_id).await,

            ActionKind::OrderCompletion {
                order_id,
                deductions,
            } => gateway.complete_order(order_id, deductions).await,

            ActionKind::CostUpdate {
                sku,
                unit_cost_cents,
            } => gateway.update_cost(sku, *unit_cost_cents).await,
        }
    }

    // =========================================================================
    // Conflict Resolution
    // =========================================================================

    /// Applies a resolution choice to a conflicted action.
    ///
    /// `Skip` removes the action from the queue entirely; any other choice
    /// updates the action's policy, resets its retry counter, and returns
    /// it to `Pending` so the next pass retries it under the new policy.
    pub async fn resolve_conflict(
        &self,
        action_id: &str,
        choice: ResolutionChoice,
    ) -> EngineResult<()> {
        let resolution = {
            let mut resolver = self.inner.resolver.lock().await;
            resolver
                .take(action_id, choice)
                .ok_or_else(|| SyncError::ConflictNotFound(action_id.to_string()))?
        };

        info!(
            action_id = %action_id,
            recommended = ?resolution.recommended,
            choice = ?choice,
            "Resolving conflict"
        );

        let affected = match choice.as_policy() {
            None => {
                // Skip: discard the action.
                let mut queue = self.inner.queue.lock().await;
                queue.remove(action_id).await
            }
            Some(policy) => {
                let mut queue = self.inner.queue.lock().await;
                queue.apply(action_id, |a| a.reset_for_retry(policy)).await
            }
        };

        let affected =
            affected.ok_or_else(|| SyncError::ActionNotFound(action_id.to_string()))?;
        self.audit(AuditEventKind::ConflictResolved, &affected);
        self.notify_status().await;
        Ok(())
    }

    // =========================================================================
    // Failed-Action Maintenance
    // =========================================================================

    /// Removes all `Failed` actions (explicit user clear).
    ///
    /// ## Returns
    /// The number of actions removed.
    pub async fn clear_failed_actions(&self) -> usize {
        let cleared = {
            let mut queue = self.inner.queue.lock().await;
            queue.clear_failed().await
        };

        for action in &cleared {
            self.audit(AuditEventKind::FailedCleared, action);
        }

        if !cleared.is_empty() {
            info!(count = cleared.len(), "Cleared failed actions");
            self.notify_status().await;
        }

        cleared.len()
    }

    // =========================================================================
    // Queries & Subscriptions
    // =========================================================================

    /// Computes the current sync status from the live queue.
    pub async fn get_sync_status(&self) -> SyncStatus {
        self.compute_status().await
    }

    /// Actions whose retries are exhausted, in queue order.
    pub async fn failed_actions(&self) -> Vec<OfflineAction> {
        self.inner.queue.lock().await.with_status(ActionStatus::Failed)
    }

    /// Actions awaiting conflict resolution, in queue order.
    pub async fn conflict_actions(&self) -> Vec<OfflineAction> {
        self.inner
            .queue
            .lock()
            .await
            .with_status(ActionStatus::Conflict)
    }

    /// Open conflict records, oldest first.
    pub async fn open_conflicts(&self) -> Vec<ConflictResolution> {
        self.inner.resolver.lock().await.open_conflicts().to_vec()
    }

    /// Registers a status listener, invoked synchronously on every queue
    /// mutation with the freshly computed status.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn on_status_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.inner.reporter.subscribe(Box::new(listener))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn compute_status(&self) -> SyncStatus {
        let queue = self.inner.queue.lock().await;
        SyncStatus::compute(
            &queue,
            self.inner.connectivity.is_online(),
            *self.inner.last_sync.lock().unwrap(),
            self.inner.sync_in_progress.load(Ordering::SeqCst),
            self.inner.config.engine.per_action_estimate_ms,
        )
    }

    async fn notify_status(&self) {
        let status = self.compute_status().await;
        self.inner.reporter.notify(&status);
    }

    /// Emits an audit event. Fire-and-forget: the outcome is never checked.
    fn audit(&self, kind: AuditEventKind, action: &OfflineAction) {
        self.inner.audit.record(AuditEvent {
            kind,
            action_id: action.id.clone(),
            entity_kind: action.kind.entity_kind(),
            entity_id: action.kind.entity_id().to_string(),
            device_id: action.metadata.device_id.clone(),
            timestamp: Utc::now(),
        });
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for creating a [`SyncEngine`] with optional collaborators.
pub struct SyncEngineBuilder {
    config: SyncConfig,
    gateway: Option<Arc<dyn RemoteGateway>>,
    store: Option<Arc<dyn DurableStore>>,
    connectivity: Option<Arc<dyn ConnectivityMonitor>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl SyncEngineBuilder {
    /// Creates a builder with the given config.
    pub fn new(config: SyncConfig) -> Self {
        SyncEngineBuilder {
            config,
            gateway: None,
            store: None,
            connectivity: None,
            audit: None,
        }
    }

    /// Sets the remote gateway.
    pub fn with_gateway(mut self, gateway: Arc<dyn RemoteGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Sets the durable store.
    pub fn with_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the connectivity monitor.
    pub fn with_connectivity(mut self, connectivity: Arc<dyn ConnectivityMonitor>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Sets the audit sink. Defaults to a no-op sink.
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> EngineResult<SyncEngine> {
        let gateway = self
            .gateway
            .ok_or_else(|| SyncError::InvalidConfig("Remote gateway required".into()))?;
        let store = self
            .store
            .ok_or_else(|| SyncError::InvalidConfig("Durable store required".into()))?;
        let connectivity = self
            .connectivity
            .ok_or_else(|| SyncError::InvalidConfig("Connectivity monitor required".into()))?;
        let audit = self.audit.unwrap_or_else(|| Arc::new(NoOpAuditSink));

        SyncEngine::new(self.config, gateway, store, connectivity, audit)
    }
}

// =============================================================================
// Tests
// =============================================================================
