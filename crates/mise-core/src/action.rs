//! # Offline Actions
//!
//! The action model at the heart of the sync engine: every state-changing
//! operation performed on the terminal becomes an [`OfflineAction`] that is
//! queued locally and delivered to the remote system when connectivity
//! allows.
//!
//! ## Action Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Action State Machine                              │
//! │                                                                         │
//! │   enqueue                                                               │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  ┌─────────┐  pass starts   ┌─────────┐  gateway ok   ┌───────────┐    │
//! │  │ Pending │ ─────────────► │ Syncing │ ────────────► │ Completed │    │
//! │  └─────────┘                └─────────┘               │ (removed) │    │
//! │      ▲                        │     │                 └───────────┘    │
//! │      │  retries remain        │     │ gateway conflict                 │
//! │      └────────────────────────┘     ▼                                  │
//! │      ▲                          ┌──────────┐   resolve (non-skip)      │
//! │      │                          │ Conflict │ ──────────────────► back  │
//! │      │  retries exhausted       └──────────┘   to Pending, retries = 0 │
//! │      │                                                                  │
//! │  ┌────────┐                                                             │
//! │  │ Failed │  terminal until cleared by the user                         │
//! │  └────────┘                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Typed Payloads
//! The payload travels inside [`ActionKind`] as a tagged union: each action
//! type carries its own strongly typed payload structure instead of a
//! loosely typed blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::types::{AdjustmentReason, EntityKind, Recipe, StockDeduction};

// =============================================================================
// Priority
// =============================================================================

/// Processing priority of a queued action.
///
/// ## Priority Weights
/// Critical = 1, High = 2, Medium = 3, Low = 4. Lower weight syncs first;
/// ties are broken by insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    /// Must reach the server as soon as possible (e.g., order completion).
    Critical,

    /// Important but not order-affecting (e.g., stock adjustments).
    High,

    /// Default priority for routine updates.
    Medium,

    /// Background bookkeeping (e.g., cost updates).
    Low,
}

impl ActionPriority {
    /// Numeric weight used to order pending actions. Lower syncs first.
    #[inline]
    pub const fn weight(self) -> u8 {
        match self {
            ActionPriority::Critical => 1,
            ActionPriority::High => 2,
            ActionPriority::Medium => 3,
            ActionPriority::Low => 4,
        }
    }
}

impl Default for ActionPriority {
    fn default() -> Self {
        ActionPriority::Medium
    }
}

impl PartialOrd for ActionPriority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ActionPriority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.weight().cmp(&other.weight())
    }
}

// =============================================================================
// Status
// =============================================================================

/// Queue status of an offline action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Waiting for the next sync pass.
    Pending,

    /// Currently being delivered to the remote gateway.
    Syncing,

    /// Delivered successfully. Completed actions are removed from the queue.
    Completed,

    /// Retries exhausted. Terminal until cleared by the user.
    Failed,

    /// The gateway reported a state divergence; awaiting resolution.
    Conflict,
}

// =============================================================================
// Conflict Policy & Resolution
// =============================================================================

/// Configured strategy for resolving a gateway-reported conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Local data overwrites the server.
    ClientWins,

    /// Server data stands; the local action is dropped on resolution.
    ServerWins,

    /// Field-level merge performed by the remote gateway.
    Merge,

    /// Surface the conflict and wait for a human decision.
    Manual,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::ServerWins
    }
}

/// Category of divergence reported by the remote gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// The entity was modified remotely since this device last saw it.
    VersionMismatch,

    /// The entity no longer exists on the server.
    DeletedOnServer,

    /// Another device already created an entity with this identity.
    DuplicateEntity,

    /// Local and remote stock levels disagree beyond tolerance.
    StockDivergence,
}

/// A resolution choice made for a conflicted action.
///
/// Mirrors [`ConflictPolicy`] plus `Skip`, which discards the action
/// entirely instead of retrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionChoice {
    ClientWins,
    ServerWins,
    Merge,
    Manual,
    /// Drop the action from the queue without retrying.
    Skip,
}

impl ResolutionChoice {
    /// The conflict policy this choice maps to, or `None` for `Skip`.
    pub fn as_policy(self) -> Option<ConflictPolicy> {
        match self {
            ResolutionChoice::ClientWins => Some(ConflictPolicy::ClientWins),
            ResolutionChoice::ServerWins => Some(ConflictPolicy::ServerWins),
            ResolutionChoice::Merge => Some(ConflictPolicy::Merge),
            ResolutionChoice::Manual => Some(ConflictPolicy::Manual),
            ResolutionChoice::Skip => None,
        }
    }
}

impl From<ConflictPolicy> for ResolutionChoice {
    fn from(policy: ConflictPolicy) -> Self {
        match policy {
            ConflictPolicy::ClientWins => ResolutionChoice::ClientWins,
            ConflictPolicy::ServerWins => ResolutionChoice::ServerWins,
            ConflictPolicy::Merge => ResolutionChoice::Merge,
            ConflictPolicy::Manual => ResolutionChoice::Manual,
        }
    }
}

/// A recorded conflict awaiting resolution.
///
/// Created only when the remote gateway signals a conflict for a specific
/// action; consumed when the user (or the recommended policy) decides how
/// to proceed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConflictResolution {
    /// The conflicted action's id.
    pub action_id: String,

    /// Category of divergence reported by the gateway.
    pub conflict_type: ConflictType,

    /// The local payload at the time of the conflict.
    #[ts(type = "unknown")]
    pub local_data: serde_json::Value,

    /// The server's version of the entity, as reported by the gateway.
    #[ts(type = "unknown")]
    pub server_data: serde_json::Value,

    /// Recommended resolution, defaulted from the action's configured policy.
    pub recommended: ResolutionChoice,

    /// The choice actually made, once resolved.
    pub user_choice: Option<ResolutionChoice>,
}

// =============================================================================
// Action Kind (typed payload union)
// =============================================================================

/// A state-changing operation together with its strongly typed payload.
///
/// Serialized with an internal `type` tag so queue snapshots stay
/// self-describing across releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Set an item's stock level to an absolute quantity.
    StockUpdate {
        sku: String,
        quantity_milli: i64,
    },

    /// Apply a signed delta to an item's stock level with a reason code.
    StockAdjustment {
        sku: String,
        delta_milli: i64,
        reason: AdjustmentReason,
    },

    /// Create a new recipe.
    RecipeCreate { recipe: Recipe },

    /// Replace an existing recipe.
    RecipeUpdate { recipe: Recipe },

    /// Delete a recipe by id.
    RecipeDelete { recipe_id: String },

    /// Mark an order complete and deduct its consumed inventory.
    OrderCompletion {
        order_id: String,
        deductions: Vec<StockDeduction>,
    },

    /// Update an item's unit cost.
    CostUpdate {
        sku: String,
        unit_cost_cents: i64,
    },
}

impl ActionKind {
    /// The kind of entity this action targets.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ActionKind::StockUpdate { .. }
            | ActionKind::StockAdjustment { .. }
            | ActionKind::CostUpdate { .. } => EntityKind::StockItem,
            ActionKind::RecipeCreate { .. }
            | ActionKind::RecipeUpdate { .. }
            | ActionKind::RecipeDelete { .. } => EntityKind::Recipe,
            ActionKind::OrderCompletion { .. } => EntityKind::Order,
        }
    }

    /// The business identifier of the targeted entity.
    pub fn entity_id(&self) -> &str {
        match self {
            ActionKind::StockUpdate { sku, .. }
            | ActionKind::StockAdjustment { sku, .. }
            | ActionKind::CostUpdate { sku, .. } => sku,
            ActionKind::RecipeCreate { recipe } | ActionKind::RecipeUpdate { recipe } => &recipe.id,
            ActionKind::RecipeDelete { recipe_id } => recipe_id,
            ActionKind::OrderCompletion { order_id, .. } => order_id,
        }
    }

    /// Stable label for logging and audit records.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::StockUpdate { .. } => "stock_update",
            ActionKind::StockAdjustment { .. } => "stock_adjustment",
            ActionKind::RecipeCreate { .. } => "recipe_create",
            ActionKind::RecipeUpdate { .. } => "recipe_update",
            ActionKind::RecipeDelete { .. } => "recipe_delete",
            ActionKind::OrderCompletion { .. } => "order_completion",
            ActionKind::CostUpdate { .. } => "cost_update",
        }
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Per-action bookkeeping carried alongside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActionMetadata {
    /// Id of the user who performed the operation. Empty when unattributed.
    pub user_id: String,

    /// Id of the device the action originated on.
    pub device_id: String,

    /// Processing priority.
    pub priority: ActionPriority,

    /// Delivery attempts made so far. Never exceeds `max_retries`.
    pub retry_count: u32,

    /// Attempt limit before the action is marked failed.
    pub max_retries: u32,

    /// Strategy applied when the gateway reports a conflict.
    pub conflict_policy: ConflictPolicy,
}

// =============================================================================
// Offline Action
// =============================================================================

/// A pending state-changing operation destined for the remote system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfflineAction {
    /// Unique identifier (UUID v4), generated at enqueue time.
    pub id: String,

    /// Creation time.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,

    /// The operation and its typed payload.
    pub kind: ActionKind,

    /// Ownership, priority and retry bookkeeping.
    pub metadata: ActionMetadata,

    /// Ids of actions this one logically depends on.
    ///
    /// Carried as data only: the batch processor does not order by
    /// dependencies. See DESIGN.md.
    pub dependencies: Vec<String>,

    /// Current queue status.
    pub status: ActionStatus,

    /// Most recent delivery error, if any.
    pub last_error: Option<String>,
}

impl OfflineAction {
    /// Creates a new pending action with a fresh id and timestamp.
    pub fn new(kind: ActionKind, metadata: ActionMetadata) -> Self {
        OfflineAction {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            metadata,
            dependencies: Vec::new(),
            status: ActionStatus::Pending,
            last_error: None,
        }
    }

    /// Attaches dependency ids (builder style).
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Marks the action as currently being delivered.
    pub fn mark_syncing(&mut self) {
        self.status = ActionStatus::Syncing;
    }

    /// Marks the action as delivered.
    pub fn mark_completed(&mut self) {
        self.status = ActionStatus::Completed;
        self.last_error = None;
    }

    /// Marks the action as conflicted.
    pub fn mark_conflict(&mut self) {
        self.status = ActionStatus::Conflict;
    }

    /// Records a failed delivery attempt.
    ///
    /// Increments the retry counter; if the limit is reached the action
    /// becomes `Failed` (terminal until cleared), otherwise it reverts to
    /// `Pending` for the next pass.
    ///
    /// ## Returns
    /// `true` if retries are now exhausted and the action is `Failed`.
    pub fn record_failure(&mut self, error: &str) -> bool {
        self.metadata.retry_count = self
            .metadata
            .retry_count
            .saturating_add(1)
            .min(self.metadata.max_retries);
        self.last_error = Some(error.to_string());

        if self.metadata.retry_count >= self.metadata.max_retries {
            self.status = ActionStatus::Failed;
            true
        } else {
            self.status = ActionStatus::Pending;
            false
        }
    }

    /// Re-queues a conflicted action under a new policy.
    ///
    /// Resets the retry counter so the action gets a full set of attempts
    /// under the chosen policy.
    pub fn reset_for_retry(&mut self, policy: ConflictPolicy) {
        self.metadata.conflict_policy = policy;
        self.metadata.retry_count = 0;
        self.status = ActionStatus::Pending;
        self.last_error = None;
    }

    /// True once the retry limit has been reached.
    pub fn retries_exhausted(&self) -> bool {
        self.metadata.retry_count >= self.metadata.max_retries
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(max_retries: u32) -> ActionMetadata {
        ActionMetadata {
            user_id: "user-1".into(),
            device_id: "device-1".into(),
            priority: ActionPriority::Medium,
            retry_count: 0,
            max_retries,
            conflict_policy: ConflictPolicy::ServerWins,
        }
    }

    fn stock_adjustment() -> ActionKind {
        ActionKind::StockAdjustment {
            sku: "FLOUR-01".into(),
            delta_milli: -2000,
            reason: AdjustmentReason::Waste,
        }
    }

    #[test]
    fn test_priority_weights_order() {
        assert!(ActionPriority::Critical < ActionPriority::High);
        assert!(ActionPriority::High < ActionPriority::Medium);
        assert!(ActionPriority::Medium < ActionPriority::Low);
        assert_eq!(ActionPriority::Critical.weight(), 1);
        assert_eq!(ActionPriority::Low.weight(), 4);
    }

    #[test]
    fn test_entity_mapping() {
        let kind = stock_adjustment();
        assert_eq!(kind.entity_kind(), EntityKind::StockItem);
        assert_eq!(kind.entity_id(), "FLOUR-01");
        assert_eq!(kind.label(), "stock_adjustment");

        let order = ActionKind::OrderCompletion {
            order_id: "order-9".into(),
            deductions: vec![],
        };
        assert_eq!(order.entity_kind(), EntityKind::Order);
        assert_eq!(order.entity_id(), "order-9");
    }

    #[test]
    fn test_record_failure_reverts_to_pending_until_exhausted() {
        let mut action = OfflineAction::new(stock_adjustment(), metadata(3));

        assert!(!action.record_failure("timeout"));
        assert_eq!(action.status, ActionStatus::Pending);
        assert_eq!(action.metadata.retry_count, 1);

        assert!(!action.record_failure("timeout"));
        assert!(action.record_failure("timeout"));
        assert_eq!(action.status, ActionStatus::Failed);
        assert_eq!(action.metadata.retry_count, 3);
        assert!(action.retries_exhausted());

        // Further failures never push the counter past the limit.
        action.record_failure("timeout");
        assert_eq!(action.metadata.retry_count, 3);
    }

    #[test]
    fn test_reset_for_retry_clears_counter_and_policy() {
        let mut action = OfflineAction::new(stock_adjustment(), metadata(2));
        action.record_failure("x");
        action.mark_conflict();

        action.reset_for_retry(ConflictPolicy::ClientWins);
        assert_eq!(action.status, ActionStatus::Pending);
        assert_eq!(action.metadata.retry_count, 0);
        assert_eq!(action.metadata.conflict_policy, ConflictPolicy::ClientWins);
        assert!(action.last_error.is_none());
    }

    #[test]
    fn test_kind_serializes_with_type_tag() {
        let json = serde_json::to_value(stock_adjustment()).unwrap();
        assert_eq!(json["type"], "stock_adjustment");
        assert_eq!(json["sku"], "FLOUR-01");
    }

    #[test]
    fn test_resolution_choice_policy_mapping() {
        assert_eq!(
            ResolutionChoice::ClientWins.as_policy(),
            Some(ConflictPolicy::ClientWins)
        );
        assert_eq!(ResolutionChoice::Skip.as_policy(), None);
        assert_eq!(
            ResolutionChoice::from(ConflictPolicy::Merge),
            ResolutionChoice::Merge
        );
    }
}
