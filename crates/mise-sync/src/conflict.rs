//! # Conflict Resolver
//!
//! Records gateway-reported divergences and applies the chosen resolution
//! back into the queue.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Conflict Resolution                                │
//! │                                                                         │
//! │  Gateway reports conflict for action                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ConflictResolution recorded                                           │
//! │    • local_data  = the action's payload                                │
//! │    • server_data = the gateway's report                                │
//! │    • recommended = the action's configured policy                      │
//! │       │                                                                 │
//! │       ▼  user (or host) picks a choice                                 │
//! │  ┌───────────────────────────┬──────────────────────────────────────┐  │
//! │  │ Skip                      │ any other choice                     │  │
//! │  │                           │                                      │  │
//! │  │ action removed from queue │ policy := choice                     │  │
//! │  │ resolution discarded      │ retry_count := 0                     │  │
//! │  │                           │ status := Pending (next pass retries)│  │
//! │  └───────────────────────────┴──────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::info;

use mise_core::{ConflictResolution, ConflictType, OfflineAction, ResolutionChoice};

// =============================================================================
// Conflict Resolver
// =============================================================================

/// Book of open conflicts, keyed by action id.
#[derive(Default)]
pub struct ConflictResolver {
    open: Vec<ConflictResolution>,
}

impl ConflictResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        ConflictResolver::default()
    }

    /// Records a conflict reported for `action`.
    ///
    /// The recommendation defaults to the action's configured policy. If a
    /// conflict is already open for this action (a re-sync conflicted
    /// again), the record is replaced with the fresh server data.
    pub fn record(
        &mut self,
        action: &OfflineAction,
        conflict_type: ConflictType,
        server_data: serde_json::Value,
    ) -> ConflictResolution {
        let resolution = ConflictResolution {
            action_id: action.id.clone(),
            conflict_type,
            local_data: serde_json::to_value(&action.kind).unwrap_or(serde_json::Value::Null),
            server_data,
            recommended: action.metadata.conflict_policy.into(),
            user_choice: None,
        };

        info!(
            action_id = %action.id,
            conflict_type = ?conflict_type,
            recommended = ?resolution.recommended,
            "Conflict recorded"
        );

        self.open.retain(|c| c.action_id != action.id);
        self.open.push(resolution.clone());
        resolution
    }

    /// Returns the open conflict for an action, if any.
    pub fn get(&self, action_id: &str) -> Option<&ConflictResolution> {
        self.open.iter().find(|c| c.action_id == action_id)
    }

    /// Removes and returns the open conflict for an action, stamping the
    /// choice that resolved it.
    pub fn take(
        &mut self,
        action_id: &str,
        choice: ResolutionChoice,
    ) -> Option<ConflictResolution> {
        let position = self.open.iter().position(|c| c.action_id == action_id)?;
        let mut resolution = self.open.remove(position);
        resolution.user_choice = Some(choice);
        Some(resolution)
    }

    /// All open conflicts, oldest first.
    pub fn open_conflicts(&self) -> &[ConflictResolution] {
        &self.open
    }

    /// Number of open conflicts.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// True when no conflicts are open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mise_core::{
        ActionKind, ActionMetadata, ActionPriority, AdjustmentReason, ConflictPolicy,
    };

    fn action(policy: ConflictPolicy) -> OfflineAction {
        OfflineAction::new(
            ActionKind::StockAdjustment {
                sku: "FLOUR-01".into(),
                delta_milli: -500,
                reason: AdjustmentReason::Waste,
            },
            ActionMetadata {
                user_id: "user-1".into(),
                device_id: "device-1".into(),
                priority: ActionPriority::High,
                retry_count: 1,
                max_retries: 3,
                conflict_policy: policy,
            },
        )
    }

    #[test]
    fn test_record_defaults_recommendation_from_policy() {
        let mut resolver = ConflictResolver::new();
        let action = action(ConflictPolicy::ClientWins);

        let resolution = resolver.record(
            &action,
            ConflictType::VersionMismatch,
            serde_json::json!({"version": 9}),
        );

        assert_eq!(resolution.recommended, ResolutionChoice::ClientWins);
        assert_eq!(resolution.local_data["type"], "stock_adjustment");
        assert_eq!(resolution.server_data["version"], 9);
        assert!(resolution.user_choice.is_none());
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_re_record_replaces_previous_entry() {
        let mut resolver = ConflictResolver::new();
        let action = action(ConflictPolicy::ServerWins);

        resolver.record(
            &action,
            ConflictType::VersionMismatch,
            serde_json::json!({"version": 1}),
        );
        resolver.record(
            &action,
            ConflictType::VersionMismatch,
            serde_json::json!({"version": 2}),
        );

        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.get(&action.id).unwrap().server_data["version"], 2);
    }

    #[test]
    fn test_take_stamps_choice_and_removes() {
        let mut resolver = ConflictResolver::new();
        let action = action(ConflictPolicy::Manual);
        resolver.record(&action, ConflictType::DeletedOnServer, serde_json::Value::Null);

        let resolved = resolver.take(&action.id, ResolutionChoice::Skip).unwrap();
        assert_eq!(resolved.user_choice, Some(ResolutionChoice::Skip));
        assert!(resolver.is_empty());
        assert!(resolver.take(&action.id, ResolutionChoice::Skip).is_none());
    }
}
