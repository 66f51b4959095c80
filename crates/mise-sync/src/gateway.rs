//! # Remote Gateway
//!
//! The network boundary of the sync engine. One operation per action kind;
//! every call resolves to success, a retryable failure, or a conflict
//! signal distinguishable from a retryable failure.
//!
//! The engine never talks to the network directly - a host application
//! implements [`RemoteGateway`] over its actual transport and injects it at
//! construction time, which is also what lets the tests script outcomes.

use async_trait::async_trait;
use thiserror::Error;

use mise_core::{AdjustmentReason, ConflictType, Recipe, StockDeduction};

// =============================================================================
// Gateway Error
// =============================================================================

/// Outcome of a failed gateway call.
///
/// ## Categorization
/// - `Unavailable` / `Rejected` drive the action's retry counter
/// - `Conflict` routes to the conflict resolver instead of retrying
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote system could not be reached (network down, 5xx, timeout).
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The remote system refused the operation for a non-conflict reason.
    #[error("Operation rejected: {0}")]
    Rejected(String),

    /// The remote reported a state divergence for the targeted entity.
    #[error("Conflict reported by remote: {conflict_type:?}")]
    Conflict {
        /// Category of divergence.
        conflict_type: ConflictType,

        /// The server's version of the entity, for resolution UI.
        server_data: serde_json::Value,
    },
}

impl GatewayError {
    /// Returns true if the operation should be retried on a later pass.
    pub fn is_retryable(&self) -> bool {
        !self.is_conflict()
    }

    /// Returns true if this is a conflict signal.
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatewayError::Conflict { .. })
    }
}

/// Result type for gateway operations.
pub type GatewayResult = Result<(), GatewayError>;

// =============================================================================
// Remote Gateway Trait
// =============================================================================

/// Per-entity-type network operations against the system of record.
///
/// Delivery semantics are at-least-once: the engine may repeat a call that
/// actually succeeded (e.g., after a timeout), so implementations are
/// expected to be idempotent on their side.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Sets an item's stock level to an absolute quantity.
    async fn update_stock(&self, sku: &str, quantity_milli: i64) -> GatewayResult;

    /// Applies a signed stock delta with a reason code.
    async fn adjust_stock(
        &self,
        sku: &str,
        delta_milli: i64,
        reason: AdjustmentReason,
    ) -> GatewayResult;

    /// Creates a recipe.
    async fn create_recipe(&self, recipe: &Recipe) -> GatewayResult;

    /// Replaces a recipe.
    async fn update_recipe(&self, recipe: &Recipe) -> GatewayResult;

    /// Deletes a recipe by id.
    async fn delete_recipe(&self, recipe_id: &str) -> GatewayResult;

    /// Marks an order complete and applies its inventory deductions.
    async fn complete_order(&self, order_id: &str, deductions: &[StockDeduction])
        -> GatewayResult;

    /// Updates an item's unit cost.
    async fn update_cost(&self, sku: &str, unit_cost_cents: i64) -> GatewayResult;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        assert!(GatewayError::Unavailable("offline".into()).is_retryable());
        assert!(GatewayError::Rejected("bad payload".into()).is_retryable());

        let conflict = GatewayError::Conflict {
            conflict_type: ConflictType::VersionMismatch,
            server_data: serde_json::json!({"version": 7}),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_retryable());
    }
}
