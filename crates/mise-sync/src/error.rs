//! # Sync Error Types
//!
//! Error types for the sync engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Persistence   │  │     Lookup              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Persistence    │  │  ActionNotFound         │ │
//! │  │  AlreadyStarted │  │  Serialization  │  │  ConflictNotFound       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Validation wraps mise-core::ValidationError - the only error enqueue  │
//! │  can raise. Gateway outcomes are never errors here: they are absorbed  │
//! │  into action status (see GatewayError in gateway.rs).                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use mise_core::ValidationError;
use mise_store::StoreError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, SyncError>;

/// Sync engine error type.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Network outcomes never appear here: they become action status
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid engine configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// The engine's background driver was already started.
    #[error("Sync engine already started")]
    AlreadyStarted,

    /// Action payload failed validation at enqueue time.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Durable store operation failed.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Queue snapshot could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// No queued action with the given id.
    #[error("Action not found: {0}")]
    ActionNotFound(String),

    /// No recorded conflict for the given action id.
    #[error("No conflict recorded for action: {0}")]
    ConflictNotFound(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if this error indicates a persistence problem.
    ///
    /// Persistence errors are tolerated by the engine: the queue keeps
    /// operating in memory and the degradation is surfaced through status.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            SyncError::Persistence(_) | SyncError::Serialization(_)
        )
    }

    /// Returns true if this error was caused by caller input.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_)
                | SyncError::ActionNotFound(_)
                | SyncError::ConflictNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_categorization() {
        assert!(SyncError::Persistence("disk full".into()).is_persistence());
        assert!(SyncError::Serialization("bad json".into()).is_persistence());
        assert!(!SyncError::ActionNotFound("a-1".into()).is_persistence());
    }

    #[test]
    fn test_caller_error_categorization() {
        assert!(SyncError::ActionNotFound("a-1".into()).is_caller_error());
        assert!(SyncError::ConflictNotFound("a-1".into()).is_caller_error());
        assert!(!SyncError::InvalidConfig("x".into()).is_caller_error());
    }
}
