//! # Audit Sink
//!
//! Fire-and-forget event records for compliance logging. The engine emits
//! an event around every state-changing operation and never waits on or
//! checks the outcome: audit failures must never affect sync results.
//!
//! Audit log *content* generation lives with the host; the engine only
//! hands over the raw event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use mise_core::EntityKind;

// =============================================================================
// Audit Event
// =============================================================================

/// What happened to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// Action accepted into the queue.
    ActionEnqueued,

    /// Action delivered to the remote system.
    ActionSynced,

    /// Retries exhausted; action is terminal until cleared.
    ActionFailed,

    /// The gateway reported a divergence for this action.
    ConflictDetected,

    /// A resolution choice was applied to a conflicted action.
    ConflictResolved,

    /// A failed action was removed by an explicit user clear.
    FailedCleared,
}

/// One compliance record emitted around a state-changing operation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// What happened.
    pub kind: AuditEventKind,

    /// The affected action's id.
    pub action_id: String,

    /// Kind of entity the action targets.
    pub entity_kind: EntityKind,

    /// Business id of the targeted entity.
    pub entity_id: String,

    /// Device the event originated on.
    pub device_id: String,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Sink Trait
// =============================================================================

/// One-way consumer of audit events.
///
/// `record` must not block: implementations that do real I/O should hand
/// the event to a background task.
pub trait AuditSink: Send + Sync {
    /// Accepts an event. The engine ignores whatever happens next.
    fn record(&self, event: AuditEvent);
}

/// No-op sink for hosts without compliance requirements (and for tests).
pub struct NoOpAuditSink;

impl AuditSink for NoOpAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Sink that forwards events to the tracing subscriber.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        debug!(
            kind = ?event.kind,
            action_id = %event.action_id,
            entity = %event.entity_kind,
            entity_id = %event.entity_id,
            "audit"
        );
    }
}
