//! # mise-sync: Offline Action Sync Engine for Mise POS
//!
//! This crate keeps the terminal's locally cached business state (stock
//! levels, recipes, completed orders) consistent with the remote system of
//! record under intermittent connectivity.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     SyncEngine (Orchestrator)                    │  │
//! │  │                                                                  │  │
//! │  │  Explicit instance with injected collaborators; the host wires  │  │
//! │  │  in real implementations, tests substitute fakes                │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  ActionQueue   │  │ConflictResolver│  │  StatusReporter        │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Priority order │  │ Records        │  │ Derived counts +       │    │
//! │  │ Snapshot per   │  │ divergence,    │  │ synchronous listener   │    │
//! │  │ mutation       │  │ applies choice │  │ notifications          │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  COLLABORATOR TRAITS (implemented by the host):                        │
//! │  ────────────────────────────────────────────                          │
//! │  • RemoteGateway       - per-entity-type network operations            │
//! │  • DurableStore        - queue snapshot + last-sync timestamp          │
//! │  • ConnectivityMonitor - online flag + reconnection event              │
//! │  • AuditSink           - fire-and-forget compliance records            │
//! │                                                                         │
//! │  DELIVERY SEMANTICS:                                                   │
//! │  • At-least-once: a crash mid-delivery re-sends on restart             │
//! │  • Idempotency is the remote gateway's job                             │
//! │  • No cross-device ordering guarantees                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - Main `SyncEngine` orchestrator and sync passes
//! - [`queue`] - Priority-ordered, persisted action queue
//! - [`conflict`] - Conflict recording and resolution
//! - [`status`] - Derived status and subscriptions
//! - [`gateway`] - Remote gateway trait and outcome types
//! - [`connectivity`] - Connectivity monitor trait
//! - [`store`] - Durable store trait and provided implementations
//! - [`audit`] - Audit sink trait and event records
//! - [`config`] - Engine configuration
//! - [`error`] - Engine error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mise_sync::{SharedConnectivity, SqliteDurableStore, SyncConfig, SyncEngine};
//!
//! let engine = SyncEngine::builder(SyncConfig::default())
//!     .with_gateway(Arc::new(HttpGateway::new(api)))
//!     .with_store(Arc::new(SqliteDurableStore::new(db)))
//!     .with_connectivity(connectivity.clone())
//!     .build()?;
//!
//! engine.start().await?;
//!
//! // Queue work; it syncs now or when connectivity returns.
//! let id = engine.enqueue(kind, Default::default()).await?;
//!
//! // Observe.
//! let status = engine.get_sync_status().await;
//! println!("pending: {}", status.pending_actions);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod config;
pub mod conflict;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod status;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

// Engine surface
pub use engine::{EnqueueOptions, SyncEngine, SyncEngineBuilder, SyncResult};
pub use error::{EngineResult, SyncError};
pub use status::{StatusReporter, Subscription, SyncStatus};

// Collaborator traits and provided implementations
pub use audit::{AuditEvent, AuditEventKind, AuditSink, NoOpAuditSink, TracingAuditSink};
pub use config::{DeviceConfig, EngineSettings, SyncConfig};
pub use connectivity::{ConnectivityMonitor, SharedConnectivity};
pub use gateway::{GatewayError, GatewayResult, RemoteGateway};
pub use store::{
    DurableStore, MemoryStore, SqliteDurableStore, LAST_SYNC_KEY, QUEUE_SNAPSHOT_KEY,
};

// Core domain types, re-exported so hosts depend on one crate
pub use mise_core::{
    ActionKind, ActionPriority, ActionStatus, ConflictPolicy, ConflictResolution, ConflictType,
    OfflineAction, ResolutionChoice,
};
