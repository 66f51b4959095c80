//! # mise-core: Pure Domain Model for Mise POS
//!
//! This crate is the foundation of the Mise POS sync engine. It contains the
//! offline action model and its business rules as pure types with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mise POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Terminal UI (out of scope)                   │   │
//! │  │    Inventory screens ──► Recipe editor ──► Order flow          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mise-sync (Sync Engine)                      │   │
//! │  │       queue, orchestrator, conflict resolution, status          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mise-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────────────────────┐ │   │
//! │  │   │  action   │  │   types   │  │        validation          │ │   │
//! │  │   │ Offline-  │  │  Recipe   │  │  SKU / recipe / deduction  │ │   │
//! │  │   │  Action   │  │ Deduction │  │          rules             │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`action`] - The offline action model (priorities, statuses, conflicts)
//! - [`types`] - Payload types (Recipe, StockDeduction, reason codes)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Quantities**: Quantities in thousandths, money in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod action;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mise_core::OfflineAction` instead of
// `use mise_core::action::OfflineAction`

pub use action::{
    ActionKind, ActionMetadata, ActionPriority, ActionStatus, ConflictPolicy, ConflictResolution,
    ConflictType, OfflineAction, ResolutionChoice,
};
pub use error::ValidationError;
pub use types::{AdjustmentReason, EntityKind, Recipe, RecipeIngredient, StockDeduction};
