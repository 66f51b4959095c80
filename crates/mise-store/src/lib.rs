//! # mise-store: State Persistence for Mise POS
//!
//! This crate provides durable storage for the sync engine. It uses SQLite
//! for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mise POS Data Flow                               │
//! │                                                                         │
//! │  mise-sync (queue mutation)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mise-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ StateRepo     │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (key-value)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ get/set/      │    │ 001_sync_    │  │   │
//! │  │   │ WAL mode      │    │ delete/keys   │    │ state.sql    │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (terminal-local), surviving process restarts              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Repository implementations (state key-value)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mise_store::{Database, StoreConfig};
//!
//! let db = Database::new(StoreConfig::new("path/to/mise.db")).await?;
//! db.state().set("sync.queue", "[]").await?;
//! let snapshot = db.state().get("sync.queue").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Database, StoreConfig};
pub use repository::state::StateRepository;
