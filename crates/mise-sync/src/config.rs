//! # Sync Configuration
//!
//! Tunables for the sync engine.
//!
//! The engine is embedded inside a host application, so configuration is
//! plain data handed in at construction time - there is no file or
//! environment layer here. Hosts that load config from disk deserialize
//! straight into [`SyncConfig`] (everything derives serde).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineResult, SyncError};

// =============================================================================
// Device Configuration
// =============================================================================

/// Identity of the terminal this engine instance runs on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable device id, stamped onto every action this device enqueues.
    ///
    /// UUID v4: globally unique without coordination, safe to generate
    /// offline.
    pub id: String,

    /// Human-readable device name (e.g., "Front Register").
    pub name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: "pos-terminal".to_string(),
        }
    }
}

// =============================================================================
// Engine Settings
// =============================================================================

/// Behavioral tunables for queue processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Maximum actions processed per sync pass.
    /// Default: 50
    pub batch_size: usize,

    /// Seconds between periodic sync passes while online.
    /// Default: 300 (5 minutes)
    pub sync_interval_secs: u64,

    /// Default retry limit for enqueued actions (overridable per action).
    /// Default: 3
    pub default_max_retries: u32,

    /// Per-gateway-call timeout in seconds. A call that exceeds this counts
    /// as a retryable failure instead of stalling the batch.
    /// Default: 30
    pub op_timeout_secs: u64,

    /// Per-action duration estimate used for the completion-time heuristic.
    /// Default: 2000ms
    pub per_action_estimate_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            batch_size: 50,
            sync_interval_secs: 300,
            default_max_retries: 3,
            op_timeout_secs: 30,
            per_action_estimate_ms: 2000,
        }
    }
}

// =============================================================================
// Sync Configuration
// =============================================================================

/// Complete engine configuration.
///
/// ## Example
/// ```rust
/// use mise_sync::config::SyncConfig;
///
/// let config = SyncConfig::default()
///     .with_batch_size(10)
///     .with_sync_interval_secs(60);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Terminal identity.
    pub device: DeviceConfig,

    /// Queue-processing tunables.
    pub engine: EngineSettings,
}

impl SyncConfig {
    /// Sets the per-pass batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.engine.batch_size = batch_size;
        self
    }

    /// Sets the periodic sync interval.
    pub fn with_sync_interval_secs(mut self, secs: u64) -> Self {
        self.engine.sync_interval_secs = secs;
        self
    }

    /// Sets the default retry limit.
    pub fn with_default_max_retries(mut self, retries: u32) -> Self {
        self.engine.default_max_retries = retries;
        self
    }

    /// Sets the per-operation timeout.
    pub fn with_op_timeout_secs(mut self, secs: u64) -> Self {
        self.engine.op_timeout_secs = secs;
        self
    }

    /// Sets the device id.
    pub fn with_device_id(mut self, id: impl Into<String>) -> Self {
        self.device.id = id.into();
        self
    }

    /// Validates the configuration.
    ///
    /// ## Rules
    /// - Device id must not be empty
    /// - Batch size, interval, timeout and retry limit must be non-zero
    pub fn validate(&self) -> EngineResult<()> {
        if self.device.id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("Device id must not be empty".into()));
        }
        if self.engine.batch_size == 0 {
            return Err(SyncError::InvalidConfig("Batch size must be at least 1".into()));
        }
        if self.engine.sync_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "Sync interval must be at least 1 second".into(),
            ));
        }
        if self.engine.op_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "Operation timeout must be at least 1 second".into(),
            ));
        }
        if self.engine.default_max_retries == 0 {
            return Err(SyncError::InvalidConfig(
                "Retry limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.batch_size, 50);
        assert_eq!(config.engine.default_max_retries, 3);
        assert!(!config.device.id.is_empty());
    }

    #[test]
    fn test_default_device_ids_are_unique() {
        let a = DeviceConfig::default();
        let b = DeviceConfig::default();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_validate_rejects_zero_tunables() {
        assert!(SyncConfig::default().with_batch_size(0).validate().is_err());
        assert!(SyncConfig::default()
            .with_sync_interval_secs(0)
            .validate()
            .is_err());
        assert!(SyncConfig::default()
            .with_default_max_retries(0)
            .validate()
            .is_err());
        assert!(SyncConfig::default().with_device_id("").validate().is_err());
    }
}
