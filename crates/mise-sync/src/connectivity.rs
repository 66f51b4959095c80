//! # Connectivity Monitor
//!
//! Reports whether the terminal can currently reach the remote system and
//! emits a transition event when connectivity is regained. The engine only
//! acts on the offline→online edge: a pass is triggered on reconnection,
//! and passes are skipped entirely while offline.

use tokio::sync::watch;

// =============================================================================
// Monitor Trait
// =============================================================================

/// Connectivity source consumed by the engine.
///
/// Implemented by the host over its actual network probe; the provided
/// [`SharedConnectivity`] is enough for hosts that flip the flag themselves
/// and for tests.
pub trait ConnectivityMonitor: Send + Sync {
    /// Current online state.
    fn is_online(&self) -> bool;

    /// Subscribes to online-state changes.
    ///
    /// The receiver's value is the current state; the engine watches for
    /// a `false` → `true` transition to trigger a reconnection sync pass.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

// =============================================================================
// Shared Connectivity
// =============================================================================

/// A settable connectivity flag backed by a watch channel.
#[derive(Debug)]
pub struct SharedConnectivity {
    tx: watch::Sender<bool>,
}

impl SharedConnectivity {
    /// Creates a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        SharedConnectivity { tx }
    }

    /// Updates the online state, notifying subscribers on change.
    pub fn set_online(&self, online: bool) {
        // send_if_modified keeps subscribers from seeing no-op updates
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }
}

impl ConnectivityMonitor for SharedConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_online_notifies_subscribers() {
        let monitor = SharedConnectivity::new(false);
        let mut rx = monitor.subscribe();

        assert!(!monitor.is_online());

        monitor.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_no_op_update_does_not_notify() {
        let monitor = SharedConnectivity::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
