//! Process-wide exclusivity for dialog-driven operations.
//!
//! Export, open and save-as each hold the gate for their whole duration.
//! A caller that finds it taken is turned away immediately; nothing waits in
//! line, so a double click never starts a second dialog.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-permit, non-queuing, non-reentrant lock shared by clones
#[derive(Debug, Clone)]
pub struct BusyGate {
    permit: Arc<Semaphore>,
}

/// Held while an exclusive operation runs; dropping it reopens the gate
#[derive(Debug)]
pub struct BusyGuard {
    _permit: OwnedSemaphorePermit,
}

impl Default for BusyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyGate {
    pub fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the gate, or `None` if another operation holds it.
    pub fn try_enter(&self) -> Option<BusyGuard> {
        Arc::clone(&self.permit)
            .try_acquire_owned()
            .ok()
            .map(|permit| BusyGuard { _permit: permit })
    }
}
