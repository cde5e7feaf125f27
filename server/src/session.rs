//! Per-connection context shared between a client's threads.

use shared::PlayerAction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Written by the receiver, read by the ghost mover and the sender.
#[derive(Debug)]
pub struct Session {
    running: AtomicBool,
    requested: Mutex<Option<PlayerAction>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A running session with no direction requested yet.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            requested: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signals every thread of the connection to finish its current step and
    /// exit. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Direction the ghost mover should try next, if any.
    pub fn requested(&self) -> Option<PlayerAction> {
        *self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the pending direction; the latest request always wins.
    pub fn set_requested(&self, action: PlayerAction) {
        *self.requested.lock().unwrap_or_else(PoisonError::into_inner) = Some(action);
    }

    /// Clears the requested direction only if it still equals `failed`, so a
    /// newer request that raced with the failed move survives.
    pub fn clear_if(&self, failed: PlayerAction) -> bool {
        let mut requested = self.requested.lock().unwrap_or_else(PoisonError::into_inner);
        if *requested == Some(failed) {
            *requested = None;
            true
        } else {
            false
        }
    }
}
