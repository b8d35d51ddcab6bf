use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ErrorCode;

/// Returned when a mutating action is attempted while another one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHeld;

impl LockHeld {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(self) -> ErrorCode {
        ErrorCode::ActionInProgress
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockHeld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: another action is still in progress", self.code().code())
    }
}

impl std::error::Error for LockHeld {}

/// Single-flight guard for mutating issue actions.
///
/// Cloning yields another handle onto the same flag, so every holder sees one
/// lock. Acquisition never waits: a held lock rejects the caller.
#[derive(Debug, Clone, Default)]
pub struct ActionLock {
    held: Arc<AtomicBool>,
}

impl ActionLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or fail immediately if someone else holds it.
    ///
    /// # Errors
    ///
    /// Returns [`LockHeld`] when the lock is already taken.
    pub fn try_acquire(&self) -> Result<ActionGuard, LockHeld> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LockHeld)?;
        tracing::trace!("action lock acquired");
        Ok(ActionGuard {
            held: Arc::clone(&self.held),
        })
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// RAII guard for a held [`ActionLock`]. Release also happens automatically on drop.
#[derive(Debug)]
#[must_use = "dropping the guard releases the lock immediately"]
pub struct ActionGuard {
    held: Arc<AtomicBool>,
}

impl ActionGuard {
    /// Explicitly release the lock.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
        tracing::trace!("action lock released");
    }
}
