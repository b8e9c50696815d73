//! Per-cash-box serialization of balance mutations.
//!
//! Each box id maps to its own mutex, so postings against one box are
//! linearized while different boxes proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Keyed lock table.
///
/// The table lock is only held long enough to look up or insert a box's
/// mutex; the box mutex is held for the whole critical section.
#[derive(Debug, Default)]
pub struct BoxGuards {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BoxGuards {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    /// Runs `f` while holding the guard for box `id`.
    ///
    /// Blocks until the guard is free. The guard is released on every exit
    /// path; a panic inside `f` leaves nothing half-written to protect (the
    /// mutex guards `()`), so a poisoned guard is simply taken over.
    pub fn with_guard<T, F>(&self, id: Uuid, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let lock = self.lock_for(id);
        let _held: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of boxes that have been guarded at least once.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
