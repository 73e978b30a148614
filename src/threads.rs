//! Thread Registry
//!
//! Tracks every mutator thread the collector knows about: its cold stack
//! bound (for ambiguous stack scanning) and its two allocation points, one
//! per pool. A thread that never calls [`ThreadRegistry::thread_add`] is
//! invisible to the collector — its stack is never scanned and it must not
//! allocate.

use crate::allocator::AllocationPoint;
use crate::error::{IgcError, Result};
use crate::heap::pool::Pool;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::thread::ThreadId;

/// Everything the collector tracks about one mutator thread.
pub struct ThreadRecord {
    pub cold_stack_end: usize,
    pub cons_ap: AllocationPoint,
    pub symbol_ap: AllocationPoint,
}

/// The set of all currently-registered mutator threads.
///
/// Backed by an `IndexMap` rather than a `HashMap` so that
/// [`ThreadRegistry::for_each_stack_bound`] and any full-registry walk visit
/// threads in registration order — root scanning does not depend on this,
/// but it makes trace output and test assertions deterministic across runs.
pub struct ThreadRegistry {
    threads: RwLock<IndexMap<ThreadId, Arc<ThreadRecord>>>,
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(IndexMap::new()),
        }
    }

    /// Register the calling thread, recording `cold_stack_end` as the far
    /// (oldest-frame) bound of its stack for ambiguous scanning.
    pub fn thread_add(
        &self,
        id: ThreadId,
        cold_stack_end: usize,
        cons_pool: Arc<Pool>,
        symbol_pool: Arc<Pool>,
        epoch: Arc<AtomicU64>,
    ) -> Result<()> {
        let mut threads = self.threads.write();
        if threads.contains_key(&id) {
            return Err(IgcError::InvariantViolation(
                "thread is already registered".to_string(),
            ));
        }
        threads.insert(
            id,
            Arc::new(ThreadRecord {
                cold_stack_end,
                cons_ap: AllocationPoint::new(cons_pool, epoch.clone()),
                symbol_ap: AllocationPoint::new(symbol_pool, epoch),
            }),
        );
        Ok(())
    }

    pub fn thread_remove(&self, id: ThreadId) -> Result<()> {
        self.threads
            .write()
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| IgcError::InvariantViolation("thread is not registered".to_string()))
    }

    pub fn record(&self, id: ThreadId) -> Option<Arc<ThreadRecord>> {
        self.threads.read().get(&id).cloned()
    }

    /// Visit `(cold_stack_end)` for every registered thread. Used by the
    /// ambiguous stack scanner; the near (hot) bound is supplied by the
    /// caller at scan time since it changes on every call frame.
    pub fn for_each_stack_bound<F: FnMut(usize)>(&self, mut f: F) {
        for record in self.threads.read().values() {
            f(record.cold_stack_end);
        }
    }

    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
