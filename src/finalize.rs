//! Finalization Channel
//!
//! A finalizer is registered against an object address and a callback; once
//! a collection cycle proves the object unreachable, its callback moves
//! from the pending table into a ready queue that the embedder drains on
//! its own schedule (never inline during the cycle itself — finalizers may
//! run arbitrary mutator code, which must not happen while the collector
//! holds its own internal locks).

use crossbeam::queue::SegQueue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

type Callback = Box<dyn FnOnce() + Send>;

/// Pending and ready finalizer state, shared by the collector and the
/// embedder-facing drain hook.
pub struct FinalizationChannel {
    pending: RwLock<HashMap<usize, Callback>>,
    ready: SegQueue<Callback>,
    enabled: AtomicBool,
}

impl Default for FinalizationChannel {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FinalizationChannel {
    pub fn new(enabled: bool) -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
            ready: SegQueue::new(),
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Register a finalizer for `addr`. Overwrites any finalizer already
    /// registered for the same address.
    pub fn register(&self, addr: usize, callback: Callback) {
        self.pending.write().insert(addr, callback);
    }

    /// Cancel a pending finalizer, e.g. because the embedder explicitly
    /// freed the object outside the collector's knowledge. Returns whether
    /// one was actually pending.
    pub fn cancel(&self, addr: usize) -> bool {
        self.pending.write().remove(&addr).is_some()
    }

    /// Move every pending finalizer whose object `is_live` reports as dead
    /// into the ready queue. Called by the collector once marking for a
    /// cycle is complete.
    pub fn sweep(&self, is_live: impl Fn(usize) -> bool) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let mut pending = self.pending.write();
        let dead: Vec<usize> = pending
            .keys()
            .copied()
            .filter(|addr| !is_live(*addr))
            .collect();
        for addr in &dead {
            if let Some(callback) = pending.remove(addr) {
                self.ready.push(callback);
            }
        }
        dead.len()
    }

    /// Run every ready finalizer on the calling thread, in no particular
    /// order. Must be called outside any collector-internal lock.
    pub fn drain(&self) -> usize {
        let mut count = 0;
        while let Some(callback) = self.ready.pop() {
            callback();
            count += 1;
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }
}
