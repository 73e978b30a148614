//! Lifecycle Controller
//!
//! The single serialization point between mutators and the collector.
//! `with_parked` and a requested collection cycle share one lock, so a
//! structural mutation (registering a root, adding a thread) and a
//! collection cycle can never run concurrently. `inhibit_gc` is a
//! reference-counted RAII scope: while any guard is alive, [`on_idle`]
//! never starts a new cycle, and the guard releases automatically on
//! unwind as well as on normal return.

use crate::collector::Collector;
use crate::error::Result;
use crate::stats::CycleStats;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Drives the collector's idle-tick and park/release protocol around a
/// shared [`Collector`].
pub struct LifecycleController {
    collector: Arc<Collector>,
    cycle_lock: Mutex<()>,
    inhibit_count: AtomicUsize,
    gc_requested: AtomicBool,
}

impl LifecycleController {
    pub fn new(collector: Arc<Collector>) -> Self {
        Self {
            collector,
            cycle_lock: Mutex::new(()),
            inhibit_count: AtomicUsize::new(0),
            gc_requested: AtomicBool::new(false),
        }
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    /// Ask for a collection cycle at the next opportunity; does not block.
    pub fn request_gc(&self) {
        self.gc_requested.store(true, Ordering::Release);
    }

    /// Run one collection cycle now, serialized against any in-flight
    /// `with_parked` mutation.
    pub fn run_cycle(&self) -> Result<CycleStats> {
        let _guard = self.cycle_lock.lock();
        self.gc_requested.store(false, Ordering::Release);
        self.collector.collect()
    }

    /// Perform a structural mutation with the collector guaranteed not to
    /// be mid-cycle. Mirrors the embedder's "park, mutate, release" idiom.
    pub fn with_parked<T>(&self, f: impl FnOnce(&Collector) -> Result<T>) -> Result<T> {
        let _guard = self.cycle_lock.lock();
        f(&self.collector)
    }

    /// Suspend automatic collection for as long as the returned guard is
    /// alive. Nests: the collector stays inhibited until every outstanding
    /// guard has dropped.
    pub fn inhibit(&self) -> InhibitGuard<'_> {
        self.inhibit_count.fetch_add(1, Ordering::AcqRel);
        InhibitGuard { controller: self }
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibit_count.load(Ordering::Acquire) > 0
    }

    /// Advance the collector by one bounded idle slice: always drain ready
    /// finalizers, then run a cycle only if one was requested and
    /// collection is not inhibited. Cheap when there is no work to do.
    pub fn on_idle(&self) -> Result<Option<CycleStats>> {
        self.collector.finalizers().drain();

        if self.is_inhibited() || !self.gc_requested.load(Ordering::Acquire) {
            return Ok(None);
        }
        Ok(Some(self.run_cycle()?))
    }
}

/// RAII guard returned by [`LifecycleController::inhibit`]. Decrements the
/// inhibit count on drop, including on an unwinding panic.
pub struct InhibitGuard<'a> {
    controller: &'a LifecycleController,
}

impl Drop for InhibitGuard<'_> {
    fn drop(&mut self) {
        self.controller
            .inhibit_count
            .fetch_sub(1, Ordering::AcqRel);
    }
}
