//! Embedder Hook Surface
//!
//! The entry points an embedding runtime calls: thread and root lifecycle,
//! the handful of growable exact-root structures the embedder owns
//! (specpdl, face cache, glyph matrices, the read stack), allocation, the
//! idle tick, and the inhibit-GC scope. [`Gc`] is the one handle an
//! embedder holds; everything else in this crate is reached through it.

use crate::allocator::AllocationPoint;
use crate::collector::Collector;
use crate::config::IgcConfig;
use crate::error::{IgcError, Result};
use crate::lifecycle::{InhibitGuard, LifecycleController};
use crate::object::cons::{self, CONS_SIZE};
use crate::object::symbol::{self, Redirect, SYMBOL_SIZE};
use crate::roots::{ExactScanKind, RootHandle};
use crate::tagged::{self, Tag};
use crate::trace::GcEvent;
use std::sync::Arc;

const MAX_ALLOCATION_RETRIES: u32 = 64;

/// The embedder-facing handle onto a running collector.
pub struct Gc {
    lifecycle: Arc<LifecycleController>,
}

impl Gc {
    /// Build a fresh collector from `config` and start it at `Idle`.
    pub fn init(config: IgcConfig) -> Result<Self> {
        let collector = Arc::new(Collector::new(config)?);
        Ok(Self {
            lifecycle: Arc::new(LifecycleController::new(collector)),
        })
    }

    fn collector(&self) -> &Collector {
        self.lifecycle.collector()
    }

    /// Register a generic ambiguous memory area as a root (e.g. a static
    /// data segment the embedder knows may hold tagged values).
    pub fn mem_insert(&self, start: usize, end: usize) -> Result<RootHandle> {
        let handle = self
            .lifecycle
            .with_parked(|c| c.roots().register_ambiguous(start, end))?;
        self.collector().trace().push(GcEvent::RootRegistered);
        Ok(handle)
    }

    pub fn mem_delete(&self, handle: RootHandle) -> Result<()> {
        self.lifecycle
            .with_parked(|c| c.roots().deregister(handle))?;
        self.collector().trace().push(GcEvent::RootDeregistered);
        Ok(())
    }

    /// Register the calling thread, giving it its own allocation points.
    pub fn thread_add(&self, cold_stack_end: usize) -> Result<()> {
        let collector = self.collector();
        let id = std::thread::current().id();
        let epoch = collector.epoch_handle();
        self.lifecycle.with_parked(|c| {
            c.threads().thread_add(
                id,
                cold_stack_end,
                c.arena().cons().clone(),
                c.arena().symbol().clone(),
                epoch.clone(),
            )
        })?;
        collector.trace().push(GcEvent::ThreadAdded);
        Ok(())
    }

    pub fn thread_remove(&self) -> Result<()> {
        let id = std::thread::current().id();
        self.lifecycle
            .with_parked(|c| c.threads().thread_remove(id))?;
        self.collector().trace().push(GcEvent::ThreadRemoved);
        Ok(())
    }

    /// The specpdl stack grew (or was first allocated): deregister its old
    /// exact root, if any, and register the new bounds.
    pub fn grow_specpdl(
        &self,
        old: Option<RootHandle>,
        start: usize,
        end: usize,
    ) -> Result<RootHandle> {
        self.replace_exact_root(old, start, end, ExactScanKind::Flat)
    }

    /// A specbinding slot below the current stack pointer is no longer
    /// live. This core's exact scanners only walk the committed range
    /// `[start, end)` of a root, so there is no bookkeeping to do beyond
    /// recording the event for diagnostics.
    pub fn specbinding_unused(&self) {
        self.collector().trace().push(GcEvent::RootDeregistered);
    }

    /// Each entry in `[start, end)` is a `(ptr, len)` pair addressing one
    /// face's lface reference vector; see [`ExactScanKind::FaceCache`].
    pub fn make_face_cache(&self, start: usize, end: usize) -> Result<RootHandle> {
        self.register_exact(start, end, ExactScanKind::FaceCache)
    }

    pub fn free_face_cache(&self, handle: RootHandle) -> Result<()> {
        self.deregister(handle)
    }

    pub fn face_cache_change(
        &self,
        old: Option<RootHandle>,
        start: usize,
        end: usize,
    ) -> Result<RootHandle> {
        self.replace_exact_root(old, start, end, ExactScanKind::FaceCache)
    }

    /// `[start, end)` holds fixed-stride glyph records, `stride` words each,
    /// only the first word of which is a reference; see
    /// [`ExactScanKind::GlyphRow`].
    pub fn adjust_glyph_matrix(
        &self,
        old: Option<RootHandle>,
        start: usize,
        end: usize,
        stride: usize,
    ) -> Result<RootHandle> {
        self.replace_exact_root(old, start, end, ExactScanKind::GlyphRow { stride })
    }

    pub fn free_glyph_matrix(&self, handle: RootHandle) -> Result<()> {
        self.deregister(handle)
    }

    /// `[start, end)` holds pointers into the reader's value stack; each
    /// slot is followed once and null slots are skipped, per
    /// [`ExactScanKind::StaticVector`].
    pub fn grow_read_stack(
        &self,
        old: Option<RootHandle>,
        start: usize,
        end: usize,
    ) -> Result<RootHandle> {
        self.replace_exact_root(old, start, end, ExactScanKind::StaticVector)
    }

    /// The embedder finished loading a pre-dumped heap image: its value
    /// words are exact roots until every reference inside it has either
    /// been promoted into the normal heap or proven unreachable.
    pub fn pdump_loaded(&self, start: usize, end: usize) -> Result<RootHandle> {
        self.register_exact(start, end, ExactScanKind::Flat)
    }

    fn register_exact(&self, start: usize, end: usize, kind: ExactScanKind) -> Result<RootHandle> {
        let handle = self
            .lifecycle
            .with_parked(|c| c.roots().register_exact(start, end, kind))?;
        self.collector().trace().push(GcEvent::RootRegistered);
        Ok(handle)
    }

    fn deregister(&self, handle: RootHandle) -> Result<()> {
        self.lifecycle
            .with_parked(|c| c.roots().deregister(handle))?;
        self.collector().trace().push(GcEvent::RootDeregistered);
        Ok(())
    }

    fn replace_exact_root(
        &self,
        old: Option<RootHandle>,
        start: usize,
        end: usize,
        kind: ExactScanKind,
    ) -> Result<RootHandle> {
        self.lifecycle.with_parked(|c| {
            if let Some(handle) = old {
                c.roots().deregister(handle)?;
            }
            c.roots().register_exact(start, end, kind)
        })
    }

    /// Advance the collector by one bounded idle slice.
    pub fn on_idle(&self) -> Result<()> {
        self.lifecycle.on_idle()?;
        Ok(())
    }

    /// Process anything the collector has queued for the mutator outside a
    /// cycle — currently just draining ready finalizers.
    pub fn handle_messages(&self) -> usize {
        self.collector().finalizers().drain()
    }

    /// Register a one-shot finalizer callback against an object's address.
    /// The callback moves to the ready queue once a collection cycle proves
    /// nothing still references the object, and runs the next time
    /// [`Gc::on_idle`] or [`Gc::handle_messages`] drains it.
    pub fn register_finalizer(&self, addr: usize, callback: Box<dyn FnOnce() + Send>) {
        self.collector().finalizers().register(addr, callback);
    }

    /// Cancel a pending finalizer, e.g. because the embedder freed the
    /// object through a path the collector does not see. Returns whether
    /// one was actually pending.
    pub fn cancel_finalizer(&self, addr: usize) -> bool {
        self.collector().finalizers().cancel(addr)
    }

    /// Suspend automatic collection for as long as the returned guard is
    /// alive.
    pub fn inhibit_gc(&self) -> InhibitGuard<'_> {
        self.lifecycle.inhibit()
    }

    /// Allocate and commit a cons cell on the calling thread's allocation
    /// point, returning a tagged `Cons` reference.
    pub fn make_cons(&self, car: usize, cdr: usize) -> Result<usize> {
        let record = self.calling_thread_record()?;
        let addr = self.allocate_with_retry(&record.cons_ap, CONS_SIZE, |addr| unsafe {
            cons::init(addr, car, cdr);
        })?;
        Ok(tagged::make_address(addr, Tag::Cons as usize))
    }

    /// Allocate and commit a symbol object, returning a tagged `Symbol`
    /// reference.
    #[allow(clippy::too_many_arguments)]
    pub fn alloc_symbol(
        &self,
        name: usize,
        function: usize,
        plist: usize,
        package: usize,
        value: usize,
        redirect: Redirect,
    ) -> Result<usize> {
        let record = self.calling_thread_record()?;
        let addr = self.allocate_with_retry(&record.symbol_ap, SYMBOL_SIZE, |addr| unsafe {
            symbol::init(addr, name, function, plist, package, value, redirect);
        })?;
        Ok(tagged::make_address(addr, Tag::Symbol as usize))
    }

    fn calling_thread_record(&self) -> Result<Arc<crate::threads::ThreadRecord>> {
        let id = std::thread::current().id();
        self.collector().threads().record(id).ok_or_else(|| {
            IgcError::InvariantViolation("calling thread is not registered".to_string())
        })
    }

    fn allocate_with_retry(
        &self,
        ap: &AllocationPoint,
        size: usize,
        init: impl Fn(usize),
    ) -> Result<usize> {
        for _ in 0..MAX_ALLOCATION_RETRIES {
            match ap.reserve(size) {
                Ok(addr) => {
                    init(addr);
                    match ap.commit(addr) {
                        Ok(()) => return Ok(addr),
                        Err(IgcError::CommitRetry) => continue,
                        Err(e) => return Err(e),
                    }
                }
                Err(IgcError::OutOfMemory { .. }) => {
                    self.lifecycle.request_gc();
                    self.lifecycle.run_cycle()?;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(IgcError::Internal(
            "allocation did not succeed within the retry budget".to_string(),
        ))
    }
}
