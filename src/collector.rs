//! Collector State Machine and Fix Protocol Core
//!
//! The collector moves through `Idle -> Marking -> Relocating -> Idle` on
//! every cycle. `Idle` means the fix protocol never relocates anything — it
//! only rewrites words when an earlier relocation left a forwarding marker
//! behind. `Marking` records which pool objects roots and live objects
//! reach. `Relocating` copies marked objects that are not already in the
//! oldest generation into the next generation, leaving a forwarding marker
//! at the old location, and rewrites every reference the fix protocol
//! touches to point at the new location.

use crate::config::IgcConfig;
use crate::error::{IgcError, Result};
use crate::finalize::FinalizationChannel;
use crate::heap::pool::Pool;
use crate::heap::Arena;
use crate::object::Fixer;
use crate::roots::{ExactScanKind, RootRank, RootRegistry};
use crate::scan;
use crate::stats::CycleStats;
use crate::tagged::{self, Tag};
use crate::threads::ThreadRegistry;
use crate::trace::{GcEvent, TraceLog};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where the collector is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcState {
    Idle,
    Marking,
    Relocating,
}

/// Owns the arena, the root and thread registries, and the collector's own
/// mark/relocation state. The single point every hook and allocation
/// eventually calls into.
pub struct Collector {
    arena: Arena,
    roots: RootRegistry,
    threads: ThreadRegistry,
    state: RwLock<GcState>,
    epoch: Arc<AtomicU64>,
    mark_set: RwLock<HashSet<usize>>,
    /// Discovery order of everything in `mark_set`, oldest first: roots'
    /// direct referents, then their fields' referents, and so on. Replayed
    /// during relocation so every marked object's fields are fixed only
    /// after whatever referenced it has already had its own chance to move
    /// it — the same root-to-leaf order the marking worklist walked.
    mark_order: RwLock<Vec<usize>>,
    /// Worklist of newly-marked addresses still needing their own fields
    /// scanned. Drained to completion before relocation starts.
    mark_queue: Mutex<VecDeque<usize>>,
    stats: RwLock<CycleStats>,
    trace: TraceLog,
    finalizers: FinalizationChannel,
    config: IgcConfig,
}

impl Collector {
    pub fn new(config: IgcConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| IgcError::Configuration(e.to_string()))?;
        let arena = Arena::new(&config)?;
        let finalizers = FinalizationChannel::new(config.finalization_enabled);
        Ok(Self {
            arena,
            roots: RootRegistry::new(),
            threads: ThreadRegistry::new(),
            state: RwLock::new(GcState::Idle),
            epoch: Arc::new(AtomicU64::new(0)),
            mark_set: RwLock::new(HashSet::new()),
            mark_order: RwLock::new(Vec::new()),
            mark_queue: Mutex::new(VecDeque::new()),
            stats: RwLock::new(CycleStats::default()),
            trace: TraceLog::new(),
            finalizers,
            config,
        })
    }

    pub fn finalizers(&self) -> &FinalizationChannel {
        &self.finalizers
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn roots(&self) -> &RootRegistry {
        &self.roots
    }

    pub fn threads(&self) -> &ThreadRegistry {
        &self.threads
    }

    pub fn epoch_handle(&self) -> Arc<AtomicU64> {
        self.epoch.clone()
    }

    pub fn config(&self) -> &IgcConfig {
        &self.config
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    pub fn state(&self) -> GcState {
        *self.state.read()
    }

    /// Record `addr` as reachable. Returns whether it was newly marked —
    /// callers use this to enqueue it for its own fields to be scanned
    /// exactly once.
    fn mark(&self, addr: usize) -> bool {
        let newly_marked = self.mark_set.write().insert(addr);
        if newly_marked {
            self.mark_order.write().push(addr);
        }
        newly_marked
    }

    fn is_marked(&self, addr: usize) -> bool {
        self.mark_set.read().contains(&addr)
    }

    fn unmark(&self, addr: usize) {
        self.mark_set.write().remove(&addr);
    }

    /// The core fix-protocol step: decode `word`, resolve pool membership,
    /// and apply whatever the current phase requires. Immediates and
    /// references outside both pools pass through unchanged.
    fn fix_word(&self, word: usize) -> Result<usize> {
        if tagged::is_immediate(word) {
            return Ok(word);
        }
        let tag_raw = tagged::tag(word);
        let Some(tag) = Tag::from_raw(tag_raw) else {
            return Ok(word);
        };
        if tag == Tag::Other {
            return Ok(word);
        }

        let addr = tagged::address_of(word);
        let Some(pool) = self.arena.pool_containing(addr) else {
            return Ok(word);
        };

        if let Some(forwarded) = unsafe { pool.format().is_forwarded(addr) } {
            return Ok(tagged::make_address(forwarded, tag_raw));
        }

        match self.state() {
            GcState::Idle => Ok(word),
            GcState::Marking => {
                // Only an object that is itself reachable gets its own
                // fields scanned — scanning is keyed off the worklist, not
                // off which addresses are still physically committed.
                if self.mark(addr) {
                    self.mark_queue.lock().push_back(addr);
                }
                Ok(word)
            }
            GcState::Relocating => {
                if self.is_marked(addr) && !self.is_oldest_generation(pool, addr) {
                    let new_addr = self.relocate(pool, addr)?;
                    Ok(tagged::make_address(new_addr, tag_raw))
                } else {
                    Ok(word)
                }
            }
        }
    }

    fn is_oldest_generation(&self, pool: &Pool, addr: usize) -> bool {
        match pool.generation_index_containing(addr) {
            Some(idx) => pool.is_oldest(idx),
            None => true,
        }
    }

    /// Copy the object at `old` into the next generation, leave a forwarding
    /// marker behind, and update the mark set to track the new address.
    fn relocate(&self, pool: &Pool, old: usize) -> Result<usize> {
        let idx = pool
            .generation_index_containing(old)
            .ok_or_else(|| IgcError::InvalidPointer { address: old })?;
        let target = pool
            .next_generation(idx)
            .ok_or_else(|| IgcError::InvariantViolation(
                "relocation requested out of the oldest generation".to_string(),
            ))?;
        let size = pool.format().object_size();
        let new_addr = target
            .try_bump(size)
            .ok_or(IgcError::OutOfMemory { requested: size, available: 0 })?;

        unsafe {
            std::ptr::copy_nonoverlapping(old as *const u8, new_addr as *mut u8, size);
            pool.format().forward(old, new_addr);
        }
        self.unmark(old);
        self.mark(new_addr);
        Ok(new_addr)
    }

    /// Run one full collection cycle synchronously on the calling thread:
    /// mark every object reachable from roots, then relocate survivors that
    /// are not already in the oldest generation.
    pub fn collect(&self) -> Result<CycleStats> {
        let mut stats = CycleStats::default();
        self.trace.push(GcEvent::CycleStarted);

        *self.state.write() = GcState::Marking;
        self.mark_order.write().clear();
        self.scan_roots()?;
        self.drain_mark_queue()?;
        stats.marked = self.mark_set.read().len();

        let queued = self.finalizers.sweep(|addr| self.is_marked(addr));
        if queued > 0 {
            self.trace.push(GcEvent::FinalizerQueued);
        }

        *self.state.write() = GcState::Relocating;
        self.scan_roots()?;
        self.relocate_marked()?;
        stats.relocated = self
            .mark_set
            .read()
            .iter()
            .filter(|&&a| self.arena.pool_containing(a).is_some())
            .count();

        self.retire_evacuated_generations();

        self.mark_set.write().clear();
        *self.state.write() = GcState::Idle;
        self.epoch.fetch_add(1, Ordering::Release);

        self.trace.push(GcEvent::CycleFinished);
        *self.stats.write() = stats.clone();
        Ok(stats)
    }

    /// After relocation, every non-oldest generation that was fully
    /// evacuated is reset so its space can be reused by new allocations.
    fn retire_evacuated_generations(&self) {
        for pool in [self.arena.cons(), self.arena.symbol()] {
            let last = pool.generations().len().saturating_sub(1);
            for (idx, region) in pool.generations().iter().enumerate() {
                if idx != last {
                    region.reset();
                }
            }
        }
    }

    fn scan_roots(&self) -> Result<()> {
        let fixer = FixContext { collector: self };
        let mut error = None;
        self.roots.for_each(|start, end, rank| {
            if error.is_some() {
                return;
            }
            let result = match rank {
                RootRank::Ambiguous => scan::scan_ambiguous(start, end, &fixer),
                RootRank::Exact(kind) => scan::scan_exact(start, end, kind, &fixer),
            };
            if let Err(e) = result {
                error = Some(e);
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drain the mark worklist: pop a newly-marked address, scan only that
    /// one object's own fields. Scanning a field may mark a referent and
    /// push it onto the same queue, so this runs to a fixed point — every
    /// object reachable from a root gets scanned exactly once, and nothing
    /// unreachable is ever looked at.
    fn drain_mark_queue(&self) -> Result<()> {
        let fixer = FixContext { collector: self };
        loop {
            let addr = self.mark_queue.lock().pop_front();
            let Some(addr) = addr else {
                break;
            };
            if let Some(pool) = self.arena.pool_containing(addr) {
                pool.format().scan_one(addr, &fixer)?;
            }
        }
        Ok(())
    }

    /// Replay the marking worklist's discovery order to relocate every
    /// reachable object. Each entry is resolved through any forwarding
    /// marker a prior entry in the same order already left behind (a
    /// parent is always discovered, and therefore replayed, before the
    /// children its fields point to), then scanned at its current
    /// location so the fix protocol can relocate and fix whatever that
    /// object's own fields point to next.
    fn relocate_marked(&self) -> Result<()> {
        let fixer = FixContext { collector: self };
        let order = self.mark_order.read().clone();
        for old_addr in order {
            let Some(pool) = self.arena.pool_containing(old_addr) else {
                continue;
            };
            let current = unsafe { pool.format().is_forwarded(old_addr) }.unwrap_or(old_addr);
            pool.format().scan_one(current, &fixer)?;
        }
        Ok(())
    }
}

/// Adapts [`Collector::fix_word`] to the [`Fixer`] trait so both root
/// scanners and [`crate::object::ObjectFormat::scan`] can share it.
struct FixContext<'a> {
    collector: &'a Collector,
}

impl Fixer for FixContext<'_> {
    fn fix_slot(&self, slot_addr: usize) -> Result<()> {
        let word = unsafe { (slot_addr as *const usize).read() };
        let fixed = self.collector.fix_word(word)?;
        if fixed != word {
            unsafe {
                (slot_addr as *mut usize).write(fixed);
            }
        }
        Ok(())
    }
}
