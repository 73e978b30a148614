//! Allocation Points
//!
//! Each mutator thread owns one allocation point per pool. Allocating an
//! object is a two-step `reserve`/`commit` protocol: `reserve` bumps the
//! pool's youngest generation and hands back an address the caller may
//! write into immediately (the collector may scan it before `commit`
//! returns, so every slot must already hold a valid value word by the time
//! `reserve` returns control to the caller); `commit` finalizes the
//! allocation only if no relocation cycle ran between `reserve` and
//! `commit`. If one did, `commit` returns a retryable error and the caller
//! must re-reserve and re-initialize from scratch — the generation the
//! object would have lived in may have been relocated out from under it.

use crate::error::{IgcError, Result};
use crate::heap::pool::Pool;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct PendingReservation {
    addr: usize,
    size: usize,
    epoch: u64,
}

/// A thread-local allocation buffer targeting one pool.
pub struct AllocationPoint {
    pool: Arc<Pool>,
    epoch: Arc<AtomicU64>,
    pending: Mutex<Option<PendingReservation>>,
}

impl AllocationPoint {
    pub fn new(pool: Arc<Pool>, epoch: Arc<AtomicU64>) -> Self {
        Self {
            pool,
            epoch,
            pending: Mutex::new(None),
        }
    }

    /// Reserve `size` bytes in this pool's youngest generation. The returned
    /// address is not yet a committed object — the caller must initialize
    /// every slot before calling [`commit`](Self::commit).
    pub fn reserve(&self, size: usize) -> Result<usize> {
        let region = self.pool.youngest();
        let addr = region.try_bump(size).ok_or_else(|| IgcError::OutOfMemory {
            requested: size,
            available: region.capacity().saturating_sub(region.occupied()),
        })?;

        *self.pending.lock() = Some(PendingReservation {
            addr,
            size,
            epoch: self.epoch.load(Ordering::Acquire),
        });
        Ok(addr)
    }

    /// Finalize a reservation made by [`reserve`](Self::reserve). Fails with
    /// [`IgcError::CommitRetry`] if a relocation cycle completed since the
    /// matching `reserve` call.
    pub fn commit(&self, addr: usize) -> Result<()> {
        let mut pending = self.pending.lock();
        match pending.take() {
            Some(p) if p.addr == addr => {
                if self.epoch.load(Ordering::Acquire) != p.epoch {
                    return Err(IgcError::CommitRetry);
                }
                Ok(())
            }
            Some(other) => {
                *pending = Some(other);
                Err(IgcError::InvalidArgument(format!(
                    "commit address {addr:#x} does not match the pending reservation"
                )))
            }
            None => Err(IgcError::InvalidState {
                expected: "a pending reservation".to_string(),
                actual: "none".to_string(),
            }),
        }
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }
}
