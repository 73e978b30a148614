//! Root Registry
//!
//! Every reachable value reachable from outside a managed pool starts at a
//! registered root: a `[start, end)` range of machine words. A root is
//! either *exact* (every word in range is guaranteed to be a tagged value
//! word, so the scanner fixes every word unconditionally) or *ambiguous*
//! (the range may contain non-pointer data interleaved with tagged values,
//! so the scanner only fixes a word when it decodes to something that lives
//! inside a pool). Registered ranges must never overlap — two roots
//! claiming the same word would double-fix it and corrupt the second fix.

use crate::error::{IgcError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// How conservatively a root's range must be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRank {
    /// May contain non-pointer data; only words that decode to a live pool
    /// member are treated as references.
    Ambiguous,
    /// Every word in the range is a tagged value word, shaped the way
    /// `kind` describes.
    Exact(ExactScanKind),
}

/// Which concrete exact scanner an exact root's range needs, matching the
/// shape of the structure it actually holds rather than a flat array of
/// tagged words in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactScanKind {
    /// Every word in range is itself a tagged value word, fixed in place.
    /// What a pdump image or a growable reference stack looks like.
    Flat,
    /// Every word in range is a pointer to one tagged value word elsewhere;
    /// follow the pointer once and fix `*ptr`, skipping null pointers.
    StaticVector,
    /// Fixed-stride glyph records, `stride` words each; only the first word
    /// of every record is a reference, the rest is non-reference glyph
    /// metadata left untouched.
    GlyphRow { stride: usize },
    /// An array of `(ptr, len)` pairs, two words each: a non-null `ptr`
    /// addresses that face's lface vector of `len` reference words; a null
    /// `ptr` means the face has none yet and is skipped.
    FaceCache,
}

/// Opaque handle returned by registration, used to deregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootHandle(u64);

#[derive(Debug, Clone)]
struct RootEntry {
    start: usize,
    end: usize,
    rank: RootRank,
}

/// The set of all currently-registered roots.
pub struct RootRegistry {
    roots: RwLock<BTreeMap<u64, RootEntry>>,
    next_handle: AtomicU64,
}

impl Default for RootRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RootRegistry {
    pub fn new() -> Self {
        Self {
            roots: RwLock::new(BTreeMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Register an ambiguous root `[start, end)`.
    pub fn register_ambiguous(&self, start: usize, end: usize) -> Result<RootHandle> {
        self.register(start, end, RootRank::Ambiguous)
    }

    /// Register an exact root `[start, end)`, scanned the way `kind`
    /// describes.
    pub fn register_exact(
        &self,
        start: usize,
        end: usize,
        kind: ExactScanKind,
    ) -> Result<RootHandle> {
        self.register(start, end, RootRank::Exact(kind))
    }

    fn register(&self, start: usize, end: usize, rank: RootRank) -> Result<RootHandle> {
        if end <= start {
            return Err(IgcError::ZeroSizeRoot { start, end });
        }

        let mut roots = self.roots.write();
        if roots
            .values()
            .any(|r| start < r.end && r.start < end)
        {
            return Err(IgcError::RootOverlap { start, end });
        }

        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        roots.insert(handle, RootEntry { start, end, rank });
        Ok(RootHandle(handle))
    }

    /// Remove a previously registered root.
    pub fn deregister(&self, handle: RootHandle) -> Result<()> {
        let mut roots = self.roots.write();
        roots
            .remove(&handle.0)
            .map(|_| ())
            .ok_or(IgcError::UnknownRootHandle(handle.0))
    }

    /// Find the handle and rank of the root whose range starts at exactly
    /// `start`. Used by callers that replace a root in place (e.g. a stack
    /// that grew and must deregister its old bound before registering a new
    /// one).
    pub fn find_by_start(&self, start: usize) -> Option<(RootHandle, RootRank)> {
        let roots = self.roots.read();
        roots
            .iter()
            .find(|(_, entry)| entry.start == start)
            .map(|(&id, entry)| (RootHandle(id), entry.rank))
    }

    /// Visit every registered root's `(start, end, rank)`, in registration
    /// order. Used by the scan phase of a collection cycle.
    pub fn for_each<F: FnMut(usize, usize, RootRank)>(&self, mut f: F) {
        let roots = self.roots.read();
        for entry in roots.values() {
            f(entry.start, entry.end, entry.rank);
        }
    }

    pub fn len(&self) -> usize {
        self.roots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
