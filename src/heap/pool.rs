//! Pools - Typed, Moving Object Spaces
//!
//! A pool owns exactly one [`ObjectFormat`] and one region per entry in the
//! generation chain. There is no per-object type tag: which pool an address
//! falls in *is* its type, so the fix protocol's first step is always "which
//! pool (if any) does this payload address belong to".

use crate::heap::region::GenerationRegion;
use crate::object::ObjectFormat;
use std::sync::Arc;

/// Which kind of object a pool holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Cons,
    Symbol,
    /// Reserved for a future weak-reference pool. Nothing constructs a pool
    /// of this kind yet; the fix protocol and pool registry both already
    /// handle it as an ordinary pool kind so adding one later does not
    /// require touching the dispatch sites.
    Weak,
}

/// A typed, moving object space spanning one region per generation.
pub struct Pool {
    kind: PoolKind,
    format: Arc<dyn ObjectFormat>,
    generations: Vec<GenerationRegion>,
}

impl Pool {
    /// Lay out one region per `specs` entry, contiguously starting at
    /// `base`, youngest generation first.
    pub fn new(
        base: usize,
        kind: PoolKind,
        format: Arc<dyn ObjectFormat>,
        specs: &[crate::config::GenerationSpec],
    ) -> Self {
        let mut generations = Vec::with_capacity(specs.len());
        let mut cursor = base;
        for spec in specs {
            let region = GenerationRegion::new(cursor, *spec);
            cursor = region.end();
            generations.push(region);
        }
        Self {
            kind,
            format,
            generations,
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn format(&self) -> &Arc<dyn ObjectFormat> {
        &self.format
    }

    pub fn generations(&self) -> &[GenerationRegion] {
        &self.generations
    }

    /// Total byte span across every generation region this pool owns.
    pub fn total_size(&self) -> usize {
        self.generations.iter().map(|g| g.capacity()).sum()
    }

    /// Whether `addr` falls within any of this pool's generation regions.
    pub fn contains(&self, addr: usize) -> bool {
        self.generations.iter().any(|g| g.contains(addr))
    }

    /// The generation region that `addr` falls within, if any.
    pub fn generation_containing(&self, addr: usize) -> Option<&GenerationRegion> {
        self.generations.iter().find(|g| g.contains(addr))
    }

    /// Index of the generation region that `addr` falls within, if any.
    pub fn generation_index_containing(&self, addr: usize) -> Option<usize> {
        self.generations.iter().position(|g| g.contains(addr))
    }

    /// The generation one step older than `index`, if `index` is not
    /// already the oldest generation.
    pub fn next_generation(&self, index: usize) -> Option<&GenerationRegion> {
        self.generations.get(index + 1)
    }

    /// Whether `index` names the oldest generation in the chain — objects
    /// that reach it are never promoted further.
    pub fn is_oldest(&self, index: usize) -> bool {
        index + 1 == self.generations.len()
    }

    /// The youngest generation, where all new allocations land.
    pub fn youngest(&self) -> &GenerationRegion {
        &self.generations[0]
    }

    /// Count live (non-forwarded, non-padding) objects across every
    /// generation. A read-only diagnostic, not used by the collector itself.
    pub fn walk_objects(&self) -> usize {
        let mut count = 0;
        for generation in &self.generations {
            let mut addr = generation.base();
            let limit = generation.cursor();
            while addr < limit {
                let is_marker = unsafe {
                    crate::object::marker::is_padding(addr)
                        || self.format.is_forwarded(addr).is_some()
                };
                if !is_marker {
                    count += 1;
                }
                addr = self.format.skip(addr);
            }
        }
        count
    }
}
