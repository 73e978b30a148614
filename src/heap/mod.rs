//! Heap Management - Virtual Memory, Generation Regions, Pools, Arena
//!
//! The arena reserves one contiguous mapping up front, then hands
//! contiguous sub-ranges to each pool. Both pools share the same generation
//! chain shape (same capacities, same count), laid out back to back: cons
//! first, then symbol.

pub mod pool;
pub mod region;
pub mod virtual_memory;

use crate::config::IgcConfig;
use crate::error::{IgcError, Result};
use crate::object::cons::ConsFormat;
use crate::object::symbol::SymbolFormat;
use pool::{Pool, PoolKind};
use std::sync::Arc;
use virtual_memory::VirtualMemory;

/// Snapshot of arena occupancy, useful for logging and tests. Not consulted
/// by the collector itself.
#[derive(Debug, Clone)]
pub struct ArenaHealth {
    pub cons_live: usize,
    pub symbol_live: usize,
    pub cons_occupied_bytes: usize,
    pub symbol_occupied_bytes: usize,
}

/// Owns the arena's backing memory and its two moving pools.
pub struct Arena {
    // Kept alive for the arena's lifetime; never read directly again once
    // the pools are built, but dropping it would unmap memory the pools
    // still reference.
    _memory: VirtualMemory,
    cons: Arc<Pool>,
    symbol: Arc<Pool>,
}

impl Arena {
    /// Build an arena from a validated configuration, reserving one
    /// contiguous mapping sized to hold both pools' full generation chains.
    pub fn new(config: &IgcConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| IgcError::ArenaInitialization(e.to_string()))?;

        let per_pool_size: usize = config
            .generations
            .iter()
            .map(|g| g.capacity_bytes())
            .sum();
        let total_size = per_pool_size * 2;

        let mut memory = VirtualMemory::reserve(total_size)?;
        let base = memory.as_mut_ptr() as usize;

        let cons = Arc::new(Pool::new(
            base,
            PoolKind::Cons,
            Arc::new(ConsFormat),
            &config.generations,
        ));
        let symbol = Arc::new(Pool::new(
            base + per_pool_size,
            PoolKind::Symbol,
            Arc::new(SymbolFormat),
            &config.generations,
        ));

        Ok(Self {
            _memory: memory,
            cons,
            symbol,
        })
    }

    pub fn cons(&self) -> &Arc<Pool> {
        &self.cons
    }

    pub fn symbol(&self) -> &Arc<Pool> {
        &self.symbol
    }

    pub fn pool(&self, kind: PoolKind) -> Option<&Arc<Pool>> {
        match kind {
            PoolKind::Cons => Some(&self.cons),
            PoolKind::Symbol => Some(&self.symbol),
            PoolKind::Weak => None,
        }
    }

    /// The pool `addr` falls within, if any. This is the fix protocol's
    /// pool-membership check: an address that belongs to neither pool is
    /// not a managed reference and must be left untouched.
    pub fn pool_containing(&self, addr: usize) -> Option<&Arc<Pool>> {
        if self.cons.contains(addr) {
            Some(&self.cons)
        } else if self.symbol.contains(addr) {
            Some(&self.symbol)
        } else {
            None
        }
    }

    /// Read-only diagnostic snapshot of live-object counts and occupancy.
    pub fn health(&self) -> ArenaHealth {
        ArenaHealth {
            cons_live: self.cons.walk_objects(),
            symbol_live: self.symbol.walk_objects(),
            cons_occupied_bytes: self.cons.generations().iter().map(|g| g.occupied()).sum(),
            symbol_occupied_bytes: self
                .symbol
                .generations()
                .iter()
                .map(|g| g.occupied())
                .sum(),
        }
    }

    /// Total live objects across both pools.
    pub fn live_object_count(&self) -> usize {
        self.cons.walk_objects() + self.symbol.walk_objects()
    }
}
