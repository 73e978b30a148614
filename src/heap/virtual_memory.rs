//! Virtual Memory - Arena Backing Storage
//!
//! The arena reserves one contiguous region of address space up front and
//! never grows it; generations and pools are fixed-size slices of this
//! region. No partial commit/uncommit or multi-mapping is needed, so
//! reservation and commit happen together via a single anonymous `mmap`.

use crate::error::{IgcError, Result};
use memmap2::{MmapMut, MmapOptions};

/// A single anonymous memory mapping backing the whole arena.
///
/// Held behind a raw base address + length rather than exposing the `MmapMut`
/// slice directly, because pools hand out raw addresses that outlive any
/// particular borrow of the mapping.
pub struct VirtualMemory {
    mmap: MmapMut,
    base: usize,
    size: usize,
}

impl VirtualMemory {
    /// Reserve (and commit) `size` bytes of zeroed, read-writable memory,
    /// rounded up to the system page size.
    pub fn reserve(size: usize) -> Result<Self> {
        let aligned = align_to_page(size);

        let mmap = MmapOptions::new().len(aligned).map_anon().map_err(|e| {
            IgcError::ArenaInitialization(format!("failed to reserve {aligned} bytes: {e}"))
        })?;

        let base = mmap.as_ptr() as usize;

        Ok(Self { mmap, base, size: aligned })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw mutable pointer to the start of the mapping, for pools to slice
    /// into when initializing their generation regions.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }
}

fn align_to_page(size: usize) -> usize {
    let page = page_size::get();
    (size + page - 1) & !(page - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_rounds_up_to_page_size() {
        let vm = VirtualMemory::reserve(1).unwrap();
        assert!(vm.size() >= page_size::get());
        assert_eq!(vm.size() % page_size::get(), 0);
    }

    #[test]
    fn reserve_zero_is_one_page() {
        let vm = VirtualMemory::reserve(0).unwrap();
        assert_eq!(vm.size(), page_size::get());
    }
}
