//! Forwarding and Padding Markers
//!
//! When the collector moves an object, it overwrites the old location with a
//! forwarding marker: `{signature, new_address}`. When it needs to fill a
//! hole inside a pool, it writes a padding marker: `{signature}` followed by
//! arbitrary bytes. Both are identified by a one-word signature unique to
//! this process — the address of a private `static`, so it can never
//! coincide with the first word of a real object.

use crate::util::constants::WORD_SIZE;
use std::sync::atomic::{AtomicUsize, Ordering};

lazy_static::lazy_static! {
    /// The process-wide forwarding-marker signature: the address of this
    /// static itself. No object payload can ever equal it because it lives
    /// outside every pool's reserved address range.
    static ref FORWARDING_SIGNATURE: usize = &FORWARDING_SIGNATURE_CELL as *const _ as usize;

    /// The process-wide padding-marker signature, distinct from the
    /// forwarding signature so `is_forwarded` and `is_padding` never agree.
    static ref PADDING_SIGNATURE: usize = &PADDING_SIGNATURE_CELL as *const _ as usize;
}

static FORWARDING_SIGNATURE_CELL: AtomicUsize = AtomicUsize::new(0);
static PADDING_SIGNATURE_CELL: AtomicUsize = AtomicUsize::new(0);

/// Minimum size, in bytes, of a forwarding marker: one signature word plus
/// one address word.
pub const FORWARDING_MARKER_SIZE: usize = 2 * WORD_SIZE;

/// Minimum size, in bytes, of a padding marker: one signature word. Callers
/// must only invoke [`write_padding`] with `size >= PADDING_MARKER_SIZE`.
pub const PADDING_MARKER_SIZE: usize = WORD_SIZE;

/// Overwrite `*old` with a forwarding marker pointing at `new`.
///
/// # Safety
/// `old` must be valid for writes of [`FORWARDING_MARKER_SIZE`] bytes and not
/// presently read by a concurrent scan (the collector only calls this while
/// holding exclusive relocation rights over the source region). Must never
/// be called twice for the same `old` address — the collector guarantees it
/// never relocates an already-forwarded object.
pub unsafe fn write_forwarding(old: usize, new: usize) {
    let ptr = old as *mut usize;
    ptr.write(*FORWARDING_SIGNATURE);
    ptr.add(1).write(new);
}

/// If `*addr` is a forwarding marker, return the address it points to.
///
/// # Safety
/// `addr` must be valid for reads of at least one word.
pub unsafe fn read_forwarding(addr: usize) -> Option<usize> {
    let ptr = addr as *const usize;
    if ptr.read() == *FORWARDING_SIGNATURE {
        Some(ptr.add(1).read())
    } else {
        None
    }
}

/// Fill `[addr, addr + size)` with a padding marker. `size` must be at least
/// [`PADDING_MARKER_SIZE`] and a multiple of the pool alignment.
///
/// # Safety
/// `addr` must be valid for writes of `size` bytes.
pub unsafe fn write_padding(addr: usize, size: usize) {
    debug_assert!(size >= PADDING_MARKER_SIZE);
    let ptr = addr as *mut usize;
    ptr.write(*PADDING_SIGNATURE);
    if size > WORD_SIZE {
        std::ptr::write_bytes((addr + WORD_SIZE) as *mut u8, 0, size - WORD_SIZE);
    }
}

/// Whether `*addr`'s first word is the padding signature.
///
/// # Safety
/// `addr` must be valid for reads of at least one word.
pub unsafe fn is_padding(addr: usize) -> bool {
    (addr as *const usize).read() == *PADDING_SIGNATURE
}
