//! Fix Protocol and Root Scanners
//!
//! [`Fixer::fix_slot`] is the single entry point every scanner (root or
//! object) calls on each candidate reference word: decode the tag, check
//! pool membership, consult the collector, and write back a
//! possibly-relocated word. Root scanning comes in two flavors — ambiguous
//! (conservative, tolerates non-pointer data) and exact. Exact roots are
//! further shaped by an [`ExactScanKind`]: not every exact root is a flat
//! array of reference words, so `scan_exact` dispatches to whichever of the
//! four shapes the caller registered.

use crate::error::Result;
use crate::object::Fixer;
use crate::roots::ExactScanKind;
use crate::util::constants::WORD_SIZE;

/// Scan `[start, end)` conservatively: every word that does not decode to a
/// live pool member is left untouched rather than treated as an error.
pub fn scan_ambiguous(start: usize, end: usize, fixer: &dyn Fixer) -> Result<()> {
    let mut addr = start;
    while addr < end {
        fixer.fix_slot(addr)?;
        addr += WORD_SIZE;
    }
    Ok(())
}

/// Dispatch an exact root scan to the scanner its `kind` names.
pub fn scan_exact(start: usize, end: usize, kind: ExactScanKind, fixer: &dyn Fixer) -> Result<()> {
    match kind {
        ExactScanKind::Flat => scan_flat(start, end, fixer),
        ExactScanKind::StaticVector => scan_static_vector(start, end, fixer),
        ExactScanKind::GlyphRow { stride } => scan_glyph_row(start, end, stride, fixer),
        ExactScanKind::FaceCache => scan_face_cache(start, end, fixer),
    }
}

/// Every word in `[start, end)` is itself a tagged value word: a pdump
/// image or a growable reference stack.
fn scan_flat(start: usize, end: usize, fixer: &dyn Fixer) -> Result<()> {
    // Exact and ambiguous both fix every word the same way; the distinction
    // is about what the caller guarantees regarding content, not how the
    // fix protocol treats an individual word.
    scan_ambiguous(start, end, fixer)
}

/// Every word in `[start, end)` is a pointer to one tagged value word
/// elsewhere; follow the pointer once and fix `*ptr`, skipping null
/// pointers.
fn scan_static_vector(start: usize, end: usize, fixer: &dyn Fixer) -> Result<()> {
    let mut addr = start;
    while addr < end {
        let slot = unsafe { (addr as *const usize).read() };
        if slot != 0 {
            fixer.fix_slot(slot)?;
        }
        addr += WORD_SIZE;
    }
    Ok(())
}

/// Fixed-stride glyph records: the first word of every `stride`-word record
/// is a reference, the rest of the record is non-reference glyph metadata
/// left untouched.
fn scan_glyph_row(start: usize, end: usize, stride: usize, fixer: &dyn Fixer) -> Result<()> {
    debug_assert!(stride > 0, "glyph stride must be at least one word");
    let record_bytes = stride * WORD_SIZE;
    let mut addr = start;
    while addr + record_bytes <= end {
        fixer.fix_slot(addr)?;
        addr += record_bytes;
    }
    Ok(())
}

/// An array of `(ptr, len)` pairs, two words each: a non-null `ptr`
/// addresses that face's lface vector of `len` reference words; a null
/// `ptr` means the face has none yet and is skipped.
fn scan_face_cache(start: usize, end: usize, fixer: &dyn Fixer) -> Result<()> {
    let pair_bytes = 2 * WORD_SIZE;
    let mut addr = start;
    while addr + pair_bytes <= end {
        let ptr = unsafe { (addr as *const usize).read() };
        let len = unsafe { ((addr + WORD_SIZE) as *const usize).read() };
        if ptr != 0 {
            for i in 0..len {
                fixer.fix_slot(ptr + i * WORD_SIZE)?;
            }
        }
        addr += pair_bytes;
    }
    Ok(())
}
