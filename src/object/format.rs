//! Every pool is associated with exactly one `ObjectFormat`, chosen by
//! object kind (cons vs. symbol) since objects in this core carry no
//! self-describing type field — the pool they live in *is* their type.

use crate::error::Result;
use crate::object::marker;

/// Outcome of applying the fix protocol to a single candidate reference
/// slot during a scan.
pub trait Fixer {
    /// Apply the fix protocol to the reference word stored at `slot_addr`.
    /// Implementations read `*slot_addr`, decide whether it is a managed
    /// reference, possibly relocate the referent, and write back the fixed
    /// word.
    fn fix_slot(&self, slot_addr: usize) -> Result<()>;
}

/// The five callbacks every pool's object format must supply.
pub trait ObjectFormat: Send + Sync {
    /// Walk every object in `[base, limit)`, applying `fixer` to each
    /// reference slot, skipping objects that start with a forwarding or
    /// padding marker.
    ///
    /// Returns `Err` with a retryable error if the scan must be aborted and
    /// restarted because the region it covers changed underneath it.
    fn scan(&self, base: usize, limit: usize, fixer: &dyn Fixer) -> Result<()>;

    /// Address immediately after the object starting at `addr`.
    fn skip(&self, addr: usize) -> usize;

    /// Overwrite the object at `old` with a forwarding marker pointing at
    /// `new`. Must only be called once per `old` address.
    ///
    /// # Safety
    /// `old` must be the start of a live object of this format at least
    /// [`marker::FORWARDING_MARKER_SIZE`] bytes long, not concurrently
    /// scanned.
    unsafe fn forward(&self, old: usize, new: usize);

    /// If `addr` holds a forwarding marker, the address it points to.
    ///
    /// # Safety
    /// `addr` must be valid for reads of at least one word.
    unsafe fn is_forwarded(&self, addr: usize) -> Option<usize>;

    /// Fill the hole `[addr, addr + size)` with a padding marker. `size` must
    /// be at least [`marker::PADDING_MARKER_SIZE`] and a multiple of
    /// [`crate::util::constants::POOL_ALIGNMENT`].
    ///
    /// # Safety
    /// `addr` must be valid for writes of `size` bytes.
    unsafe fn pad(&self, addr: usize, size: usize);

    /// Fixed object size for this format, in bytes. Every format in this
    /// core is fixed-size (cons cells and symbols both are), so `skip`
    /// reduces to `addr + object_size()` whenever the object is not a
    /// marker.
    fn object_size(&self) -> usize;

    /// Scan exactly the one object starting at `addr`, applying `fixer` to
    /// each of its reference slots. Built from [`ObjectFormat::scan`] and
    /// [`ObjectFormat::skip`] so worklist-driven traversal can visit one
    /// object at a time instead of a whole region.
    fn scan_one(&self, addr: usize, fixer: &dyn Fixer) -> Result<()> {
        self.scan(addr, self.skip(addr), fixer)
    }
}
