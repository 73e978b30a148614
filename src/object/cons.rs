//! A cons cell is two value words, `car` and `cdr`, with no header. Fixed
//! size, so `skip` is a plain pointer add.

use crate::error::Result;
use crate::object::format::{Fixer, ObjectFormat};
use crate::object::marker;
use crate::util::constants::WORD_SIZE;

/// Byte size of one cons cell: `car` followed by `cdr`.
pub const CONS_SIZE: usize = 2 * WORD_SIZE;

/// Object format for the cons pool.
pub struct ConsFormat;

impl ObjectFormat for ConsFormat {
    fn scan(&self, base: usize, limit: usize, fixer: &dyn Fixer) -> Result<()> {
        let mut addr = base;
        while addr < limit {
            if unsafe { marker::is_padding(addr) } || unsafe { self.is_forwarded(addr) }.is_some()
            {
                addr = self.skip(addr);
                continue;
            }

            // car
            fixer.fix_slot(addr)?;
            // cdr
            fixer.fix_slot(addr + WORD_SIZE)?;

            addr = self.skip(addr);
        }
        Ok(())
    }

    fn skip(&self, addr: usize) -> usize {
        addr + CONS_SIZE
    }

    unsafe fn forward(&self, old: usize, new: usize) {
        marker::write_forwarding(old, new);
    }

    unsafe fn is_forwarded(&self, addr: usize) -> Option<usize> {
        marker::read_forwarding(addr)
    }

    unsafe fn pad(&self, addr: usize, size: usize) {
        marker::write_padding(addr, size);
    }

    fn object_size(&self) -> usize {
        CONS_SIZE
    }
}

/// Read `car` at a live (non-forwarded, non-padding) cons address.
///
/// # Safety
/// `addr` must point at a live cons cell.
pub unsafe fn car(addr: usize) -> usize {
    (addr as *const usize).read()
}

/// Read `cdr` at a live cons address.
///
/// # Safety
/// `addr` must point at a live cons cell.
pub unsafe fn cdr(addr: usize) -> usize {
    ((addr + WORD_SIZE) as *const usize).read()
}

/// Initialize a freshly reserved cons cell with `(car, cdr)`. Both words
/// must already be valid value words (either immediates or references) —
/// the collector may scan this address before `commit` returns.
///
/// # Safety
/// `addr` must be a freshly reserved, not-yet-committed cons cell.
pub unsafe fn init(addr: usize, car: usize, cdr: usize) {
    (addr as *mut usize).write(car);
    ((addr + WORD_SIZE) as *mut usize).write(cdr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_read_round_trips() {
        let mut buf = [0usize; 2];
        let addr = buf.as_mut_ptr() as usize;
        unsafe {
            init(addr, 11, 22);
            assert_eq!(car(addr), 11);
            assert_eq!(cdr(addr), 22);
        }
    }

    #[test]
    fn skip_advances_by_cons_size() {
        let format = ConsFormat;
        assert_eq!(format.skip(0x1000), 0x1000 + CONS_SIZE);
    }

    #[test]
    fn forwarded_cons_is_detected() {
        let format = ConsFormat;
        let mut buf = [0usize; 2];
        let addr = buf.as_mut_ptr() as usize;
        unsafe {
            format.forward(addr, 0x9999);
            assert_eq!(format.is_forwarded(addr), Some(0x9999));
        }
    }
}
