//! A symbol is five value-word slots — `name`, `function`, `plist`,
//! `package`, `value` — plus a redirect discriminant that is not itself a
//! reference. `name`, `function`, `plist`, and `package` are always fixed;
//! `value` is fixed only when the discriminant says the symbol redirects
//! directly to a value rather than, say, a buffer-local cell outside this
//! core's scope.

use crate::error::Result;
use crate::object::format::{Fixer, ObjectFormat};
use crate::object::marker;
use crate::util::constants::WORD_SIZE;

/// Slot offsets, in words, within a symbol object.
const NAME_OFFSET: usize = 0;
const FUNCTION_OFFSET: usize = 1;
const PLIST_OFFSET: usize = 2;
const PACKAGE_OFFSET: usize = 3;
const VALUE_OFFSET: usize = 4;
const REDIRECT_OFFSET: usize = 5;

/// Byte size of one symbol object: five reference slots plus the redirect
/// discriminant word.
pub const SYMBOL_SIZE: usize = 6 * WORD_SIZE;

/// How a symbol's `value` slot is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Redirect {
    /// `value` holds a direct value word; the fix protocol must fix it.
    Direct = 0,
    /// `value` redirects elsewhere (e.g. a buffer-local binding cell); out
    /// of this core's scope, so the fix protocol leaves the slot alone.
    Indirect = 1,
}

impl Redirect {
    fn from_raw(raw: usize) -> Redirect {
        if raw == Redirect::Direct as usize {
            Redirect::Direct
        } else {
            Redirect::Indirect
        }
    }
}

/// Object format for the symbol pool.
pub struct SymbolFormat;

impl ObjectFormat for SymbolFormat {
    fn scan(&self, base: usize, limit: usize, fixer: &dyn Fixer) -> Result<()> {
        let mut addr = base;
        while addr < limit {
            if unsafe { marker::is_padding(addr) } || unsafe { self.is_forwarded(addr) }.is_some()
            {
                addr = self.skip(addr);
                continue;
            }

            fixer.fix_slot(addr + NAME_OFFSET * WORD_SIZE)?;
            fixer.fix_slot(addr + FUNCTION_OFFSET * WORD_SIZE)?;
            fixer.fix_slot(addr + PLIST_OFFSET * WORD_SIZE)?;
            fixer.fix_slot(addr + PACKAGE_OFFSET * WORD_SIZE)?;

            if redirect(addr) == Redirect::Direct {
                fixer.fix_slot(addr + VALUE_OFFSET * WORD_SIZE)?;
            }

            addr = self.skip(addr);
        }
        Ok(())
    }

    fn skip(&self, addr: usize) -> usize {
        addr + SYMBOL_SIZE
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
        SYMBOL_SIZE
    }
}

/// Read the redirect discriminant of a live symbol.
///
/// # Safety
/// `addr` must point at a live symbol object.
pub fn redirect(addr: usize) -> Redirect {
    let raw = unsafe { ((addr + REDIRECT_OFFSET * WORD_SIZE) as *const usize).read() };
    Redirect::from_raw(raw)
}

/// Initialize a freshly reserved symbol object. All four always-fixed slots
/// and `value` must already be valid value words even when `redirect` is
/// `Indirect` — no slot may hold an uninitialized word, regardless of
/// whether the fix protocol will visit it.
///
/// # Safety
/// `addr` must be a freshly reserved, not-yet-committed symbol object.
#[allow(clippy::too_many_arguments)]
pub unsafe fn init(
    addr: usize,
    name: usize,
    function: usize,
    plist: usize,
    package: usize,
    value: usize,
    redirect: Redirect,
) {
    ((addr + NAME_OFFSET * WORD_SIZE) as *mut usize).write(name);
    ((addr + FUNCTION_OFFSET * WORD_SIZE) as *mut usize).write(function);
    ((addr + PLIST_OFFSET * WORD_SIZE) as *mut usize).write(plist);
    ((addr + PACKAGE_OFFSET * WORD_SIZE) as *mut usize).write(package);
    ((addr + VALUE_OFFSET * WORD_SIZE) as *mut usize).write(value);
    ((addr + REDIRECT_OFFSET * WORD_SIZE) as *mut usize).write(redirect as usize);
}
