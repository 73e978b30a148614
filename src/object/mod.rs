//! Per-pool callback tables (scan/skip/forward/is-forwarded/pad) plus the
//! two concrete formats this core ships: cons cells and symbols.

pub mod cons;
pub mod format;
pub mod marker;
pub mod symbol;

pub use format::{Fixer, ObjectFormat};
