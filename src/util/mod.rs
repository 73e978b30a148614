//! Util Module - Shared Utilities
//!
//! Small helpers used throughout the collector: alignment arithmetic and
//! common size constants.

pub mod alignment;

pub use alignment::Alignment;

/// Constants shared by the arena, pools, and allocation points.
pub mod constants {
    /// 1 Kilobyte.
    pub const KB: usize = 1024;
    /// 1 Megabyte.
    pub const MB: usize = 1024 * 1024;

    /// Word size on the target. Only 64-bit, non-wide words are supported.
    pub const WORD_SIZE: usize = std::mem::size_of::<usize>();

    /// Number of low-order bits reserved for the value tag.
    pub const TAG_BITS: usize = 3;

    /// Alignment every pool must honor so tagged pointers stay valid across
    /// moves.
    pub const POOL_ALIGNMENT: usize = 1 << TAG_BITS;
}
