//! Incremental, generational, concurrent, moving garbage collector core.
//!
//! [`hooks::Gc`] is the embedder-facing handle: build one with
//! [`hooks::Gc::init`], register threads and roots, allocate through
//! [`hooks::Gc::make_cons`] / [`hooks::Gc::alloc_symbol`], and call
//! [`hooks::Gc::on_idle`] periodically to let the collector make progress.

pub mod allocator;
pub mod collector;
pub mod config;
pub mod error;
pub mod finalize;
pub mod heap;
pub mod hooks;
pub mod lifecycle;
pub mod object;
pub mod roots;
pub mod scan;
pub mod stats;
pub mod tagged;
pub mod threads;
pub mod trace;
pub mod util;

pub use collector::{Collector, GcState};
pub use config::{ConfigError, GenerationSpec, IgcConfig};
pub use error::{IgcError, Result};
pub use hooks::Gc;
pub use lifecycle::{InhibitGuard, LifecycleController};
pub use roots::{ExactScanKind, RootHandle, RootRank};
pub use tagged::Tag;
