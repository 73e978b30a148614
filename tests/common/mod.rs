//! Shared fixtures for the integration test suite.

use igc::{Gc, GenerationSpec, IgcConfig};

/// Small generation chain so tests hit generation boundaries quickly
/// instead of needing megabytes of allocation to exercise promotion.
pub const TEST_GENERATION_KB: usize = 8;

/// A running collector plus whatever per-thread registration the test
/// already did, with automatic `thread_remove` on drop.
pub struct GcFixture {
    pub gc: Gc,
    registered: bool,
}

impl GcFixture {
    /// Build a fixture with a small two-generation chain and register the
    /// calling thread.
    pub fn with_defaults() -> Self {
        let config = IgcConfig {
            generations: vec![
                GenerationSpec::new(TEST_GENERATION_KB, 0.8),
                GenerationSpec::new(TEST_GENERATION_KB * 4, 0.4),
            ],
            ..Default::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: IgcConfig) -> Self {
        let gc = Gc::init(config).expect("collector initialization should succeed");
        let mut marker = 0usize;
        gc.thread_add(&mut marker as *mut usize as usize)
            .expect("thread registration should succeed");
        Self {
            gc,
            registered: true,
        }
    }

    pub fn cons(&self, car: usize, cdr: usize) -> usize {
        self.gc
            .make_cons(car, cdr)
            .expect("cons allocation should succeed")
    }
}

impl Drop for GcFixture {
    fn drop(&mut self) {
        if self.registered {
            let _ = self.gc.thread_remove();
        }
    }
}

/// A tagged small integer word, for building test cons chains without
/// allocating further objects.
pub fn fixnum(value: usize) -> usize {
    igc::tagged::make(value, igc::Tag::Fixnum0 as usize)
}
