//! Configuration Module - Arena and Generation Chain Parameters
//!
//! A flat struct of tunables, a `validate()` pass that rejects out-of-range
//! combinations before the arena is built, and a `Default` impl matching the
//! stated defaults for the generation chain and idle-tick budget.

use crate::util::constants::KB;

/// One generation in the chain.
///
/// `capacity_kb` bounds how much the generation may hold before the next
/// collection promotes survivors out of it; `mortality` is the expected
/// fraction of objects in the generation that do *not* survive a collection
/// (used only to size initial allocation, not as a collector invariant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSpec {
    pub capacity_kb: usize,
    pub mortality: f32,
}

impl GenerationSpec {
    pub fn new(capacity_kb: usize, mortality: f32) -> Self {
        Self { capacity_kb, mortality }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_kb * KB
    }
}

/// Configuration for the arena, its generation chain, and the lifecycle
/// controller's idle-tick budget.
#[derive(Debug, Clone)]
pub struct IgcConfig {
    /// Ordered chain of generations, youngest first. Defaults to a
    /// two-generation chain: (32000 KB, 0.8), (160045 KB, 0.4).
    pub generations: Vec<GenerationSpec>,

    /// Default idle-tick time slice, in milliseconds.
    pub idle_slice_ms: u64,

    /// Whether finalization is enabled at startup.
    pub finalization_enabled: bool,

    /// Enable verbose GC cycle logging via the `log` facade.
    pub verbose: bool,

    /// Number of background GC worker threads used for concurrent
    /// marking/relocation. `None` auto-detects from `num_cpus`.
    pub gc_threads: Option<usize>,
}

impl Default for IgcConfig {
    fn default() -> Self {
        Self {
            generations: vec![
                GenerationSpec::new(32_000, 0.8),
                GenerationSpec::new(160_045, 0.4),
            ],
            idle_slice_ms: 10,
            finalization_enabled: true,
            verbose: false,
            gc_threads: Some((num_cpus::get() / 2).max(1).min(4)),
        }
    }
}

impl IgcConfig {
    /// Validate configuration; called by the lifecycle controller before
    /// building the arena. Invalid configuration is a fatal error detected
    /// at init, never surfaced as a retryable failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generations.is_empty() {
            return Err(ConfigError::EmptyChain);
        }

        for gen in &self.generations {
            if gen.capacity_kb == 0 {
                return Err(ConfigError::InvalidCapacity(gen.capacity_kb));
            }
            if !(0.0..=1.0).contains(&gen.mortality) {
                return Err(ConfigError::InvalidMortality(gen.mortality));
            }
        }

        if self.idle_slice_ms == 0 {
            return Err(ConfigError::InvalidIdleSlice);
        }

        if let Some(threads) = self.gc_threads {
            if threads == 0 {
                return Err(ConfigError::InvalidGcThreads);
            }
        }

        Ok(())
    }

    /// Override defaults with `IGC_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("IGC_IDLE_SLICE_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.idle_slice_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("IGC_GC_THREADS") {
            if let Ok(threads) = val.parse::<usize>() {
                config.gc_threads = Some(threads);
            }
        }

        if let Ok(val) = std::env::var("IGC_VERBOSE") {
            config.verbose = val == "1" || val.eq_ignore_ascii_case("true");
        }

        if let Ok(val) = std::env::var("IGC_FINALIZATION") {
            config.finalization_enabled = !(val == "0" || val.eq_ignore_ascii_case("false"));
        }

        config
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("generation chain must have at least one generation")]
    EmptyChain,

    #[error("generation capacity must be > 0 KB, got {0}")]
    InvalidCapacity(usize),

    #[error("generation mortality must be in [0, 1], got {0}")]
    InvalidMortality(f32),

    #[error("idle_slice_ms must be > 0")]
    InvalidIdleSlice,

    #[error("gc_threads must be > 0 when set")]
    InvalidGcThreads,
}
