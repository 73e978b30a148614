//! Error Module - igc Error Types
//!
//! Defines all error types used by the collector. Retry signals (fix-retry,
//! commit-retry) are recoverable and never escape the fix protocol or the
//! allocation protocol; every other variant is fatal for the caller.

use std::sync::PoisonError;
use thiserror::Error;

/// Main error type for all igc operations.
#[derive(Debug, Error)]
pub enum IgcError {
    #[error("out of memory: requested {requested} bytes, available {available} bytes")]
    OutOfMemory { requested: usize, available: usize },

    #[error("arena initialization failed: {0}")]
    ArenaInitialization(String),

    #[error("pool initialization failed: {0}")]
    PoolInitialization(String),

    #[error("root registration failed: {0}")]
    RootRegistrationFailed(String),

    #[error("root {start:#x}..{end:#x} overlaps an already-registered root")]
    RootOverlap { start: usize, end: usize },

    #[error("root of zero size [{start:#x}, {end:#x}) is rejected")]
    ZeroSizeRoot { start: usize, end: usize },

    #[error("unknown root handle {0}")]
    UnknownRootHandle(u64),

    #[error("allocation point reservation must be retried")]
    CommitRetry,

    #[error("fix protocol failed for candidate at {0:#x}, scan must retry")]
    FixRetry(usize),

    #[error("invalid pointer address: {address:#x}")]
    InvalidPointer { address: usize },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl IgcError {
    /// Whether this error is one of the two retry signals.
    ///
    /// Retry signals are recovered locally by the scanner or the allocation
    /// protocol; they must never be surfaced to the mutator as a failure.
    pub fn retryable(&self) -> bool {
        matches!(self, IgcError::CommitRetry | IgcError::FixRetry(_))
    }

    /// Whether this error indicates the process should abort. Resource
    /// exhaustion and invariant violations are fatal; this crate does not
    /// call `process::abort` itself, the embedding hook is expected to.
    pub fn is_fatal(&self) -> bool {
        !self.retryable()
    }
}

impl<T> From<PoisonError<T>> for IgcError {
    fn from(err: PoisonError<T>) -> Self {
        IgcError::LockPoisoned(err.to_string())
    }
}

/// Result type alias for igc operations.
pub type Result<T> = std::result::Result<T, IgcError>;

/// Early-return with a formatted internal error.
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::IgcError::Internal(format!($fmt, $($arg)*)))
    };
}

/// Ensure a condition holds, otherwise return the given error.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
