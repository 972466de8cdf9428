//! Error type for time arithmetic, measure validation, and statistics.

use thiserror::Error;

/// Errors raised when constructing or combining [`Duration`][crate::Duration]
/// and [`Instant`][crate::Instant] values, and by the [`stats`][crate::stats]
/// collectors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid {what}: {value} (must be finite and non-negative)")]
    InvalidMeasure { what: &'static str, value: f64 },

    #[error("negative interval: {to}s is earlier than {from}s")]
    NegativeInterval { from: f64, to: f64 },

    #[error("time arithmetic overflowed")]
    Overflow,

    #[error("invalid {what}: {value} (must be finite)")]
    NotFinite { what: &'static str, value: f64 },

    #[error("need at least {needed} observation(s), have {have}")]
    InsufficientData { needed: u64, have: u64 },

    #[error("invalid histogram: {0}")]
    InvalidHistogram(&'static str),
}

/// Shorthand result type for `des-core` operations.
pub type CoreResult<T> = Result<T, CoreError>;
