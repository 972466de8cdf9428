//! Simulated time model.
//!
//! # Design
//!
//! Simulated time is a non-negative, finite quantity of seconds stored as
//! `f64`.  Two newtypes keep the two roles apart:
//!
//! - [`Duration`] — a relative span ("in 6 seconds").
//! - [`Instant`]  — an absolute point on the simulation clock, measured from
//!   [`Instant::EPOCH`].
//!
//! Every constructor validates its input, so a value that exists is always
//! finite and non-negative.  That guarantee is what makes the total order
//! (`f64::total_cmp`) agree with numeric order, and lets both types be
//! `Eq + Ord` and usable as `BTreeMap` keys.
//!
//! Arithmetic that could leave the valid range is checked and returns a
//! [`CoreResult`]; there are no panicking `+`/`-` operators.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{CoreError, CoreResult};

/// Validate a raw seconds value and canonicalise `-0.0` to `0.0`.
fn check(what: &'static str, secs: f64) -> CoreResult<f64> {
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs + 0.0)
    } else {
        Err(CoreError::InvalidMeasure { what, value: secs })
    }
}

/// Finite sum of two validated values, or `Overflow`.
fn sum(a: f64, b: f64) -> CoreResult<f64> {
    let s = a + b;
    if s.is_finite() { Ok(s) } else { Err(CoreError::Overflow) }
}

/// Implements the comparison and hashing traits shared by both time types.
macro_rules! seconds_value {
    ($name:ident) => {
        impl PartialEq for $name {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                self.0.total_cmp(&other.0) == Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            #[inline]
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.to_bits().hash(state);
            }
        }

        impl From<$name> for f64 {
            #[inline]
            fn from(v: $name) -> f64 {
                v.0
            }
        }
    };
}

// ── Duration ─────────────────────────────────────────────────────────────────

/// A non-negative span of simulated time, in seconds.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Duration(f64);

seconds_value!(Duration);

impl Duration {
    pub const ZERO: Duration = Duration(0.0);

    /// Build a duration from seconds.
    ///
    /// Fails with [`CoreError::InvalidMeasure`] if `secs` is negative, NaN,
    /// or infinite.
    pub fn from_secs(secs: f64) -> CoreResult<Duration> {
        check("duration", secs).map(Duration)
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// `self + rhs`, failing if the sum is not finite.
    pub fn checked_add(self, rhs: Duration) -> CoreResult<Duration> {
        sum(self.0, rhs.0).map(Duration)
    }

    /// `self - rhs`, failing if `rhs > self`.
    pub fn checked_sub(self, rhs: Duration) -> CoreResult<Duration> {
        if rhs > self {
            return Err(CoreError::NegativeInterval { from: rhs.0, to: self.0 });
        }
        Ok(Duration(self.0 - rhs.0))
    }
}

impl TryFrom<f64> for Duration {
    type Error = CoreError;
    fn try_from(secs: f64) -> CoreResult<Duration> {
        Duration::from_secs(secs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

// ── Instant ──────────────────────────────────────────────────────────────────

/// An absolute point on the simulation clock, in seconds since [`Instant::EPOCH`].
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Instant(f64);

seconds_value!(Instant);

impl Instant {
    /// Time zero.  Every clock starts here unless configured otherwise.
    pub const EPOCH: Instant = Instant(0.0);

    pub fn from_secs(secs: f64) -> CoreResult<Instant> {
        check("instant", secs).map(Instant)
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// The span from [`Instant::EPOCH`] to `self`.
    #[inline]
    pub fn since_epoch(self) -> Duration {
        Duration(self.0)
    }

    /// The instant `offset` after the epoch.
    #[inline]
    pub fn at_offset(offset: Duration) -> Instant {
        Instant(offset.0)
    }

    /// The instant `delay` after `self`.
    pub fn checked_add(self, delay: Duration) -> CoreResult<Instant> {
        sum(self.0, delay.0).map(Instant)
    }

    /// Time elapsed from `earlier` to `self`.
    ///
    /// Fails with [`CoreError::NegativeInterval`] if `earlier > self`.
    pub fn duration_since(self, earlier: Instant) -> CoreResult<Duration> {
        if earlier > self {
            return Err(CoreError::NegativeInterval { from: earlier.0, to: self.0 });
        }
        Ok(Duration(self.0 - earlier.0))
    }
}

impl TryFrom<f64> for Instant {
    type Error = CoreError;
    fn try_from(secs: f64) -> CoreResult<Instant> {
        Instant::from_secs(secs)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}s", self.0)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Per-run configuration for an event queue.
///
/// Typically loaded from a TOML/JSON file by the application crate and passed
/// to `Queue::with_config`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Initial clock value.  Default: [`Instant::EPOCH`].
    pub start: Instant,

    /// Stop before dispatching anything due after this instant.  The clock is
    /// advanced to `stop_at` when the limit is hit.  `None` = no time limit.
    pub stop_at: Option<Instant>,

    /// Stop after this many dispatches within one `run` call.
    pub max_dispatches: Option<u64>,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start:          Instant::EPOCH,
            stop_at:        None,
            max_dispatches: None,
            seed:           0,
        }
    }
}
