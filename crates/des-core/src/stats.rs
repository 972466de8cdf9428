//! Online summary statistics and fixed-width histograms for model output.
//!
//! Both collectors fold observations in as they arrive; the observed values
//! themselves are not kept.
//!
//! | Type                  | Reports                                                  |
//! |-----------------------|----------------------------------------------------------|
//! | [`SummaryStatistics`] | count, minimum, maximum, mean, sample variance / std dev |
//! | [`Histogram`]         | everything above, plus binned frequencies                |

use crate::{CoreError, CoreResult};

// ── SummaryStatistics ─────────────────────────────────────────────────────────

/// Running count, extremes, mean, and sample variance of a stream of values.
///
/// Mean and variance use Welford's update, which stays accurate when the
/// values are large relative to their spread.  Queries that need more
/// observations than have been made fail with
/// [`CoreError::InsufficientData`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryStatistics {
    count: u64,
    min:   f64,
    max:   f64,
    mean:  f64,
    /// Sum of squared deviations from the running mean.
    m2:    f64,
}

impl SummaryStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation in.
    ///
    /// Non-finite values fail with `NotFinite` and leave the statistics as
    /// they were.
    pub fn record(&mut self, value: f64) -> CoreResult<()> {
        if !value.is_finite() {
            return Err(CoreError::NotFinite { what: "observation", value });
        }
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        Ok(())
    }

    /// Number of observations since construction or the last reset.
    #[inline]
    pub fn observations(&self) -> u64 {
        self.count
    }

    pub fn minimum(&self) -> CoreResult<f64> {
        self.require(1)?;
        Ok(self.min)
    }

    pub fn maximum(&self) -> CoreResult<f64> {
        self.require(1)?;
        Ok(self.max)
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> CoreResult<f64> {
        self.require(1)?;
        Ok(self.mean)
    }

    /// Unbiased sample variance (Bessel's correction).  Needs at least two
    /// observations.
    pub fn variance(&self) -> CoreResult<f64> {
        self.require(2)?;
        Ok(self.m2 / (self.count - 1) as f64)
    }

    /// Sample standard deviation.  Needs at least two observations.
    pub fn std_deviation(&self) -> CoreResult<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Forget every observation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn require(&self, needed: u64) -> CoreResult<()> {
        if self.count < needed {
            return Err(CoreError::InsufficientData { needed, have: self.count });
        }
        Ok(())
    }
}

// ── Histogram ─────────────────────────────────────────────────────────────────

/// Frequency counts over equal-width bins, with summary statistics alongside.
///
/// Regular bin `i` (0-based) covers `[min + i * width, min + (i + 1) * width)`.
/// Values below the first bin land in the underflow bin, values at or above
/// the end of the last bin in the overflow bin.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Histogram {
    summary:   SummaryStatistics,
    min:       f64,
    width:     f64,
    /// Index 0 is the underflow bin and the last index the overflow bin.
    frequency: Vec<u64>,
}

impl Histogram {
    /// `bin_count` regular bins of `bin_width` starting at `min_bin_value`.
    ///
    /// # Errors
    /// - `InvalidHistogram` if `bin_count < 2` or `bin_width` is not a
    ///   finite positive number.
    /// - `NotFinite` if `min_bin_value` is not finite.
    pub fn new(min_bin_value: f64, bin_count: usize, bin_width: f64) -> CoreResult<Self> {
        if bin_count < 2 {
            return Err(CoreError::InvalidHistogram("at least two bins are required"));
        }
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(CoreError::InvalidHistogram("bin width must be finite and positive"));
        }
        if !min_bin_value.is_finite() {
            return Err(CoreError::NotFinite { what: "minimum bin value", value: min_bin_value });
        }
        Ok(Self {
            summary:   SummaryStatistics::new(),
            min:       min_bin_value,
            width:     bin_width,
            frequency: vec![0; bin_count + 2],
        })
    }

    /// Fold one observation into the summary and its bin.
    pub fn record(&mut self, value: f64) -> CoreResult<()> {
        self.summary.record(value)?;
        let overflow = self.frequency.len() - 1;
        // Infinite when `value - min` overflows; the comparisons still route
        // those to the outer bins.
        let offset = ((value - self.min) / self.width).floor();
        let bin = if offset < 0.0 {
            0
        } else if offset >= self.bin_count() as f64 {
            overflow
        } else {
            offset as usize + 1
        };
        self.frequency[bin] += 1;
        Ok(())
    }

    /// Statistics over every recorded value, binned or not.
    #[inline]
    pub fn summary(&self) -> &SummaryStatistics {
        &self.summary
    }

    /// Number of regular bins (excluding underflow and overflow).
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.frequency.len() - 2
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.width
    }

    /// Inclusive lower edge of regular bin `i`.
    pub fn bin_start(&self, i: usize) -> f64 {
        self.min + i as f64 * self.width
    }

    /// Counts of the regular bins, in order.
    pub fn bins(&self) -> &[u64] {
        &self.frequency[1..self.frequency.len() - 1]
    }

    pub fn underflow(&self) -> u64 {
        self.frequency[0]
    }

    pub fn overflow(&self) -> u64 {
        self.frequency[self.frequency.len() - 1]
    }

    /// Forget every observation; the bin layout is kept.
    pub fn reset(&mut self) {
        self.summary.reset();
        self.frequency.fill(0);
    }
}
